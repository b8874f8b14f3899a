//! VeilStream CLI: the main entry point.
//!
//! Commands:
//! - `filter` : Run text through the stream filter
//! - `decode` : Decode a wire transcript
//! - `audit`  : Check a transcript for leaks and retrieval order
//! - `replay` : Stream one scripted turn as wire lines
//! - `serve`  : Start the HTTP gateway
//! - `config` : Create or inspect the configuration file

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use veilstream_config::{AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "veilstream",
    about = "VeilStream: filtered, multiplexed model output streaming",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter raw model output (file or stdin) and print what a client would see
    Filter {
        /// Input file; reads stdin when omitted or `-`
        file: Option<PathBuf>,

        /// Feed the filter in chunks of this many characters (0 = one chunk)
        #[arg(short, long, default_value_t = 0)]
        chunk_size: usize,
    },

    /// Decode a wire transcript into visible text, tools and parse errors
    Decode {
        /// Transcript file; reads stdin when omitted or `-`
        file: Option<PathBuf>,

        /// Print every decoded event as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run hygiene, citation and retrieval checks on a wire transcript
    Audit {
        /// Transcript file; reads stdin when omitted or `-`
        file: Option<PathBuf>,

        /// Token that must never appear in visible text (repeatable)
        #[arg(long = "deny", value_name = "TOKEN")]
        deny: Vec<String>,
    },

    /// Stream one turn of a JSONL script through the pipeline
    Replay {
        /// JSONL script of model events
        script: PathBuf,

        /// User message for the turn
        #[arg(short, long, default_value = "replay")]
        message: String,

        /// Split scripted text into chunks of this many characters
        #[arg(short, long)]
        chunk_size: Option<usize>,
    },

    /// Start the HTTP gateway backed by a scripted source
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// JSONL script to serve (defaults to `stream.script_path`)
        #[arg(short, long, env = "VEILSTREAM_SCRIPT")]
        script: Option<PathBuf>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // A broken config file must not stop `config init` from fixing it.
    let logging = AppConfig::load().map(|c| c.logging).unwrap_or_default();
    init_tracing(cli.verbose, &logging);

    match cli.command {
        Commands::Filter { file, chunk_size } => {
            commands::filter::run(file.as_deref(), chunk_size).await?
        }
        Commands::Decode { file, json } => commands::decode::run(file.as_deref(), json).await?,
        Commands::Audit { file, deny } => commands::audit::run(file.as_deref(), &deny).await?,
        Commands::Replay {
            script,
            message,
            chunk_size,
        } => commands::replay::run(&script, message, chunk_size).await?,
        Commands::Serve { port, script } => commands::serve::run(port, script).await?,
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(verbose: bool, logging: &LoggingConfig) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
