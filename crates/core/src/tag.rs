//! The fixed markup vocabulary the model is instructed to emit.
//!
//! Two categories exist:
//! - **Hidden** tags (`thinking`, `private`, `debug`) are removed together
//!   with their content and must never reach the client.
//! - **Display** tags (`citation`, `summary`, `source`) keep their content
//!   but are re-rendered as plain markdown.
//!
//! The set is built in and not extensible at runtime.

use serde::{Deserialize, Serialize};

/// How a tag is treated by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    /// Stripped entirely, content included.
    Hidden,
    /// Replaced by a markdown rendering of its content.
    Display,
}

/// Renders a tag's (already filtered) content and optional `url` attribute.
pub type RenderFn = fn(content: &str, url: Option<&str>) -> String;

/// A built-in tag: its name, category and renderer.
#[derive(Debug, Clone, Copy)]
pub struct TagDescriptor {
    pub name: &'static str,
    pub category: TagCategory,
    render: RenderFn,
}

/// Every tag the filter knows about.
pub static BUILTIN_TAGS: [TagDescriptor; 6] = [
    TagDescriptor::hidden("thinking"),
    TagDescriptor::hidden("private"),
    TagDescriptor::hidden("debug"),
    TagDescriptor::display("citation", render_citation),
    TagDescriptor::display("summary", render_summary),
    TagDescriptor::display("source", render_source),
];

impl TagDescriptor {
    const fn hidden(name: &'static str) -> Self {
        Self {
            name,
            category: TagCategory::Hidden,
            render: render_nothing,
        }
    }

    const fn display(name: &'static str, render: RenderFn) -> Self {
        Self {
            name,
            category: TagCategory::Display,
            render,
        }
    }

    /// Find a built-in tag by name, ignoring ASCII case.
    pub fn lookup(name: &str) -> Option<&'static TagDescriptor> {
        BUILTIN_TAGS
            .iter()
            .find(|tag| tag.name.eq_ignore_ascii_case(name))
    }

    /// All built-in tags of one category.
    pub fn of_category(category: TagCategory) -> impl Iterator<Item = &'static TagDescriptor> {
        BUILTIN_TAGS.iter().filter(move |tag| tag.category == category)
    }

    pub fn is_hidden(&self) -> bool {
        self.category == TagCategory::Hidden
    }

    /// Render a complete span of this tag. Hidden tags render to nothing.
    pub fn render(&self, content: &str, url: Option<&str>) -> String {
        (self.render)(content, url)
    }
}

fn render_nothing(_content: &str, _url: Option<&str>) -> String {
    String::new()
}

/// `[content](url)` when a url is given, `*content*` otherwise.
fn render_citation(content: &str, url: Option<&str>) -> String {
    let content = content.trim();
    match url {
        Some(url) => format!("[{content}]({url})"),
        None => format!("*{content}*"),
    }
}

/// Blockquote every non-empty line, surrounded by blank lines.
fn render_summary(content: &str, _url: Option<&str>) -> String {
    let quoted = content
        .trim()
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\n{quoted}\n\n")
}

fn render_source(content: &str, url: Option<&str>) -> String {
    let content = content.trim();
    match url {
        Some(url) => format!("\n📄 **Source**: [{content}]({url})\n"),
        None => format!("\n📄 **Source**: {content}\n"),
    }
}
