//! # VeilStream Core
//!
//! Domain types, traits, and error definitions shared by every VeilStream
//! crate. Nothing in here knows about HTTP, chunking or line framing; it
//! defines the vocabulary the other crates implement against.
//!
//! ## Layout
//!
//! - [`tag`]: the fixed markup vocabulary the model is instructed to emit
//! - [`frame`]: side-channel events and wire frames sent to the client
//! - [`source`]: the upstream collaborator that yields model output
//! - [`event`]: domain events published on an injected bus
//! - [`error`]: the error taxonomy

pub mod error;
pub mod event;
pub mod frame;
pub mod source;
pub mod tag;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result, SourceError};
pub use event::{DomainEvent, EventBus};
pub use frame::{DataEvent, WireFrame};
pub use source::{ModelEvent, ModelSource, SourceStream, TurnRequest};
pub use tag::{TagCategory, TagDescriptor, BUILTIN_TAGS};
