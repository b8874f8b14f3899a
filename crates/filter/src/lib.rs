//! Content filter for streamed model output.
//!
//! Separates internal reasoning from user-facing text:
//! - removes hidden tags (`<thinking>`, `<private>`, `<debug>`) with their content
//! - renders display tags (`<citation>`, `<summary>`, `<source>`) as markdown
//! - drops local filesystem paths that slipped through untagged
//! - tidies the resulting whitespace
//!
//! [`transform`] works on a complete buffer. [`StreamFilter`] works on
//! arbitrarily split chunks and never emits a span it cannot yet prove safe.

mod lexer;
pub mod markup;
pub mod redact;
pub mod stream;
pub mod transform;
pub mod whitespace;

pub use markup::{render_display, strip_hidden};
pub use redact::is_sensitive_line;
pub use stream::StreamFilter;
pub use transform::{render_tag, transform};
pub use whitespace::normalize_whitespace;
