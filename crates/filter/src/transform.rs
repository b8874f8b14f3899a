//! The tag transform engine: a pure, total function from a complete text
//! buffer to user-facing text.
//!
//! Passes run in a fixed order, each on the previous pass's output:
//!
//! 1. remove hidden spans (`thinking`, `private`, `debug`), content included
//! 2. render display tags (`citation`, `summary`, `source`) as markdown
//! 3. fallback redaction of sensitive paths (whole lines, then backtick spans)
//! 4. collapse 3+ newlines to 2 and trim
//!
//! Unpaired tags are left as literal text; the caller is expected to hand in
//! text whose tags are complete.

use veilstream_core::tag::{TagCategory, TagDescriptor};

use crate::markup::{render_display, strip_hidden};
use crate::redact::{redact_lines, redact_spans};
use crate::whitespace::normalize_whitespace;

pub fn transform(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = strip_hidden(text);
    let text = render_display(&text);
    let text = redact_lines(&text);
    let text = redact_spans(&text);
    normalize_whitespace(&text)
}

/// Render a single display tag by name. `None` for unknown or hidden names.
pub fn render_tag(name: &str, content: &str, url: Option<&str>) -> Option<String> {
    TagDescriptor::lookup(name)
        .filter(|tag| tag.category == TagCategory::Display)
        .map(|tag| tag.render(content, url))
}
