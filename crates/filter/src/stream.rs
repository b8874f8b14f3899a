//! Boundary-safe stream filter.
//!
//! The transport delivers model output in arbitrary chunks that may split a
//! tag anywhere. [`StreamFilter`] runs each engine pass as its own stage;
//! every stage emits only what no later chunk can change and keeps the rest.
//! Concatenating all `push` outputs and the final `flush` gives the same text
//! as [`transform`](crate::transform) on the whole input, as long as every
//! tag in the input is terminated. That holds even when removing a hidden
//! span leaves something tag-like behind, such as `<cit` before a removed
//! `<debug>` span: at `flush` the display stage drops only what the raw input
//! itself left unfinished.
//!
//! Hidden content is never emitted early: a stage that cannot prove a span
//! is closed withholds it, and on `flush` an unterminated hidden span is
//! discarded rather than shown.

use tracing::trace;
use veilstream_core::tag::TagCategory;

use crate::markup::{DisplayTracker, TagStage, Truncation};
use crate::redact::{LineRedactor, SpanRedactor};
use crate::whitespace::WhitespaceStage;

/// One filter per turn. Not shared between streams.
#[derive(Debug)]
pub struct StreamFilter {
    raw_display: DisplayTracker,
    hidden: TagStage,
    display: TagStage,
    lines: LineRedactor,
    spans: SpanRedactor,
    whitespace: WhitespaceStage,
}

impl Default for StreamFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamFilter {
    pub fn new() -> Self {
        Self {
            raw_display: DisplayTracker::default(),
            hidden: TagStage::new(TagCategory::Hidden),
            display: TagStage::new(TagCategory::Display),
            lines: LineRedactor::default(),
            spans: SpanRedactor::default(),
            whitespace: WhitespaceStage::default(),
        }
    }

    /// Feed a raw chunk; returns the text that is now safe to show, possibly empty.
    pub fn push(&mut self, chunk: &str) -> String {
        if chunk.is_empty() {
            return String::new();
        }
        self.raw_display.push(chunk);
        let text = self.hidden.push(chunk);
        let text = self.display.push(&text);
        let text = self.lines.push(&text);
        let text = self.spans.push(&text);
        let out = self.whitespace.push(&text);
        trace!(
            chunk_bytes = chunk.len(),
            emitted_bytes = out.len(),
            held_bytes = self.buffered_len(),
            "filtered chunk"
        );
        out
    }

    /// End of stream: resolve everything still held and reset the filter.
    ///
    /// Unterminated hidden spans and trailing partial tags are dropped;
    /// an unterminated display tag loses its markup but keeps its content.
    /// Tag-like text that only appeared once hidden spans were removed stays literal.
    pub fn flush(&mut self) -> String {
        let raw = self.raw_display.finish();
        // The display buffer reaches the raw end only if the hidden stage holds nothing.
        let reaches_raw_end = self.hidden.held() == 0;
        let mut text = self.hidden.flush(Truncation::ALL);

        text = self.display.push(&text);
        // A partial tag has no '>', so a match against the raw partial is the same text.
        let partial_tag = reaches_raw_end
            && match (raw.partial.as_deref(), self.display.partial_tail()) {
                (Some(raw_partial), Some(held)) => raw_partial.ends_with(held),
                _ => false,
            };
        text.push_str(&self.display.flush(Truncation {
            open_span: raw.open_span,
            partial_tag,
        }));

        text = self.lines.push(&text);
        text.push_str(&self.lines.flush());

        text = self.spans.push(&text);
        text.push_str(&self.spans.flush());

        let out = self.whitespace.push(&text);
        self.whitespace.flush();
        out
    }

    /// Raw bytes currently withheld across all stages.
    pub fn buffered_len(&self) -> usize {
        self.hidden.held()
            + self.display.held()
            + self.lines.held()
            + self.spans.held()
            + self.whitespace.held()
    }

    /// Run a whole chunk sequence through a fresh filter, flush included.
    pub fn filter_all<I, S>(chunks: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        let mut out = String::new();
        for chunk in chunks {
            out.push_str(&filter.push(chunk.as_ref()));
        }
        out.push_str(&filter.flush());
        out
    }
}
