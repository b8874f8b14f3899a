//! Tag passes: hidden-span removal and display-tag rendering.
//!
//! A pass is a single leftmost scan over the tokens of one category. The
//! earliest opening tag is paired with the first following closing tag of
//! the same name; the span is dropped (hidden) or rendered (display) and the
//! scan resumes after it. What happens to an opening tag with no partner
//! depends on the [`PassMode`].
//!
//! Removing a hidden span can leave text that looks like the start of a
//! display tag (`<cit` followed by a removed `<debug>` span). Only the raw
//! input tells whether such a tail was really cut off, so the end-of-stream
//! pass takes a [`Truncation`] that says what the raw input left unfinished.

use veilstream_core::tag::TagCategory;

use crate::lexer::{lex, TagToken};

/// How a pass treats input whose end is not yet known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PassMode {
    /// Input is complete; unpaired opening tags stay as literal text.
    Complete,
    /// More input may follow; stop before anything a later chunk could change.
    Hold,
    /// End of stream. What the raw input left unfinished is dropped; anything
    /// else unpaired is treated as in [`PassMode::Complete`].
    Final(Truncation),
}

/// What the raw input left unfinished when the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Truncation {
    /// The input stopped inside an opened span: hidden spans are dropped to
    /// the end, display spans lose their markup but keep their content.
    pub open_span: bool,
    /// The input stopped inside a tag: the trailing partial start is dropped.
    pub partial_tag: bool,
}

impl Truncation {
    /// Everything unpaired at the end is a cut-off.
    pub const ALL: Self = Self {
        open_span: true,
        partial_tag: true,
    };
}

#[derive(Debug, Default)]
pub(crate) struct PassOutput {
    pub text: String,
    /// Bytes of input fully decided. Only less than the input length in
    /// [`PassMode::Hold`].
    pub consumed: usize,
}

pub(crate) fn run_pass(input: &str, category: TagCategory, mode: PassMode) -> PassOutput {
    let lexed = lex(input, category);
    let tokens = &lexed.tokens;
    let mut text = String::with_capacity(input.len());
    let mut pos = 0;
    let mut i = 0;

    while i < tokens.len() {
        let open = tokens[i];
        if open.closing || open.start < pos {
            i += 1;
            continue;
        }

        let close = tokens[i + 1..]
            .iter()
            .position(|t| t.closing && t.tag.name == open.tag.name && t.start >= open.end)
            .map(|offset| i + 1 + offset);

        text.push_str(&input[pos..open.start]);
        match close {
            Some(j) => {
                let close = tokens[j];
                text.push_str(&render_span(&open, &input[open.end..close.start]));
                pos = close.end;
                i = j + 1;
            }
            None => match mode {
                PassMode::Hold => {
                    return PassOutput {
                        text,
                        consumed: open.start,
                    };
                }
                PassMode::Final(cut) if cut.open_span && open.tag.is_hidden() => {
                    return PassOutput {
                        text,
                        consumed: input.len(),
                    };
                }
                PassMode::Final(cut) if cut.open_span => {
                    // Unterminated display tag: drop the markup, keep the content.
                    pos = open.end;
                    i += 1;
                }
                PassMode::Final(_) | PassMode::Complete => {
                    // Literal. Rescan from here so a tag inside its attributes still counts.
                    pos = open.start;
                    i += 1;
                }
            },
        }
    }

    let tail_end = match (mode, lexed.partial) {
        (PassMode::Hold, Some(partial)) if partial >= pos => partial,
        (PassMode::Final(cut), Some(partial)) if cut.partial_tag && partial >= pos => partial,
        _ => input.len(),
    };
    text.push_str(&input[pos..tail_end]);

    let consumed = if mode == PassMode::Hold {
        tail_end
    } else {
        input.len()
    };
    PassOutput { text, consumed }
}

fn render_span(open: &TagToken<'_>, inner: &str) -> String {
    if open.tag.is_hidden() {
        return String::new();
    }
    let content = run_pass(inner, TagCategory::Display, PassMode::Complete).text;
    open.tag.render(&content, open.url())
}

/// Remove every complete hidden span, content included.
pub fn strip_hidden(text: &str) -> String {
    run_pass(text, TagCategory::Hidden, PassMode::Complete).text
}

/// Replace every complete display span with its markdown rendering.
pub fn render_display(text: &str) -> String {
    run_pass(text, TagCategory::Display, PassMode::Complete).text
}

/// Incremental form of one tag pass. Owns the unresolved tail.
#[derive(Debug)]
pub(crate) struct TagStage {
    category: TagCategory,
    buffer: String,
}

impl TagStage {
    pub fn new(category: TagCategory) -> Self {
        Self {
            category,
            buffer: String::new(),
        }
    }

    pub fn push(&mut self, chunk: &str) -> String {
        if chunk.is_empty() && self.buffer.is_empty() {
            return String::new();
        }
        self.buffer.push_str(chunk);
        let out = run_pass(&self.buffer, self.category, PassMode::Hold);
        self.buffer.drain(..out.consumed);
        out.text
    }

    pub fn flush(&mut self, cut: Truncation) -> String {
        let out = run_pass(&self.buffer, self.category, PassMode::Final(cut));
        self.buffer.clear();
        out.text
    }

    /// The held partial tag start at the end of the buffer, if any.
    pub fn partial_tail(&self) -> Option<&str> {
        lex(&self.buffer, self.category)
            .partial
            .map(|start| &self.buffer[start..])
    }

    pub fn held(&self) -> usize {
        self.buffer.len()
    }
}

/// How the raw input ended with respect to display markup.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RawEnding {
    /// An opening display tag in the raw input never got its closing tag.
    pub open_span: bool,
    /// The raw input ends in this partial display tag start.
    pub partial: Option<String>,
}

/// Follows the raw input with display pairing alone, so the end-of-stream
/// display pass can tell a real cut-off from text exposed by hidden removal.
#[derive(Debug, Default)]
pub(crate) struct DisplayTracker {
    unresolved: String,
}

impl DisplayTracker {
    pub fn push(&mut self, chunk: &str) {
        self.unresolved.push_str(chunk);
        let resolved = run_pass(&self.unresolved, TagCategory::Display, PassMode::Hold).consumed;
        self.unresolved.drain(..resolved);
    }

    /// Report how the raw input ended and reset.
    pub fn finish(&mut self) -> RawEnding {
        let rest = std::mem::take(&mut self.unresolved);
        let lexed = lex(&rest, TagCategory::Display);
        RawEnding {
            open_span: lexed
                .tokens
                .first()
                .is_some_and(|token| token.start == 0 && !token.closing),
            partial: lexed.partial.map(|start| rest[start..].to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hidden_spans_with_content() {
        assert_eq!(
            strip_hidden("a<thinking>plan\nmore</thinking>b<private>/Users/x</private>c<debug>d</debug>"),
            "abc"
        );
    }

    #[test]
    fn strip_is_case_insensitive_and_accepts_attributes() {
        assert_eq!(strip_hidden("a<THINKING step=\"1\">x</thinking>b"), "ab");
    }

    #[test]
    fn nested_same_name_pairs_with_first_close() {
        assert_eq!(
            strip_hidden("<thinking>a<thinking>b</thinking>c</thinking>d"),
            "c</thinking>d"
        );
    }

    #[test]
    fn unterminated_hidden_is_literal_when_complete() {
        assert_eq!(strip_hidden("a<debug>b"), "a<debug>b");
    }

    #[test]
    fn hidden_inside_attribute_noise_is_still_removed() {
        assert_eq!(
            strip_hidden("x<private <thinking>secret</thinking>y"),
            "x<private y"
        );
    }

    #[test]
    fn renders_display_tags() {
        assert_eq!(
            render_display(r#"See <citation url="/paper/1">Vaswani</citation> and <citation>Bahdanau</citation>."#),
            "See [Vaswani](/paper/1) and *Bahdanau*."
        );
    }

    #[test]
    fn renders_nested_display_content() {
        assert_eq!(
            render_display(r#"<summary>Key: <citation url="/paper/2">BERT</citation></summary>"#),
            "\n\n> Key: [BERT](/paper/2)\n\n"
        );
    }

    #[test]
    fn hold_mode_stops_at_unterminated_open() {
        let out = run_pass("ab<thinking>c", TagCategory::Hidden, PassMode::Hold);
        assert_eq!(out.text, "ab");
        assert_eq!(out.consumed, 2);
    }

    #[test]
    fn hold_mode_stops_at_partial_start() {
        let out = run_pass("ab<cit", TagCategory::Display, PassMode::Hold);
        assert_eq!(out.text, "ab");
        assert_eq!(out.consumed, 2);

        let out = run_pass("ab<cit", TagCategory::Hidden, PassMode::Hold);
        assert_eq!(out.text, "ab<cit");
        assert_eq!(out.consumed, 6);
    }

    #[test]
    fn final_mode_drops_unterminated_hidden_to_end() {
        let out = run_pass(
            "ok<private>/home/me/key.pem",
            TagCategory::Hidden,
            PassMode::Final(Truncation::ALL),
        );
        assert_eq!(out.text, "ok");
    }

    #[test]
    fn final_mode_drops_display_markup_but_keeps_content() {
        let out = run_pass(
            r#"<citation url="/paper/3">GPT-3 and <source>arXiv</source>"#,
            TagCategory::Display,
            PassMode::Final(Truncation::ALL),
        );
        assert_eq!(out.text, "GPT-3 and \n📄 **Source**: arXiv\n");
    }

    #[test]
    fn final_mode_keeps_what_was_not_cut_off() {
        let out = run_pass(
            "See <citation>x and <cit",
            TagCategory::Display,
            PassMode::Final(Truncation::default()),
        );
        assert_eq!(out.text, "See <citation>x and <cit");

        let out = run_pass(
            "See <citation>x and <cit",
            TagCategory::Display,
            PassMode::Final(Truncation {
                open_span: false,
                partial_tag: true,
            }),
        );
        assert_eq!(out.text, "See <citation>x and ");
    }

    #[test]
    fn tracker_reports_raw_cut_offs() {
        let mut tracker = DisplayTracker::default();
        tracker.push("a <citation>b</citation> <cit");
        assert_eq!(
            tracker.finish(),
            RawEnding {
                open_span: false,
                partial: Some("<cit".to_string()),
            }
        );

        tracker.push("x <summary>y <sou");
        assert_eq!(
            tracker.finish(),
            RawEnding {
                open_span: true,
                partial: Some("<sou".to_string()),
            }
        );

        tracker.push("<cit<debug>z</debug>");
        assert_eq!(tracker.finish(), RawEnding::default());
    }

    #[test]
    fn stage_resolves_span_across_pushes() {
        let mut stage = TagStage::new(TagCategory::Hidden);
        assert_eq!(stage.push("one <thin"), "one ");
        assert_eq!(stage.push("king>sec"), "");
        assert_eq!(stage.push("ret</thinking> two"), " two");
        assert_eq!(stage.held(), 0);
        assert_eq!(stage.flush(Truncation::ALL), "");
    }

    #[test]
    fn stage_flush_drops_truncated_hidden() {
        let mut stage = TagStage::new(TagCategory::Hidden);
        assert_eq!(stage.push("visible<debug>stack trace"), "visible");
        assert!(stage.held() > 0);
        assert_eq!(stage.flush(Truncation::ALL), "");
        assert_eq!(stage.held(), 0);
    }
}
