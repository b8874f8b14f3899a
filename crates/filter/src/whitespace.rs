//! Final whitespace cleanup: runs of three or more newlines collapse to a
//! blank line, and the whole output is trimmed.

use std::sync::LazyLock;

use regex_lite::Regex;

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline run pattern"));

fn collapse_newlines(text: &str) -> String {
    EXCESS_NEWLINES.replace_all(text, "\n\n").into_owned()
}

pub fn normalize_whitespace(text: &str) -> String {
    collapse_newlines(text.trim())
}

/// Incremental [`normalize_whitespace`].
///
/// Leading whitespace is dropped until the first visible character. Trailing
/// whitespace is held until something visible follows it, which also keeps
/// every newline run inside a single emitted piece.
#[derive(Debug, Default)]
pub(crate) struct WhitespaceStage {
    started: bool,
    pending: String,
}

impl WhitespaceStage {
    pub fn push(&mut self, text: &str) -> String {
        let text = if self.started { text } else { text.trim_start() };
        if text.is_empty() {
            return String::new();
        }
        self.started = true;

        self.pending.push_str(text);
        let visible_end = self.pending.trim_end().len();
        if visible_end == 0 {
            return String::new();
        }
        let tail = self.pending.split_off(visible_end);
        let out = collapse_newlines(&self.pending);
        self.pending = tail;
        out
    }

    /// Trailing whitespace is never emitted.
    pub fn flush(&mut self) -> String {
        self.pending.clear();
        self.started = false;
        String::new()
    }

    pub fn held(&self) -> usize {
        self.pending.len()
    }
}
