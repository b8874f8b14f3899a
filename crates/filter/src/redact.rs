//! Fallback redaction of local filesystem paths.
//!
//! Independent of tag-based hiding: even when the model forgets to wrap a
//! path in `<private>`, a line consisting only of an absolute path under
//! `/Users`, `/home`, `/var` or `/tmp` (optionally behind a `Stored locally:`
//! label) is dropped, and so is any backtick-quoted span holding such a path.

use std::sync::LazyLock;

use regex_lite::Regex;

const SENSITIVE_ROOTS: [&str; 4] = ["/Users/", "/home/", "/var/", "/tmp/"];
const STORED_LABEL: &str = "Stored locally:";

static SENSITIVE_PATH_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(?:Users|home|var|tmp)/\S+$").expect("sensitive path line pattern")
});

static SENSITIVE_PATH_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`/(?:Users|home|var|tmp)/[^`]+`").expect("sensitive path span pattern")
});

/// Whether a complete line (without its terminator) must be dropped.
pub fn is_sensitive_line(line: &str) -> bool {
    let line = line.trim_end();
    let target = match line.strip_prefix(STORED_LABEL) {
        Some(rest) => {
            let rest = rest.trim_start();
            if rest.is_empty() {
                return true;
            }
            rest
        }
        None => line,
    };
    SENSITIVE_PATH_LINE.is_match(target)
}

/// Whether an incomplete line could still turn into a sensitive one.
fn could_become_sensitive(partial: &str) -> bool {
    if STORED_LABEL.starts_with(partial) {
        return true;
    }
    match partial.strip_prefix(STORED_LABEL) {
        Some(rest) => could_become_path(rest.trim_start()),
        None => could_become_path(partial),
    }
}

fn could_become_path(partial: &str) -> bool {
    SENSITIVE_ROOTS.iter().any(|root| {
        if root.starts_with(partial) {
            return true;
        }
        partial.strip_prefix(root).is_some_and(|rest| {
            // Trailing whitespace is allowed; whitespace inside the path is not.
            !rest.trim_end().contains(char::is_whitespace)
        })
    })
}

/// Drop sensitive lines, terminators included.
pub fn redact_lines(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !is_sensitive_line(line.trim_end_matches('\n')))
        .collect()
}

/// Remove backtick-quoted sensitive paths.
pub fn redact_spans(text: &str) -> String {
    SENSITIVE_PATH_SPAN.replace_all(text, "").into_owned()
}

/// Incremental [`redact_lines`]. Holds the current line only while it could
/// still become sensitive; everything else passes straight through.
#[derive(Debug, Default)]
pub(crate) struct LineRedactor {
    line: String,
    passthrough: bool,
}

impl LineRedactor {
    pub fn push(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for segment in text.split_inclusive('\n') {
            let complete = segment.ends_with('\n');
            if self.passthrough {
                out.push_str(segment);
                self.passthrough = !complete;
                continue;
            }

            self.line.push_str(segment);
            if complete {
                let line = std::mem::take(&mut self.line);
                if !is_sensitive_line(line.trim_end_matches('\n')) {
                    out.push_str(&line);
                }
            } else if !could_become_sensitive(&self.line) {
                out.push_str(&std::mem::take(&mut self.line));
                self.passthrough = true;
            }
        }
        out
    }

    pub fn flush(&mut self) -> String {
        self.passthrough = false;
        let line = std::mem::take(&mut self.line);
        if is_sensitive_line(&line) {
            String::new()
        } else {
            line
        }
    }

    pub fn held(&self) -> usize {
        self.line.len()
    }
}

/// Incremental [`redact_spans`]. Holds from the last backtick while the text
/// after it could still become a quoted sensitive path.
#[derive(Debug, Default)]
pub(crate) struct SpanRedactor {
    buffer: String,
}

impl SpanRedactor {
    pub fn push(&mut self, text: &str) -> String {
        self.buffer.push_str(text);
        let hold_from = self.hold_from();
        let out = redact_spans(&self.buffer[..hold_from]);
        self.buffer.drain(..hold_from);
        out
    }

    pub fn flush(&mut self) -> String {
        let out = redact_spans(&self.buffer);
        self.buffer.clear();
        out
    }

    pub fn held(&self) -> usize {
        self.buffer.len()
    }

    fn hold_from(&self) -> usize {
        let settled = SENSITIVE_PATH_SPAN
            .find_iter(&self.buffer)
            .last()
            .map_or(0, |m| m.end());
        let tail = &self.buffer[settled..];
        match tail.rfind('`') {
            Some(tick) if could_open_span(&tail[tick + 1..]) => settled + tick,
            _ => self.buffer.len(),
        }
    }
}

fn could_open_span(after_tick: &str) -> bool {
    SENSITIVE_ROOTS
        .iter()
        .any(|root| root.starts_with(after_tick) || after_tick.starts_with(root))
}
