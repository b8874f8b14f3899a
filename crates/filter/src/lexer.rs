//! Tag lexer for the fixed vocabulary.
//!
//! Every `<` in the text is probed independently, so a token hiding inside
//! another tag's attribute list is still seen. A probe either yields a
//! complete token, reports that the text ends while the construct could
//! still become a token (a *partial* tag start), or rejects it.

use std::sync::LazyLock;

use regex_lite::Regex;
use veilstream_core::tag::{TagCategory, TagDescriptor};

static URL_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)url\s*=\s*["']([^"']*)["']"#).expect("url attribute pattern")
});

/// A complete opening (`<name attrs>`) or closing (`</name>`) tag.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TagToken<'a> {
    pub start: usize,
    pub end: usize,
    pub tag: &'static TagDescriptor,
    pub closing: bool,
    pub attrs: &'a str,
}

impl<'a> TagToken<'a> {
    /// The `url` attribute, if present and non-empty.
    pub fn url(&self) -> Option<&'a str> {
        URL_ATTR
            .captures(self.attrs)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|url| !url.is_empty())
    }
}

/// All tokens of one category, plus where a trailing partial tag starts.
#[derive(Debug, Default)]
pub(crate) struct Lexed<'a> {
    pub tokens: Vec<TagToken<'a>>,
    pub partial: Option<usize>,
}

enum Probe<'a> {
    Token(TagToken<'a>),
    Partial,
    NotATag,
}

pub(crate) fn lex(text: &str, category: TagCategory) -> Lexed<'_> {
    let mut lexed = Lexed::default();
    for (pos, _) in text.match_indices('<') {
        match probe(text, pos, category) {
            Probe::Token(token) => lexed.tokens.push(token),
            Probe::Partial => {
                // A partial start runs to the end of the text; nothing after it can be a token.
                lexed.partial = Some(pos);
                break;
            }
            Probe::NotATag => {}
        }
    }
    lexed
}

fn probe(text: &str, start: usize, category: TagCategory) -> Probe<'_> {
    let mut rest = &text[start + 1..];
    let closing = rest.starts_with('/');
    if closing {
        rest = &rest[1..];
    }

    let name_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    let name = &rest[..name_len];
    let after = &rest[name_len..];

    if after.is_empty() {
        // Text ends inside `<`, `</` or the name itself.
        let could_grow = TagDescriptor::of_category(category).any(|tag| {
            tag.name.len() >= name.len() && tag.name[..name.len()].eq_ignore_ascii_case(name)
        });
        return if could_grow { Probe::Partial } else { Probe::NotATag };
    }

    let Some(tag) = TagDescriptor::lookup(name).filter(|tag| tag.category == category) else {
        return Probe::NotATag;
    };

    let name_end = text.len() - after.len();
    if after.starts_with('>') {
        return Probe::Token(TagToken {
            start,
            end: name_end + 1,
            tag,
            closing,
            attrs: "",
        });
    }

    if closing || !after.starts_with(char::is_whitespace) {
        return Probe::NotATag;
    }

    match after.find('>') {
        Some(gt) => Probe::Token(TagToken {
            start,
            end: name_end + gt + 1,
            tag,
            closing: false,
            attrs: &after[..gt],
        }),
        None => Probe::Partial,
    }
}
