//! Rewrites model formatting tokens into readable text.
//!
//! Rules run in a fixed order; punctuation must be substituted before whitespace is
//! collapsed, and whitespace must be collapsed before it is stripped ahead of
//! punctuation.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::Vocabulary;

/// Sentencepiece word-boundary marker.
pub const WORD_BOUNDARY: char = '\u{2581}';

static SECTION_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Z][A-Z0-9_ ]*)\]").expect("valid section header regex"));
static STRUCTURAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(?:s|/s|pad|eps)>").expect("valid structural token regex"));
static HYPHEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\{\s*(?:hyphen|dash)\s*\}\s*").expect("valid hyphen token regex")
});
static FORMAT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\s*([A-Za-z][A-Za-z _]*?)\s*\}").expect("valid formatting token regex")
});
static BRACE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}]*\}").expect("valid brace token regex"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\n\s*").expect("valid line break regex"));
static HORIZONTAL_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]+").expect("valid horizontal space regex"));
static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([.,:;?!])").expect("valid punctuation spacing regex"));
static LEADING_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A\s*\{\s*([A-Za-z][A-Za-z _]*?)\s*\}").expect("valid leading token regex")
});

/// Punctuation or layout for a formatting token name such as `period` or `question mark`.
fn format_token(name: &str) -> Option<&'static str> {
    let name = name.to_ascii_lowercase().replace('_', " ");
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    let replacement = match name.as_str() {
        "period" | "full stop" => ".",
        "comma" => ",",
        "colon" => ":",
        "semicolon" | "semi colon" => ";",
        "question mark" => "?",
        "exclamation point" | "exclamation mark" => "!",
        "new paragraph" | "paragraph" | "paragraph break" => "\n\n",
        _ => return None,
    };
    Some(replacement)
}

/// Drop punctuation tokens that open the transcript; they have nothing to attach to.
fn strip_leading_punctuation_tokens(mut text: &str) -> &str {
    while let Some(caps) = LEADING_TOKEN_RE.captures(text) {
        match format_token(&caps[1]) {
            Some(replacement) if !replacement.trim().is_empty() => {
                text = &text[caps[0].len()..];
            }
            _ => break,
        }
    }
    text
}

fn title_case(header: &str) -> String {
    header
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Transcript post-processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextNormalizer {
    preserve_paragraphs: bool,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep paragraph tokens as blank lines instead of collapsing them into a space.
    pub fn preserving_paragraphs(mut self, preserve: bool) -> Self {
        self.preserve_paragraphs = preserve;
        self
    }

    /// Concatenate the pieces of `tokens` and normalize the result.
    pub fn transcript(&self, tokens: &[usize], vocabulary: &Vocabulary) -> String {
        self.normalize(&vocabulary.concat(tokens))
    }

    pub fn normalize(&self, raw: &str) -> String {
        let text = raw.replace(WORD_BOUNDARY, " ");

        let text =
            SECTION_HEADER_RE.replace_all(&text, |caps: &Captures<'_>| title_case(&caps[1]));
        let text = STRUCTURAL_RE.replace_all(&text, "");
        let text = strip_leading_punctuation_tokens(&text);

        let text = HYPHEN_RE.replace_all(text, "-");
        let text = FORMAT_TOKEN_RE.replace_all(&text, |caps: &Captures<'_>| {
            format_token(&caps[1]).map_or_else(|| caps[0].to_string(), str::to_string)
        });

        let unknown = BRACE_TOKEN_RE.find_iter(&text).count();
        if unknown > 0 {
            tracing::warn!(unknown, "dropped unrecognized formatting tokens");
        }
        let text = BRACE_TOKEN_RE.replace_all(&text, "");

        let text = if self.preserve_paragraphs {
            let text = LINE_BREAK_RE.replace_all(&text, "\n\n");
            Cow::Owned(HORIZONTAL_SPACE_RE.replace_all(&text, " ").into_owned())
        } else {
            WHITESPACE_RE.replace_all(&text, " ")
        };
        let text = text.trim();

        SPACE_BEFORE_PUNCT_RE.replace_all(text, "$1").into_owned()
    }
}

/// Normalize with the default rules.
pub fn normalize(raw: &str) -> String {
    TextNormalizer::default().normalize(raw)
}
