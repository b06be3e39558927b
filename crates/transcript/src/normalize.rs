use std::ops::Range;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Letters outside `a-z` that survive normalization when accents are kept.
pub const LOCALE_LETTERS: &[char] = &['á', 'é', 'í', 'ó', 'ú', 'ü', 'ñ'];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type,
)]
pub struct NormalizeOptions {
    pub strip_accents: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            strip_accents: true,
        }
    }
}

impl NormalizeOptions {
    pub fn keep_accents() -> Self {
        Self {
            strip_accents: false,
        }
    }
}

/// A whitespace-delimited word of the source text.
///
/// `normalized` may be empty (punctuation-only fragments such as `—` or `¡`)
/// and may contain inner spaces when the raw token was joined by punctuation
/// (`bien-estar` → `bien estar`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub raw: String,
    pub span: Range<usize>,
    pub normalized: String,
}

impl Token {
    pub fn is_word(&self) -> bool {
        !self.normalized.is_empty()
    }

    /// Comparison words contributed by this token, in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.normalized.split(' ').filter(|w| !w.is_empty())
    }
}

fn is_kept(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || LOCALE_LETTERS.contains(&c)
}

/// Canonicalize `text` into space-separated comparable words.
///
/// Lower-cases, optionally removes diacritics (canonical decomposition, then
/// combining marks dropped), turns every character outside `[a-z0-9]` and
/// [`LOCALE_LETTERS`] into a space, and collapses whitespace.
pub fn normalize(text: &str, options: NormalizeOptions) -> String {
    let lowered = text.to_lowercase();

    let folded: String = if options.strip_accents {
        lowered.nfd().filter(|c| !is_combining_mark(*c)).collect()
    } else {
        lowered.nfc().collect()
    };

    let mapped: String = folded
        .chars()
        .map(|c| if is_kept(c) { c } else { ' ' })
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn tokenize(text: &str, options: NormalizeOptions) -> Vec<String> {
    normalize(text, options)
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `text` on whitespace, keeping each raw fragment with its byte span
/// and normalized form. Punctuation-only fragments are kept.
pub fn tokens(text: &str, options: NormalizeOptions) -> Vec<Token> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push(token_at(text, s..idx, options));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }

    if let Some(s) = start {
        out.push(token_at(text, s..text.len(), options));
    }

    out
}

fn token_at(text: &str, span: Range<usize>, options: NormalizeOptions) -> Token {
    let raw = &text[span.clone()];
    Token {
        raw: raw.to_string(),
        normalized: normalize(raw, options),
        span,
    }
}

/// Per-token identity used when scanning for repeated runs: lower-cased, with
/// everything except `[a-z0-9]` and [`LOCALE_LETTERS`] removed. Accents are
/// kept, so `sí` and `si` are different keys.
pub fn speech_key(token: &str) -> String {
    token.to_lowercase().chars().filter(|c| is_kept(*c)).collect()
}

/// Per-word identity used by the overlap search: lower-case only.
pub fn merge_key(token: &str) -> String {
    token.to_lowercase()
}
