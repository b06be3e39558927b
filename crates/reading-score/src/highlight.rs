use lectura_transcript::normalize::{NormalizeOptions, tokenize, tokens};

use crate::align::align_words;

/// One whitespace-delimited fragment of the reference text, classified for
/// display after a finished session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct ComparedToken {
    pub raw: String,
    /// `false` for punctuation-only fragments.
    pub is_word: bool,
    pub missed: bool,
}

pub fn compare_for_highlight(reference: &str, hypothesis: &str) -> Vec<ComparedToken> {
    compare_for_highlight_with(reference, hypothesis, NormalizeOptions::default())
}

/// Classify every raw reference fragment against the hypothesis.
///
/// The reference word sequence aligned here is exactly
/// `tokenize(reference)`, so highlighting agrees with the accuracy score. A
/// fragment that normalizes to several words is missed if any of them is.
pub fn compare_for_highlight_with(
    reference: &str,
    hypothesis: &str,
    options: NormalizeOptions,
) -> Vec<ComparedToken> {
    let raw_tokens = tokens(reference, options);

    let mut reference_words: Vec<&str> = Vec::new();
    let mut word_ranges = Vec::with_capacity(raw_tokens.len());
    for token in &raw_tokens {
        let start = reference_words.len();
        reference_words.extend(token.words());
        word_ranges.push(start..reference_words.len());
    }

    let hypothesis_words = tokenize(hypothesis, options);
    let matched = align_words(&reference_words, &hypothesis_words).match_vector;

    raw_tokens
        .iter()
        .zip(word_ranges)
        .map(|(token, range)| {
            let is_word = !range.is_empty();
            ComparedToken {
                raw: token.raw.clone(),
                is_word,
                missed: is_word && matched[range].iter().any(|m| !m),
            }
        })
        .collect()
}
