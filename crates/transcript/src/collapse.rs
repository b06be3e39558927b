//! Runaway repeat collapsing.
//!
//! Some recognition backends glitch and emit the same token dozens of times
//! in a row. Nobody reads a word six times in a row, so any run at or above
//! the threshold is cut back to its first few occurrences. Shorter runs
//! ("muy muy") are genuine speech and pass through untouched.

use crate::normalize::speech_key;

pub const DEFAULT_RUNAWAY_THRESHOLD: usize = 6;
pub const DEFAULT_MAX_CONSECUTIVE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CollapseConfig {
    pub runaway_threshold: usize,
    pub max_consecutive: usize,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            runaway_threshold: DEFAULT_RUNAWAY_THRESHOLD,
            max_consecutive: DEFAULT_MAX_CONSECUTIVE,
        }
    }
}

pub fn collapse(text: &str) -> String {
    collapse_with(text, CollapseConfig::default())
}

/// Collapse runaway runs in `text`, preserving each kept token's surface
/// form. Output tokens are joined by single spaces.
///
/// A run is a maximal sequence of tokens sharing the first token's
/// [`speech_key`]; tokens whose key is empty never start a run.
pub fn collapse_with(text: &str, config: CollapseConfig) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return String::new();
    }

    // Keeping at least one token stops the neighbours of a removed run from
    // fusing into a new run on the next pass.
    let keep = config.max_consecutive.max(1);
    let mut output: Vec<&str> = Vec::with_capacity(tokens.len());
    let mut index = 0;

    while index < tokens.len() {
        let key = speech_key(tokens[index]);
        let end = run_end(&tokens, index, &key);
        let run = &tokens[index..end];

        if !key.is_empty() && run.len() >= config.runaway_threshold {
            output.extend(run.iter().take(keep));
        } else {
            output.extend(run);
        }

        index = end;
    }

    output.join(" ")
}

fn run_end(tokens: &[&str], start: usize, key: &str) -> usize {
    if key.is_empty() {
        return start + 1;
    }

    tokens[start + 1..]
        .iter()
        .position(|t| speech_key(t) != key)
        .map_or(tokens.len(), |offset| start + 1 + offset)
}
