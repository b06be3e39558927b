//! Merging consecutive final chunks into the stable transcript.
//!
//! Final chunks are not always a clean continuation of what came before. The
//! engine may replay words already committed, replay them behind a few stray
//! tokens (seen on some mobile backends), or re-emit most of the session.
//! [`merge`] tries, in order: empty guards, whole-string containment, a
//! suffix/prefix word overlap allowing a short skipped head, and a
//! long-replay check. Anything left is appended as new speech.
//!
//! The overlap search is greedy (smallest head skip first, then longest
//! overlap), not a global alignment. That order is part of the observable
//! behaviour and must not change.

use crate::normalize::merge_key;

/// Maximum number of leading incoming words that may be dropped as strays.
pub const MAX_HEAD_SKIP: usize = 3;

/// Both sides need at least this many words before replay detection runs.
pub const REPLAY_MIN_WORDS: usize = 12;
pub const REPLAY_CANDIDATE_COVERAGE: f64 = 0.8;
pub const REPLAY_PREVIOUS_COVERAGE: f64 = 0.6;

pub fn merge(previous: &str, incoming: &str) -> String {
    let previous = previous.trim();
    let incoming = incoming.trim();

    if previous.is_empty() {
        return incoming.to_string();
    }
    if incoming.is_empty() {
        return previous.to_string();
    }
    if previous.ends_with(incoming) {
        return previous.to_string();
    }
    if incoming.ends_with(previous) {
        return incoming.to_string();
    }

    let previous_keys: Vec<String> = previous.split_whitespace().map(merge_key).collect();
    let incoming_words: Vec<&str> = incoming.split_whitespace().collect();
    let incoming_keys: Vec<String> = incoming_words.iter().map(|w| merge_key(w)).collect();

    let head_skip_window = MAX_HEAD_SKIP.min(incoming_words.len().saturating_sub(1));

    for head_skip in 0..=head_skip_window {
        let candidate = &incoming_keys[head_skip..];
        if let Some(overlap) = longest_overlap(&previous_keys, candidate) {
            return append(previous, &incoming_words[head_skip + overlap..]);
        }
    }

    for head_skip in 0..=head_skip_window {
        let candidate = &incoming_keys[head_skip..];
        if let Some(prefix) = replayed_prefix(&previous_keys, candidate) {
            return append(previous, &incoming_words[head_skip + prefix..]);
        }
    }

    format!("{previous} {incoming}")
}

/// Largest `n` such that the last `n` keys of `previous` equal the first `n`
/// keys of `candidate`.
fn longest_overlap(previous: &[String], candidate: &[String]) -> Option<usize> {
    let max = previous.len().min(candidate.len());
    (1..=max)
        .rev()
        .find(|&n| previous[previous.len() - n..] == candidate[..n])
}

/// Length of the shared prefix when `candidate` looks like a replay of the
/// session from its beginning.
fn replayed_prefix(previous: &[String], candidate: &[String]) -> Option<usize> {
    if candidate.len() < REPLAY_MIN_WORDS || previous.len() < REPLAY_MIN_WORDS {
        return None;
    }

    let prefix = previous
        .iter()
        .zip(candidate)
        .take_while(|(a, b)| a == b)
        .count();

    let candidate_coverage = prefix as f64 / candidate.len() as f64;
    let previous_coverage = prefix as f64 / previous.len() as f64;

    (candidate_coverage >= REPLAY_CANDIDATE_COVERAGE
        && previous_coverage >= REPLAY_PREVIOUS_COVERAGE)
        .then_some(prefix)
}

fn append(previous: &str, tail: &[&str]) -> String {
    if tail.is_empty() {
        previous.to_string()
    } else {
        format!("{previous} {}", tail.join(" "))
    }
}
