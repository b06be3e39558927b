use lectura_transcript::normalize::{NormalizeOptions, tokenize};

/// Sessions shorter than this are flagged as not representative.
pub const MIN_VALID_DURATION_SECS: f64 = 10.0;

/// Words per minute rounded to two decimals; `0` for non-positive durations.
pub fn words_per_minute(word_count: usize, duration_seconds: f64) -> f64 {
    if duration_seconds <= 0.0 {
        return 0.0;
    }
    let wpm = word_count as f64 / (duration_seconds / 60.0);
    (wpm * 100.0).round() / 100.0
}

pub fn is_invalid_short(duration_seconds: f64) -> bool {
    duration_seconds < MIN_VALID_DURATION_SECS
}

/// Normalized word count of a transcript.
pub fn word_count(transcript: &str) -> usize {
    tokenize(transcript, NormalizeOptions::default()).len()
}
