//! Scoring of an oral reading attempt against its reference passage.
//!
//! [`align`] computes the word error rate and a per-word match vector,
//! [`compare_for_highlight`] maps that vector back onto the raw reference
//! text, and [`score_session`] combines both with timing into the result
//! handed to persistence.

pub mod align;
pub mod error;
pub mod highlight;
pub mod metrics;
pub mod session;

pub use align::{AlignmentResult, accuracy, align, align_with, align_words, word_error_rate};
pub use error::Error;
pub use highlight::{ComparedToken, compare_for_highlight, compare_for_highlight_with};
pub use metrics::{MIN_VALID_DURATION_SECS, is_invalid_short, word_count, words_per_minute};
pub use session::{
    ScoredSession, SessionResult, SessionSubmission, SessionTiming, SubmissionIds,
    TRANSCRIPT_SNIPPET_CHARS, score_session, transcript_snippet,
};
