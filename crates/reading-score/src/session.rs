use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::align::align;
use crate::error::Error;
use crate::highlight::{ComparedToken, compare_for_highlight};
use crate::metrics::{is_invalid_short, word_count, words_per_minute};

/// Characters of the transcript kept for storage. Scoring always uses the
/// full transcript.
pub const TRANSCRIPT_SNIPPET_CHARS: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SessionTiming {
    pub fn new(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            ended_at,
        }
    }

    /// Whole elapsed seconds, never less than one.
    pub fn duration_seconds(&self) -> u64 {
        let elapsed = (self.ended_at - self.started_at).num_seconds();
        elapsed.max(1) as u64
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct SessionResult {
    pub wpm: f64,
    pub accuracy_percent: f64,
    pub duration_seconds: u64,
    pub word_count: usize,
    pub invalid_short: bool,
}

/// Everything produced when a reading session stops.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct ScoredSession {
    pub result: SessionResult,
    pub compared_tokens: Vec<ComparedToken>,
    pub transcript_snippet: String,
}

pub fn score_session(reference: &str, transcript: &str, timing: &SessionTiming) -> ScoredSession {
    let duration_seconds = timing.duration_seconds();
    let words = word_count(transcript);
    let accuracy = align(reference, transcript).accuracy();

    ScoredSession {
        result: SessionResult {
            wpm: words_per_minute(words, duration_seconds as f64),
            accuracy_percent: accuracy * 100.0,
            duration_seconds,
            word_count: words,
            invalid_short: is_invalid_short(duration_seconds as f64),
        },
        compared_tokens: compare_for_highlight(reference, transcript),
        transcript_snippet: transcript_snippet(transcript),
    }
}

pub fn transcript_snippet(transcript: &str) -> String {
    transcript.chars().take(TRANSCRIPT_SNIPPET_CHARS).collect()
}

fn iso_millis(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Payload handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionSubmission {
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub text_id: Uuid,
    pub started_at: String,
    pub ended_at: String,
    pub duration_seconds: u64,
    pub word_count_read: usize,
    pub wpm: f64,
    pub accuracy: f64,
    pub invalid_short: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_snippet: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionIds {
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub text_id: Uuid,
}

impl SessionSubmission {
    pub fn new(ids: SubmissionIds, timing: &SessionTiming, scored: &ScoredSession) -> Self {
        let snippet = (!scored.transcript_snippet.is_empty())
            .then(|| scored.transcript_snippet.clone());

        Self {
            class_id: ids.class_id,
            student_id: ids.student_id,
            text_id: ids.text_id,
            started_at: iso_millis(timing.started_at),
            ended_at: iso_millis(timing.ended_at),
            duration_seconds: scored.result.duration_seconds,
            word_count_read: scored.result.word_count,
            wpm: scored.result.wpm,
            accuracy: scored.result.accuracy_percent,
            invalid_short: scored.result.invalid_short,
            transcript_snippet: snippet,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |reason: &str| -> Result<(), Error> {
            Err(Error::InvalidSubmission(reason.to_string()))
        };

        for (field, value) in [("started_at", &self.started_at), ("ended_at", &self.ended_at)] {
            if DateTime::parse_from_rfc3339(value).is_err() {
                return invalid(&format!("{field} is not an RFC 3339 timestamp"));
            }
        }
        if self.duration_seconds == 0 {
            return invalid("duration_seconds must be positive");
        }
        if !self.wpm.is_finite() || self.wpm < 0.0 {
            return invalid("wpm must be a non-negative number");
        }
        if !(0.0..=100.0).contains(&self.accuracy) {
            return invalid("accuracy must be within 0..=100");
        }
        if let Some(snippet) = &self.transcript_snippet
            && snippet.chars().count() > TRANSCRIPT_SNIPPET_CHARS
        {
            return invalid("transcript_snippet is too long");
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, Error> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn timing(secs: i64, millis: i64) -> SessionTiming {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        SessionTiming::new(
            start,
            start + Duration::seconds(secs) + Duration::milliseconds(millis),
        )
    }

    fn ids() -> SubmissionIds {
        SubmissionIds {
            class_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            text_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn duration_is_floored_with_a_one_second_minimum() {
        assert_eq!(timing(59, 900).duration_seconds(), 59);
        assert_eq!(timing(0, 300).duration_seconds(), 1);
        assert_eq!(timing(-5, 0).duration_seconds(), 1);
    }

    #[test]
    fn scores_a_full_session() {
        let reference = "El sol brilla sobre el mar.";
        let transcript = "el sol brilla sobre mar";
        let scored = score_session(reference, transcript, &timing(30, 0));

        assert_eq!(scored.result.word_count, 5);
        assert_eq!(scored.result.duration_seconds, 30);
        assert_eq!(scored.result.wpm, 10.0);
        assert_relative_eq!(scored.result.accuracy_percent, (1.0 - 1.0 / 6.0) * 100.0);
        assert!(!scored.result.invalid_short);
        assert_eq!(
            scored
                .compared_tokens
                .iter()
                .filter(|t| t.missed)
                .map(|t| t.raw.as_str())
                .collect::<Vec<_>>(),
            ["el"]
        );
    }

    #[test]
    fn short_session_is_flagged() {
        let scored = score_session("hola", "hola", &timing(4, 0));
        assert!(scored.result.invalid_short);
        assert_eq!(scored.result.wpm, 15.0);
    }

    #[test]
    fn snippet_is_capped_by_characters() {
        let transcript = "ñandú ".repeat(100);
        let snippet = transcript_snippet(&transcript);
        assert_eq!(snippet.chars().count(), TRANSCRIPT_SNIPPET_CHARS);

        let scored = score_session("x", &transcript, &timing(60, 0));
        assert_eq!(scored.transcript_snippet, snippet);
        assert_eq!(scored.result.word_count, 100);
    }

    #[test]
    fn submission_round_trips_scored_values() {
        let t = timing(42, 250);
        let scored = score_session("uno dos tres", "uno dos tres", &t);
        let submission = SessionSubmission::new(ids(), &t, &scored);

        assert_eq!(submission.started_at, "2025-03-10T09:00:00.000Z");
        assert_eq!(submission.ended_at, "2025-03-10T09:00:42.250Z");
        assert_eq!(submission.duration_seconds, 42);
        assert_eq!(submission.accuracy, 100.0);
        assert_eq!(submission.transcript_snippet.as_deref(), Some("uno dos tres"));
        assert!(submission.validate().is_ok());

        let json: serde_json::Value =
            serde_json::from_str(&submission.to_json().unwrap()).unwrap();
        assert_eq!(json["word_count_read"], 3);
        assert_eq!(json["invalid_short"], false);
    }

    #[test]
    fn empty_transcript_has_no_snippet() {
        let t = timing(20, 0);
        let scored = score_session("uno", "", &t);
        let submission = SessionSubmission::new(ids(), &t, &scored);

        assert_eq!(submission.transcript_snippet, None);
        assert_eq!(submission.accuracy, 0.0);
        assert!(!submission.to_json().unwrap().contains("transcript_snippet"));
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let t = timing(20, 0);
        let scored = score_session("uno", "uno", &t);
        let base = SessionSubmission::new(ids(), &t, &scored);

        let mut s = base.clone();
        s.accuracy = 100.5;
        assert!(matches!(s.validate(), Err(Error::InvalidSubmission(_))));

        let mut s = base.clone();
        s.duration_seconds = 0;
        assert!(s.validate().is_err());

        let mut s = base.clone();
        s.wpm = -1.0;
        assert!(s.validate().is_err());

        let mut s = base.clone();
        s.started_at = "yesterday".into();
        assert!(s.validate().is_err());

        let mut s = base;
        s.transcript_snippet = Some("a".repeat(TRANSCRIPT_SNIPPET_CHARS + 1));
        assert!(s.to_json().is_err());
    }
}
