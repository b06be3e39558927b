/// Running transcript of one recognition session.
///
/// `final_text` only grows within a session (apart from runaway collapsing);
/// `interim_text` is replaced wholesale on every event and never persisted;
/// `combined_text` is derived from the other two.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type,
)]
pub struct TranscriptState {
    pub final_text: String,
    pub interim_text: String,
    pub combined_text: String,
}

impl TranscriptState {
    pub fn is_empty(&self) -> bool {
        self.final_text.is_empty() && self.interim_text.is_empty()
    }
}

/// What one processed result did to the transcript.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct TranscriptUpdate {
    pub final_chunk: String,
    pub interim_chunk: String,
    /// Whether `final_text` changed as a result of this event.
    pub final_changed: bool,
    pub state: TranscriptState,
}
