use std::collections::VecDeque;

/// Only the most recent events are kept.
pub const DEBUG_EVENT_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct SpeechDebugEvent {
    /// RFC 3339, millisecond precision.
    pub timestamp: String,
    pub result_index: usize,
    pub final_chunk: String,
    pub interim_chunk: String,
    pub combined_transcript: String,
    pub results_len: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DebugLog {
    events: VecDeque<SpeechDebugEvent>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SpeechDebugEvent) {
        if self.events.len() == DEBUG_EVENT_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn events(&self) -> impl Iterator<Item = &SpeechDebugEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

pub(crate) fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
