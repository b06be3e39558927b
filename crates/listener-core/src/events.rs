#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type")]
pub enum SessionLifecycleEvent {
    #[serde(rename = "active")]
    Active { session_id: String },
    #[serde(rename = "restarting")]
    Restarting {
        session_id: String,
        attempt: u32,
        delay_ms: u64,
    },
    #[serde(rename = "inactive")]
    Inactive {
        session_id: String,
        error: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type")]
pub enum SessionTranscriptEvent {
    #[serde(rename = "updated")]
    Updated {
        session_id: String,
        final_text: String,
        interim_text: String,
        combined_text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type")]
pub enum SessionErrorEvent {
    /// Permission or device failure. Listening has stopped and will not resume.
    #[serde(rename = "fatal")]
    Fatal {
        session_id: String,
        error: String,
        message: Option<String>,
    },
    /// Reported only; the engine's next end-of-stream drives a restart.
    #[serde(rename = "transient")]
    Transient {
        session_id: String,
        error: String,
        message: Option<String>,
    },
}
