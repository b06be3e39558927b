use std::fmt;

use lectura_transcript::RecognitionResult;
use ractor::ActorRef;

use crate::actors::SessionMsg;

/// Error kinds reported by the recognition engine.
///
/// Permission and capture failures end the session; every other kind is
/// carried verbatim and treated as recoverable.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EngineErrorKind {
    NotAllowed,
    ServiceNotAllowed,
    AudioCapture,
    Transient(String),
}

impl EngineErrorKind {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Transient(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NotAllowed => "not-allowed",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::AudioCapture => "audio-capture",
            Self::Transient(kind) => kind,
        }
    }
}

impl From<&str> for EngineErrorKind {
    fn from(value: &str) -> Self {
        match value {
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "audio-capture" => Self::AudioCapture,
            other => Self::Transient(other.to_string()),
        }
    }
}

impl From<String> for EngineErrorKind {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<EngineErrorKind> for String {
    fn from(value: EngineErrorKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event delivered by the recognition engine, in arrival order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Result(RecognitionResult),
    Error {
        error: EngineErrorKind,
        #[serde(default)]
        message: Option<String>,
    },
    End,
}

/// Handle through which an engine delivers its events to the owning session.
#[derive(Clone)]
pub struct EngineEventSink {
    session: ActorRef<SessionMsg>,
}

impl EngineEventSink {
    pub(crate) fn new(session: ActorRef<SessionMsg>) -> Self {
        Self { session }
    }

    /// Returns `false` once the session has gone away.
    pub fn send(&self, event: EngineEvent) -> bool {
        self.session.cast(SessionMsg::Engine(event)).is_ok()
    }
}

/// Speech-recognition collaborator driven by a session.
///
/// `start` begins one recognition run that ends with [`EngineEvent::End`].
/// A refused start is not fatal: the session stays listening and the next
/// end-of-stream or error drives the retry.
pub trait RecognitionEngine: Send + 'static {
    fn start(&mut self, language: &str, sink: EngineEventSink) -> Result<(), crate::Error>;

    fn stop(&mut self);
}
