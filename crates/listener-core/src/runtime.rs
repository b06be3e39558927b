use crate::events::*;

/// Upward sink for everything a reading session reports while it runs.
pub trait ListenerRuntime: Send + Sync + 'static {
    fn emit_lifecycle(&self, event: SessionLifecycleEvent);
    fn emit_transcript(&self, event: SessionTranscriptEvent);
    fn emit_error(&self, event: SessionErrorEvent);
}
