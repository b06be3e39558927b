mod session;

pub use session::*;

pub fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("reading_session", session_id = %session_id)
}
