#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
