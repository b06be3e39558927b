#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a reading session is already active")]
    SessionActive,

    #[error("recognition engine failed to start: {0}")]
    EngineStart(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] envy::Error),

    #[error(transparent)]
    Spawn(#[from] ractor::SpawnErr),

    #[error("session actor unavailable: {0}")]
    Actor(String),
}
