use thiserror::Error;

pub type Result<T, E = ConsoleError> = std::result::Result<T, E>;

/// Unified error type covering common failure scenarios across subsystems.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("capture error: {0}")]
    Capture(String),
    #[error("stream error: {0}")]
    Stream(String),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("telemetry error: {0}")]
    Telemetry(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
