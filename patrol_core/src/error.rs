use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum PatrolError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("invalid state: {0}")]
    State(String),
    #[error("rejected command: {0}")]
    Command(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing head actuator")]
    MissingHead,
    #[error("missing body actuator")]
    MissingBody,
    #[error("missing range sensor")]
    MissingRange,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
