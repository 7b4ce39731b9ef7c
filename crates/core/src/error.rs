use thiserror::Error;

pub type AdPulseResult<T> = Result<T, AdPulseError>;

#[derive(Error, Debug)]
pub enum AdPulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Unknown campaign: {0}")]
    UnknownCampaign(String),

    #[error("Unknown alert: {0}")]
    UnknownAlert(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
