use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("daily API limit has been reached")]
    DailyLimitReached,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("API returned an error: {0}")]
    Api(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }

    pub fn parse<T: Into<String>>(msg: T) -> Self {
        AppError::Parse(msg.into())
    }

    /// True when the failure came from the quota tracker rather than the remote service.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, AppError::DailyLimitReached)
    }
}
