use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl MarketError {
    /// Only remote-source failures are worth retrying; everything else
    /// stays failed until the input or the window changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MarketError::ExternalService(_))
    }
}
