#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected status: {0}")]
    Status(u16),
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Lookup timed out")]
    Timeout,
}
