#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("other error: {0}")]
    Other(String),
}
