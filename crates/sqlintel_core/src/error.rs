use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntelError {
    #[error("Metadata fetch failed: {0}")]
    FetchFailed(String),

    #[error("Statement execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Unknown tree node: {0}")]
    NodeNotFound(String),

    #[error("No connection registered for node: {0}")]
    ConnectionNotFound(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),
}
