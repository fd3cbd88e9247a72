use thiserror::Error;

/// Failure raised by a market data source while producing its next datum
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Source read failed: {0}")]
    Read(String),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Source disconnected: {0}")]
    Disconnected(String),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
