use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Embedding inference failed: {0}")]
    Inference(String),

    #[error("Index persistence failed: {0}")]
    Persistence(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
