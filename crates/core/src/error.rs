use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Computation failed: {0}")]
    ComputationFailed(String),
}

impl From<serde_json::Error> for DirectorError {
    fn from(e: serde_json::Error) -> Self {
        DirectorError::Serialize(e.to_string())
    }
}
