use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Missing credential: {0} must be set")]
    MissingCredential(&'static str),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),
    #[error("Model service error: {0}")]
    ModelService(String),
    #[error("Index not found: {0}")]
    IndexNotFound(String),
    #[error("Vector store error: {0}")]
    VectorStore(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Invalid prompt template: {0}")]
    InvalidTemplate(String),
}

pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RagError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        RagError::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
