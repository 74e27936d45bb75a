use thiserror::Error;

/// Main error type for Selkie
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt document for session '{session_id}': {detail}")]
    Corruption { session_id: String, detail: String },

    #[error("Search error: {0}")]
    Search(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
