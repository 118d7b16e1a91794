//! Custom error types for scrivener

use thiserror::Error;

/// Main error type for scrivener operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Extraction service error: {0}")]
    Extraction(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Document {0} has no transcript text")]
    EmptyTranscript(String),

    #[error("No text content extracted from {0}")]
    EmptyExtraction(String),

    #[error("Transcription polling timed out")]
    TranscriptionTimeout,

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("No vectors were successfully inserted for document {0}")]
    NoVectors(String),

    #[error("Deletion failed: {0}")]
    Deletion(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not initialized: run 'scrivener init' first")]
    NotInitialized,

    #[error("Already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl Error {
    /// Whether this error is a terminal input error that a job runner
    /// should not retry (bad input stays bad), as opposed to a transient
    /// infrastructure failure.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Error::DocumentNotFound(_)
                | Error::EmptyTranscript(_)
                | Error::EmptyExtraction(_)
                | Error::NoVectors(_)
                | Error::InvalidInput(_)
        )
    }
}

/// Result type alias for scrivener
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(Error::DocumentNotFound("abc".into()).is_terminal());
        assert!(Error::EmptyTranscript("abc".into()).is_terminal());
        assert!(Error::NoVectors("abc".into()).is_terminal());
        assert!(!Error::TranscriptionTimeout.is_terminal());
        assert!(!Error::Embedding("connection refused".into()).is_terminal());
        assert!(!Error::Storage("503".into()).is_terminal());
    }
}
