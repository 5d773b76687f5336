//! Error types for the dialogue subsystem.

use thiserror::Error;

/// Dialogue subsystem error type.
#[derive(Debug, Error)]
pub enum DialogueError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Invalid stored record content.
    #[error("invalid dialogue record: {0}")]
    InvalidRecord(String),
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// HTTP transport error talking to an external endpoint.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Completion endpoint returned a non-success status.
    #[error("completion endpoint returned {status}: {body}")]
    Completion {
        /// HTTP status code of the response.
        status: u16,
        /// Response body text, as far as it could be read.
        body: String,
    },
    /// Completion response carried no choices.
    #[error("completion response contained no choices")]
    MissingChoice,
    /// Platform reply endpoint returned a non-success status.
    #[error("reply endpoint returned {status}: {body}")]
    Reply {
        /// HTTP status code of the response.
        status: u16,
        /// Response body text, as far as it could be read.
        body: String,
    },
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Convenience result alias for dialogue operations.
pub type DialogueResult<T> = Result<T, DialogueError>;
