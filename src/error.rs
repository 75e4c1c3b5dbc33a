use thiserror::Error;

/// Unified error type for release-keeper operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Could not resolve ref: {0}")]
    RefNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Reference already exists: {0}")]
    RefExists(String),

    #[error("{operation} failed with conflicts; manual resolution is required\n{details}")]
    Conflict { operation: String, details: String },

    #[error("Command `{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("GitHub API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-keeper
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a not-found error for anything that is not a ref
    pub fn not_found(msg: impl Into<String>) -> Self {
        ReleaseError::NotFound(msg.into())
    }

    pub fn ref_not_found(reference: impl Into<String>) -> Self {
        ReleaseError::RefNotFound(reference.into())
    }

    pub fn conflict(operation: impl Into<String>, details: impl Into<String>) -> Self {
        ReleaseError::Conflict {
            operation: operation.into(),
            details: details.into(),
        }
    }

    pub fn command(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        ReleaseError::Command {
            command: command.into(),
            stderr: stderr.into(),
        }
    }
}
