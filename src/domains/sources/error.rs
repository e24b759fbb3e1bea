//! Source resolution error types.

use thiserror::Error;

use crate::core::security::PathSecurityError;

/// Errors that can occur while resolving the prompt folder.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Neither a local folder nor a git URL was configured.
    #[error("Either a prompt folder or a git URL must be configured")]
    NotConfigured,

    /// The git URL has no recognisable owner/repository path.
    #[error("Cannot extract owner/repository from git URL: {0}")]
    InvalidUrl(String),

    /// A path derived from configuration failed validation.
    #[error("Invalid source path: {0}")]
    InvalidPath(#[from] PathSecurityError),

    /// A git command exited unsuccessfully.
    #[error("`{command}` failed: {message}")]
    Git { command: String, message: String },

    /// I/O error while preparing the cache or spawning git.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Create a new "invalid URL" error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl(url.into())
    }

    /// Create a new git command error.
    pub fn git(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Git {
            command: command.into(),
            message: message.into(),
        }
    }
}
