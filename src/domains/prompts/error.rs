//! Prompt-specific error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::security::{IdentifierError, PathSecurityError};

/// Errors that can occur during prompt operations.
///
/// `Parse`, `DuplicateArgument` and `UndeclaredVariable` are per-file
/// problems: they are reported as warnings during loading and never abort
/// the scan. The rest surface to protocol clients.
#[derive(Debug, Error)]
pub enum PromptError {
    /// A prompt source file could not be turned into a descriptor.
    #[error("Skipping {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// A descriptor declares the same argument twice.
    #[error("Prompt '{prompt}' declares argument '{argument}' more than once")]
    DuplicateArgument { prompt: String, argument: String },

    /// A brace template references a variable it never declares.
    #[error("Prompt '{prompt}' references undeclared variable '{variable}'")]
    UndeclaredVariable { prompt: String, variable: String },

    /// The scan root is missing, not a directory, or unsafe.
    #[error("Prompt folder '{path}' is not accessible: {reason}")]
    RootInaccessible { path: PathBuf, reason: String },

    /// The requested prompt was not found.
    #[error("Prompt not found: {0}")]
    NotFound(String),

    /// A required argument was not supplied and has no default.
    #[error("Missing required argument: {0}")]
    MissingRequiredArgument(String),

    /// A binding names an argument the prompt does not declare.
    #[error("Unknown argument: {0}")]
    UnknownArgument(String),

    /// A template referenced a variable with no binding.
    #[error("Missing template variable: {0}")]
    MissingVariable(String),

    /// The requested variable format does not exist.
    #[error("Unsupported variable format: {0}")]
    UnsupportedFormat(String),

    /// A name failed identifier validation.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),
}

impl PromptError {
    /// Create a new parse warning for `path`.
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new "root inaccessible" error.
    pub fn root_inaccessible(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::RootInaccessible {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "missing required argument" error.
    pub fn missing_argument(arg: impl Into<String>) -> Self {
        Self::MissingRequiredArgument(arg.into())
    }

    /// Create a new "unknown argument" error.
    pub fn unknown_argument(arg: impl Into<String>) -> Self {
        Self::UnknownArgument(arg.into())
    }

    /// Create a new "missing variable" error.
    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable(name.into())
    }
}

impl From<PathSecurityError> for PromptError {
    fn from(err: PathSecurityError) -> Self {
        let path = match &err {
            PathSecurityError::PathEscape { path, .. }
            | PathSecurityError::NullByte { path }
            | PathSecurityError::CannotCanonicalize { path, .. }
            | PathSecurityError::PathNotFound { path } => path.clone(),
            PathSecurityError::InvalidComponent { component, .. } => PathBuf::from(component),
            PathSecurityError::NoHomeDirectory => PathBuf::from("~"),
        };
        Self::root_inaccessible(path, err)
    }
}
