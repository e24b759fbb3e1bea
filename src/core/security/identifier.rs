//! Identifier and path-component validation.
//!
//! Every name that flows from a prompt file or a client request into the
//! template engine (prompt names, argument names, binding keys) passes
//! through [`validate_identifier`]. Names derived from remote URLs that end up
//! as cache directories pass through [`validate_path_component`].

use super::path_validator::PathSecurityError;

/// Maximum accepted identifier length.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Introspection-style names that are never accepted as identifiers.
const RESERVED_IDENTIFIERS: &[&str] = &[
    "eval",
    "exec",
    "compile",
    "__import__",
    "__builtins__",
    "__globals__",
    "__locals__",
    "__dict__",
    "__class__",
    "__bases__",
    "__subclasses__",
    "__init__",
    "__new__",
];

/// Errors produced by [`validate_identifier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("Identifier cannot be empty")]
    Empty,

    #[error("Identifier '{name}' exceeds {max} characters")]
    TooLong { name: String, max: usize },

    #[error("Identifier '{0}' must start with a letter or underscore")]
    InvalidStart(String),

    #[error("Identifier '{name}' contains invalid character {ch:?}")]
    InvalidCharacter { name: String, ch: char },

    #[error("Identifier '{0}' is reserved")]
    Reserved(String),
}

/// Returns true when `s` matches `[A-Za-z_][A-Za-z0-9_]*`.
///
/// This is the lexical grammar only; the template scanners use it to
/// recognise variable tokens. Use [`validate_identifier`] before trusting a
/// name.
pub fn is_identifier_syntax(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => chars.all(is_identifier_continue),
        _ => false,
    }
}

/// First character of an identifier.
pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Any non-first character of an identifier.
pub fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Validate a prompt name, argument name or binding key.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*` up to [`MAX_IDENTIFIER_LEN`] characters,
/// and rejects dunder names (`__x__`) as well as a small denylist of
/// introspection keywords.
pub fn validate_identifier(name: &str) -> Result<(), IdentifierError> {
    let Some(first) = name.chars().next() else {
        return Err(IdentifierError::Empty);
    };

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(IdentifierError::TooLong {
            name: name.chars().take(32).collect(),
            max: MAX_IDENTIFIER_LEN,
        });
    }

    if !is_identifier_start(first) {
        return Err(IdentifierError::InvalidStart(name.to_string()));
    }

    if let Some(ch) = name.chars().find(|c| !is_identifier_continue(*c)) {
        return Err(IdentifierError::InvalidCharacter {
            name: name.to_string(),
            ch,
        });
    }

    if RESERVED_IDENTIFIERS.contains(&name) || (name.starts_with("__") && name.ends_with("__")) {
        return Err(IdentifierError::Reserved(name.to_string()));
    }

    Ok(())
}

/// Validate a single path component taken from untrusted input.
///
/// Rejects empty strings, `.` and `..`, path separators and NUL bytes.
pub fn validate_path_component(component: &str) -> Result<(), PathSecurityError> {
    let reason = if component.is_empty() {
        "component cannot be empty"
    } else if component == "." || component == ".." {
        "component cannot be a relative directory reference"
    } else if component.contains('/') || component.contains('\\') {
        "component cannot contain path separators"
    } else if component.contains('\0') {
        "component cannot contain null bytes"
    } else {
        return Ok(());
    };

    Err(PathSecurityError::InvalidComponent {
        component: component.to_string(),
        reason,
    })
}
