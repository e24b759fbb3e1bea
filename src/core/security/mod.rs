// Security module for input validation
//
// Names that reach the template engine and paths that are used as scan roots
// or cache directories are validated here, preventing injection through
// argument names and path traversal through configured folders.

pub mod identifier;
pub mod path_validator;

pub use identifier::{
    IdentifierError, is_identifier_continue, is_identifier_start, is_identifier_syntax,
    validate_identifier, validate_path_component,
};
pub use path_validator::{PathSecurityError, expand_tilde, validate_safe_path};
