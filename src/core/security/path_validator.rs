use std::io;
use std::path::{Component, Path, PathBuf};

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' resolves outside allowed base directory '{base}'")]
    PathEscape { path: PathBuf, base: PathBuf },

    #[error("Invalid path component '{component}': {reason}")]
    InvalidComponent {
        component: String,
        reason: &'static str,
    },

    #[error("Path '{path}' contains a null byte")]
    NullByte { path: PathBuf },

    #[error("Cannot canonicalize path '{path}': {error}")]
    CannotCanonicalize { path: PathBuf, error: io::Error },

    #[error("Path does not exist: '{path}'")]
    PathNotFound { path: PathBuf },

    #[error("Cannot expand '~': home directory is unknown")]
    NoHomeDirectory,
}

/// Resolves `candidate` and checks it stays inside `base`.
///
/// This function performs the following checks:
/// 1. Rejects paths containing NUL bytes
/// 2. Canonicalizes the path to resolve `.`, `..`, and symlinks
/// 3. If a base is given, ensures the canonical path is within the canonical base
///
/// Without a base only the first two checks apply.
///
/// # Returns
///
/// * `Ok(PathBuf)` - The canonicalized, validated path
/// * `Err(PathSecurityError)` - If validation fails
///
/// # Examples
///
/// ```rust,ignore
/// let prompts = validate_safe_path(&checkout.join("prompts"), Some(&checkout))?;
/// ```
pub fn validate_safe_path(
    candidate: &Path,
    base: Option<&Path>,
) -> Result<PathBuf, PathSecurityError> {
    if candidate.as_os_str().to_string_lossy().contains('\0') {
        return Err(PathSecurityError::NullByte {
            path: candidate.to_path_buf(),
        });
    }

    let canonical_path = canonicalize_path(candidate)?;

    let Some(base) = base else {
        return Ok(canonical_path);
    };

    let canonical_base = canonicalize_path(base)?;

    if !is_within_base(&canonical_path, &canonical_base) {
        return Err(PathSecurityError::PathEscape {
            path: canonical_path,
            base: canonical_base,
        });
    }

    Ok(canonical_path)
}

/// Expands a leading `~` to the current user's home directory.
///
/// Only `~` and `~/...` are expanded; `~user` forms are returned unchanged.
pub fn expand_tilde(path: &Path) -> Result<PathBuf, PathSecurityError> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = dirs::home_dir().ok_or(PathSecurityError::NoHomeDirectory)?;
            Ok(home.join(components.as_path()))
        }
        _ => Ok(path.to_path_buf()),
    }
}

/// Checks if a path is within (or equal to) a base directory
fn is_within_base(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

fn canonicalize_path(path: &Path) -> Result<PathBuf, PathSecurityError> {
    path.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathSecurityError::PathNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PathSecurityError::CannotCanonicalize {
                path: path.to_path_buf(),
                error: e,
            }
        }
    })
}
