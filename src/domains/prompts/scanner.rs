//! Recursive markdown scanner.
//!
//! Walks a prompt folder, parses every `*.md` file (extension matched
//! case-insensitively) and yields one descriptor per file. Files that cannot
//! be read or parsed are yielded as errors; [`scan`] turns those into
//! warnings so one bad file never stops the rest from loading.
//!
//! Directory entries are visited in file-name order, so a scan of the same
//! tree always yields descriptors in the same order.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::error::PromptError;
use super::frontmatter::{self, ParseOptions};
use super::model::{LoadWarning, PromptDescriptor};
use crate::core::security::{expand_tilde, validate_safe_path};

/// Scanner over one prompt folder.
#[derive(Debug, Clone)]
pub struct PromptScanner {
    root: PathBuf,
    options: ParseOptions,
}

/// Result of a completed scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Successfully parsed descriptors, in traversal order.
    pub prompts: Vec<PromptDescriptor>,

    /// One entry per skipped file.
    pub warnings: Vec<LoadWarning>,
}

impl PromptScanner {
    /// Create a scanner rooted at `root`.
    ///
    /// A leading `~` is expanded, then the path is canonicalized. Fails with
    /// [`PromptError::RootInaccessible`] when the folder does not exist or is
    /// not a directory.
    pub fn new(root: impl AsRef<Path>, options: ParseOptions) -> Result<Self, PromptError> {
        let root = expand_tilde(root.as_ref())?;
        let root = validate_safe_path(&root, None)?;

        if !root.is_dir() {
            return Err(PromptError::root_inaccessible(root, "not a directory"));
        }

        Ok(Self { root, options })
    }

    /// The canonical scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the folder. Each call starts a fresh traversal.
    pub fn iter(&self) -> impl Iterator<Item = Result<PromptDescriptor, PromptError>> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() && is_markdown(entry.path()) => {
                    Some(self.load_file(entry.path()))
                }
                Ok(_) => None,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    Some(Err(PromptError::parse(path, e.to_string())))
                }
            })
    }

    fn load_file(&self, path: &Path) -> Result<PromptDescriptor, PromptError> {
        debug!("Loading prompt file {}", path.display());

        let bytes = fs::read(path)
            .map_err(|e| PromptError::parse(path, format!("cannot read file: {e}")))?;
        let content = String::from_utf8(bytes)
            .map_err(|_| PromptError::parse(path, "file is not valid UTF-8"))?;
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        frontmatter::parse(&content, relative, self.options)
    }
}

/// Scan `root` and collect all descriptors and warnings.
///
/// Only an inaccessible root is an error.
pub fn scan(root: impl AsRef<Path>, options: ParseOptions) -> Result<ScanReport, PromptError> {
    let scanner = PromptScanner::new(root, options)?;
    let mut report = ScanReport::default();

    for item in scanner.iter() {
        match item {
            Ok(descriptor) => report.prompts.push(descriptor),
            Err(e) => {
                warn!("{e}");
                report.warnings.push(warning_from(&e));
            }
        }
    }

    debug!(
        "Scanned {}: {} prompts, {} skipped",
        scanner.root().display(),
        report.prompts.len(),
        report.warnings.len()
    );

    Ok(report)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

fn warning_from(err: &PromptError) -> LoadWarning {
    let path = match err {
        PromptError::Parse { path, .. } => Some(path.clone()),
        _ => None,
    };
    LoadWarning::new(path, err.to_string())
}
