//! Startup loading: scan a folder and build the registry.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::error::PromptError;
use super::frontmatter::ParseOptions;
use super::model::LoadWarning;
use super::registry::{PromptRegistry, RegistryOptions};
use super::scanner::scan;
use super::templates::get_formatter;
use crate::core::config::PromptsConfig;

/// A fully built registry plus every warning produced on the way.
#[derive(Debug)]
pub struct LoadedPrompts {
    pub registry: Arc<PromptRegistry>,
    pub warnings: Vec<LoadWarning>,
}

/// Scan `root` and build the registry using `config`.
///
/// Returns only once every file has been read and the registry is complete.
pub fn load_prompts(root: &Path, config: &PromptsConfig) -> Result<LoadedPrompts, PromptError> {
    let report = scan(
        root,
        ParseOptions {
            skip_frontmatter: config.skip_frontmatter,
        },
    )?;

    let (registry, build_warnings) = PromptRegistry::build(
        report.prompts,
        get_formatter(config.variable_format),
        RegistryOptions {
            auto_discover_args: config.auto_discover_args,
        },
    );

    let mut warnings = report.warnings;
    warnings.extend(build_warnings);

    info!(
        "Loaded {} prompts from {} ({} files skipped or replaced)",
        registry.len(),
        root.display(),
        warnings.len()
    );

    Ok(LoadedPrompts {
        registry: Arc::new(registry),
        warnings,
    })
}
