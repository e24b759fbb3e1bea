//! Prompt Registry - the read-only table of loaded prompts.
//!
//! The registry is built once from scanned descriptors and never changes
//! afterwards. Reloading means building a new registry and swapping the
//! `Arc` that holds it.
//!
//! Duplicate prompt names resolve last-wins: the descriptor that comes later
//! in scan order replaces the earlier one, and a warning names both files.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::PromptError;
use super::model::{Argument, LoadWarning, PromptDescriptor};
use super::templates::{Formatter, FormatterKind};
use crate::core::security::validate_identifier;

/// Build-time switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryOptions {
    /// Derive required arguments from the template body when a prompt
    /// declares none.
    pub auto_discover_args: bool,
}

/// In-memory mapping from prompt name to descriptor, bound to one formatter.
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    prompts: BTreeMap<String, PromptDescriptor>,
    formatter: Arc<dyn Formatter>,
}

impl PromptRegistry {
    /// Build a registry in a single pass over `descriptors`.
    ///
    /// Descriptors that fail validation are dropped; every dropped or
    /// replaced descriptor produces one warning.
    pub fn build(
        descriptors: impl IntoIterator<Item = PromptDescriptor>,
        formatter: Arc<dyn Formatter>,
        options: RegistryOptions,
    ) -> (Self, Vec<LoadWarning>) {
        let mut prompts: BTreeMap<String, PromptDescriptor> = BTreeMap::new();
        let mut warnings = Vec::new();

        for descriptor in descriptors {
            let source = descriptor.source_path.clone();
            let descriptor = match prepare(descriptor, formatter.as_ref(), options) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    warn!("Skipping {}: {e}", source.display());
                    warnings.push(LoadWarning::new(Some(source), e.to_string()));
                    continue;
                }
            };

            if let Some(previous) = prompts.get(&descriptor.name) {
                let message = format!(
                    "Duplicate prompt name '{}': {} replaces {}",
                    descriptor.name,
                    descriptor.source_path.display(),
                    previous.source_path.display()
                );
                warn!("{message}");
                warnings.push(LoadWarning::new(Some(source), message));
            }

            debug!("Registering prompt: {}", descriptor.name);
            prompts.insert(descriptor.name.clone(), descriptor);
        }

        info!(
            "Registered {} prompts ({} warnings)",
            prompts.len(),
            warnings.len()
        );

        (Self { prompts, formatter }, warnings)
    }

    /// Find a prompt by name.
    pub fn lookup(&self, name: &str) -> Result<&PromptDescriptor, PromptError> {
        self.prompts
            .get(name)
            .ok_or_else(|| PromptError::not_found(name))
    }

    /// All prompts, sorted by name.
    pub fn list(&self) -> impl Iterator<Item = &PromptDescriptor> + '_ {
        self.prompts.values()
    }

    /// The formatter every prompt in this registry renders with.
    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

/// Validate one descriptor and fill in discovered arguments.
fn prepare(
    mut descriptor: PromptDescriptor,
    formatter: &dyn Formatter,
    options: RegistryOptions,
) -> Result<PromptDescriptor, PromptError> {
    validate_identifier(&descriptor.name)?;

    let referenced = formatter.extract(&descriptor.body);

    if descriptor.arguments.is_empty() && options.auto_discover_args {
        descriptor.arguments = referenced.iter().map(Argument::required).collect();
    }

    let mut declared = HashSet::new();
    for argument in &descriptor.arguments {
        validate_identifier(&argument.name)?;
        if !declared.insert(argument.name.as_str()) {
            return Err(PromptError::DuplicateArgument {
                prompt: descriptor.name.clone(),
                argument: argument.name.clone(),
            });
        }
    }

    if let Some(undeclared) = referenced.iter().find(|v| !declared.contains(v.as_str())) {
        // Brace rendering fails on unbound variables, so such a prompt
        // could never be served. Dollar rendering leaves them verbatim.
        match formatter.kind() {
            FormatterKind::Brace => {
                return Err(PromptError::UndeclaredVariable {
                    prompt: descriptor.name.clone(),
                    variable: undeclared.clone(),
                });
            }
            FormatterKind::Dollar => debug!(
                "Prompt '{}' leaves undeclared variable '${}' verbatim",
                descriptor.name, undeclared
            ),
        }
    }

    Ok(descriptor)
}
