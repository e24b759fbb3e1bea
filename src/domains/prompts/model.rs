//! Prompt data model.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Per-request mapping of argument name to supplied value.
pub type Bindings = HashMap<String, String>;

/// One template variable a prompt accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    /// Variable name, a validated identifier.
    pub name: String,

    /// Human-readable description, may be empty.
    #[serde(default)]
    pub description: String,

    /// Value used when the client omits the argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Argument {
    /// A required argument without description.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            default: None,
        }
    }

    /// An argument is required unless it carries a default.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Parsed representation of one markdown prompt file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDescriptor {
    /// Registry key.
    pub name: String,

    /// Display name.
    pub title: String,

    /// Shown to clients in `prompts/list`.
    pub description: String,

    /// Declared arguments, in declaration order.
    pub arguments: Vec<Argument>,

    /// Template text after the frontmatter block.
    pub body: String,

    /// File the descriptor was read from.
    pub source_path: PathBuf,
}

impl PromptDescriptor {
    /// Look up a declared argument by name.
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

/// A recoverable problem found while loading prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// File the warning relates to, when there is one.
    pub path: Option<PathBuf>,

    pub message: String,
}

impl LoadWarning {
    pub fn new(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
