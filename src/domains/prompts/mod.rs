//! Prompts domain module.
//!
//! This module turns a folder of markdown files into prompts served over
//! MCP. Each file becomes one prompt: optional YAML frontmatter supplies the
//! metadata and argument list, the rest of the file is the template body.
//!
//! ## Architecture
//!
//! - `frontmatter.rs` - Splits a file into metadata and body
//! - `scanner.rs` - Walks a folder and parses every markdown file
//! - `templates.rs` - Brace (`{var}`) and dollar (`$var`) formatters
//! - `registry.rs` - Build-once, read-only table of prompts
//! - `service.rs` - Argument binding and rendering for `prompts/get`
//! - `loader.rs` - Scan + build in one step at startup

mod error;
pub mod frontmatter;
mod loader;
mod model;
mod registry;
pub mod scanner;
mod service;
pub mod templates;

pub use error::PromptError;
pub use frontmatter::ParseOptions;
pub use loader::{LoadedPrompts, load_prompts};
pub use model::{Argument, Bindings, LoadWarning, PromptDescriptor};
pub use registry::{PromptRegistry, RegistryOptions};
pub use scanner::{PromptScanner, ScanReport, scan};
pub use service::{ArgumentPolicy, PromptService};
pub use templates::{
    BraceFormatter, DollarFormatter, Formatter, FormatterKind, get_formatter,
};
