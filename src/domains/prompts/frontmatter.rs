//! Markdown frontmatter parsing.
//!
//! A prompt file may start with a YAML block fenced by `---` lines:
//!
//! ```markdown
//! ---
//! name: greeting
//! title: Greeting
//! description: Greets a user
//! arguments:
//!   - name: user
//!     description: Who to greet
//!   - name: project
//!     default: MyApp
//! ---
//! Hello {user}! Welcome to {project}.
//! ```
//!
//! Files without the block are all body. Unknown keys are ignored.
//!
//! A leading UTF-8 byte order mark is always dropped. Blank lines after the
//! closing fence and trailing whitespace are trimmed from the body, except
//! when frontmatter is skipped: then the file is served exactly as written.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use super::error::PromptError;
use super::model::{Argument, PromptDescriptor};
use crate::core::security::validate_identifier;

/// Line that opens and closes the metadata block.
pub const FENCE: &str = "---";

/// Parser switches coming from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Treat the whole file as body, ignoring any metadata block.
    pub skip_frontmatter: bool,
}

/// Parse one markdown prompt file.
///
/// `relative_path` is the file path relative to the scan root; it provides
/// the default name (file stem) and the default description.
pub fn parse(
    raw: &str,
    relative_path: &Path,
    options: ParseOptions,
) -> Result<PromptDescriptor, PromptError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let stem = relative_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| PromptError::parse(relative_path, "file name is not valid UTF-8"))?;

    let (metadata, body) = if options.skip_frontmatter {
        (Mapping::new(), raw)
    } else {
        match split_frontmatter(raw) {
            Some((yaml, body)) => (parse_metadata(yaml, relative_path)?, normalize_body(body)),
            None => (Mapping::new(), normalize_body(raw)),
        }
    };

    let name = string_field(&metadata, "name", relative_path)?.unwrap_or_else(|| stem.to_string());
    validate_identifier(&name).map_err(|e| {
        PromptError::parse(relative_path, format!("invalid prompt name '{name}': {e}"))
    })?;

    let title = string_field(&metadata, "title", relative_path)?.unwrap_or_else(|| name.clone());
    let description = string_field(&metadata, "description", relative_path)?
        .unwrap_or_else(|| relative_path.display().to_string());
    let arguments = parse_arguments(&metadata, relative_path)?;

    Ok(PromptDescriptor {
        name,
        title,
        description,
        arguments,
        body: body.to_string(),
        source_path: relative_path.to_path_buf(),
    })
}

/// Split `raw` into (metadata block, body) when it opens with a fence.
///
/// Returns `None` when there is no opening fence or it is never closed.
fn split_frontmatter(raw: &str) -> Option<(&str, &str)> {
    let mut lines = raw.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != FENCE {
        return None;
    }

    let mut offset = first.len();
    for line in lines {
        if line.trim_end() == FENCE {
            return Some((&raw[first.len()..offset], &raw[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

/// Drop blank lines after the fence and trailing whitespace.
fn normalize_body(body: &str) -> &str {
    body.trim_start_matches(['\r', '\n']).trim_end()
}

fn parse_metadata(yaml: &str, path: &Path) -> Result<Mapping, PromptError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value = serde_yaml::from_str(yaml)
        .map_err(|e| PromptError::parse(path, format!("invalid frontmatter: {e}")))?;

    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(PromptError::parse(path, "frontmatter must be a mapping")),
    }
}

/// Read a scalar field as text. Numbers and booleans are stringified.
fn scalar_text(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        Value::Bool(b) => Some(Some(b.to_string())),
        Value::Number(n) => Some(Some(n.to_string())),
        _ => None,
    }
}

fn string_field(mapping: &Mapping, key: &str, path: &Path) -> Result<Option<String>, PromptError> {
    match mapping.get(key) {
        None => Ok(None),
        Some(value) => scalar_text(value)
            .ok_or_else(|| PromptError::parse(path, format!("'{key}' must be a string"))),
    }
}

fn parse_arguments(metadata: &Mapping, path: &Path) -> Result<Vec<Argument>, PromptError> {
    match metadata.get("arguments") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_argument(index, item, path))
            .collect(),
        Some(_) => Err(PromptError::parse(path, "'arguments' must be a sequence")),
    }
}

fn parse_argument(index: usize, item: &Value, path: &Path) -> Result<Argument, PromptError> {
    let Value::Mapping(fields) = item else {
        return Err(PromptError::parse(
            path,
            format!("argument #{} must be a mapping", index + 1),
        ));
    };

    let field = |key: &str| {
        fields
            .get(key)
            .map(|value| {
                scalar_text(value).ok_or_else(|| {
                    PromptError::parse(
                        path,
                        format!("argument #{} field '{key}' must be a string", index + 1),
                    )
                })
            })
            .transpose()
            .map(Option::flatten)
    };

    let name = field("name")?.filter(|n| !n.is_empty()).ok_or_else(|| {
        PromptError::parse(path, format!("argument #{} has no name", index + 1))
    })?;
    validate_identifier(&name).map_err(|e| {
        PromptError::parse(path, format!("invalid argument name '{name}': {e}"))
    })?;

    Ok(Argument {
        name,
        description: field("description")?.unwrap_or_default(),
        default: field("default")?,
    })
}
