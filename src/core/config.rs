//! Configuration management for the MCP server.
//!
//! Configuration starts from defaults, is overlaid with environment variables
//! (a `.env` file is honoured) and finally with command-line flags in `main`.

use super::transport::TransportConfig;
use crate::domains::prompts::{ArgumentPolicy, FormatterKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Default location of cloned prompt repositories.
pub const DEFAULT_CACHE_DIR: &str = "~/.prompt-mcp/remote";

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Where prompt files are read from.
    pub source: SourceConfig,

    /// How prompt files are parsed and rendered.
    pub prompts: PromptsConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Configuration for the sources domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Local prompt folder, or a subfolder of the repository when
    /// `git_url` is set.
    pub folder: Option<String>,

    /// Remote repository holding the prompts.
    pub git_url: Option<String>,

    /// Where repositories are cloned.
    pub cache_dir: PathBuf,

    /// Pull the cached checkout on startup.
    pub auto_pull: bool,
}

/// Configuration for the prompts domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Template variable syntax.
    pub variable_format: FormatterKind,

    /// Derive arguments from the body when none are declared.
    pub auto_discover_args: bool,

    /// Treat the whole file as the body.
    pub skip_frontmatter: bool,

    /// Handling of undeclared arguments in `prompts/get`.
    pub argument_policy: ArgumentPolicy,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            folder: None,
            git_url: None,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            auto_pull: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Parse a boolean flag the way shells usually spell them.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str) -> super::Result<Option<bool>> {
    match env_var(key) {
        Some(value) => parse_flag(&value)
            .map(Some)
            .ok_or_else(|| super::Error::config(format!("{key}: expected a boolean, got '{value}'"))),
        None => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Reads `FOLDER`, `GIT_URL`, `CACHE_DIR`, `AUTO_PULL`, `VARIABLE_FORMAT`,
    /// `AUTO_DISCOVER_ARGS`, `SKIP_FRONTMATTER`, `STRICT_ARGUMENTS`,
    /// `MCP_SERVER_NAME`, `MCP_LOG_LEVEL` and the transport variables.
    pub fn from_env() -> super::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(name) = env_var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(level) = env_var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.source.folder = env_var("FOLDER");
        config.source.git_url = env_var("GIT_URL");
        if let Some(cache_dir) = env_var("CACHE_DIR") {
            config.source.cache_dir = PathBuf::from(cache_dir);
        }
        if let Some(auto_pull) = env_flag("AUTO_PULL")? {
            config.source.auto_pull = auto_pull;
        }

        if let Some(format) = env_var("VARIABLE_FORMAT") {
            config.prompts.variable_format = format.parse()?;
        }
        if let Some(auto_discover) = env_flag("AUTO_DISCOVER_ARGS")? {
            config.prompts.auto_discover_args = auto_discover;
        }
        if let Some(skip) = env_flag("SKIP_FRONTMATTER")? {
            config.prompts.skip_frontmatter = skip;
        }
        if let Some(strict) = env_flag("STRICT_ARGUMENTS")? {
            config.prompts.argument_policy = if strict {
                ArgumentPolicy::Strict
            } else {
                ArgumentPolicy::Lenient
            };
        }

        config.transport = TransportConfig::from_env();

        info!(
            "Configuration loaded: format={}, auto_discover_args={}, skip_frontmatter={}",
            config.prompts.variable_format,
            config.prompts.auto_discover_args,
            config.prompts.skip_frontmatter
        );

        Ok(config)
    }
}
