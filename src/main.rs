//! MCP Server Entry Point
//!
//! Loads configuration, resolves the prompt folder, builds the registry and
//! serves it over the configured transport.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use prompt_mcp_server::core::{Config, McpServer, TransportService};
use prompt_mcp_server::domains::prompts::{ArgumentPolicy, FormatterKind};

/// Serve markdown prompt files over the Model Context Protocol.
///
/// Every option can also be set through the environment variable of the
/// same name in upper case (e.g. `FOLDER`, `GIT_URL`).
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Folder with prompt files, or a subfolder of the repository with --git-url.
    #[arg(long)]
    folder: Option<String>,

    /// Git repository to clone prompts from.
    #[arg(long)]
    git_url: Option<String>,

    /// Where git repositories are cached.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Pull the cached repository on startup.
    #[arg(long)]
    auto_pull: bool,

    /// Template variable syntax: brace or dollar.
    #[arg(long, value_name = "FORMAT")]
    variable_format: Option<FormatterKind>,

    /// Derive arguments from the template when none are declared.
    #[arg(long)]
    auto_discover_args: bool,

    /// Treat whole files as template bodies.
    #[arg(long)]
    skip_frontmatter: bool,

    /// Ignore undeclared arguments instead of rejecting them.
    #[arg(long)]
    lenient_arguments: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Overlay command-line values onto `config`.
    fn apply(self, config: &mut Config) {
        if let Some(folder) = self.folder {
            config.source.folder = Some(folder);
        }
        if let Some(git_url) = self.git_url {
            config.source.git_url = Some(git_url);
        }
        if let Some(cache_dir) = self.cache_dir {
            config.source.cache_dir = cache_dir;
        }
        if self.auto_pull {
            config.source.auto_pull = true;
        }
        if let Some(format) = self.variable_format {
            config.prompts.variable_format = format;
        }
        if self.auto_discover_args {
            config.prompts.auto_discover_args = true;
        }
        if self.skip_frontmatter {
            config.prompts.skip_frontmatter = true;
        }
        if self.lenient_arguments {
            config.prompts.argument_policy = ArgumentPolicy::Lenient;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Invalid configuration")?;
    cli.apply(&mut config);

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);

    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::load(config)
        .await
        .context("Failed to load prompts")?;

    info!("Server initialized");

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs always go to stderr; stdout is reserved for protocol messages.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
