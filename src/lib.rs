//! Prompt MCP Server Library
//!
//! Serves a folder of markdown prompt files over the Model Context Protocol.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the JSON-RPC session and transports
//! - **domains**: business logic organized by bounded contexts
//!   - **prompts**: frontmatter parsing, scanning, templates and the registry
//!   - **sources**: resolving a local folder or a cached git checkout
//!
//! # Example
//!
//! ```rust,no_run
//! use prompt_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::from_env()?;
//!     config.source.folder = Some("./prompts".into());
//!     let transport = TransportService::new(config.transport.clone());
//!     transport.run(McpServer::load(config).await?).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
