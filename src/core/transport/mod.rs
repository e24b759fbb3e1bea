//! Transport layer for the MCP server.
//!
//! All transports speak newline-delimited JSON-RPC through [`serve_lines`]:
//! - **STDIO**: Standard input/output (default for MCP) - feature: `stdio`
//! - **TCP**: One session per accepted connection - feature: `tcp`

mod config;
mod error;
mod lines;
mod service;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use lines::serve_lines;
pub use service::TransportService;

#[cfg(feature = "tcp")]
pub use config::TcpConfig;
