//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server,
//! including error handling, configuration, the JSON-RPC protocol session,
//! input validation and transport layer abstractions.

pub mod config;
pub mod error;
pub mod protocol;
pub mod security;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use security::{IdentifierError, PathSecurityError, validate_identifier, validate_safe_path};
pub use server::{McpServer, Session, SessionState};
pub use transport::{TransportConfig, TransportService};
