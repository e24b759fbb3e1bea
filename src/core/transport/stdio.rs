//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.
//! Stdout carries protocol messages only; logs go to stderr.

use tokio::io::BufReader;
use tracing::info;

use super::TransportResult;
use super::lines::serve_lines;
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until stdin is closed.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        let reader = BufReader::new(tokio::io::stdin());
        serve_lines(server.session(), reader, tokio::io::stdout()).await?;

        info!("STDIO transport finished");
        Ok(())
    }
}
