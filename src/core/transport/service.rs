//! Transport service - orchestrates different transport types.

use tracing::info;

use super::TransportConfig;
use crate::core::{McpServer, Result};

#[cfg(feature = "stdio")]
use super::stdio::StdioTransport;

#[cfg(feature = "tcp")]
use super::tcp::TcpTransport;

/// Transport service - manages the transport layer for the MCP server.
pub struct TransportService {
    config: TransportConfig,
}

impl TransportService {
    /// Create a new transport service with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Start the transport with the given MCP server.
    ///
    /// For stdio this returns when input ends; TCP runs until the process
    /// is stopped.
    pub async fn run(self, server: McpServer) -> Result<()> {
        info!("Starting transport: {}", self.config.description());

        match self.config {
            #[cfg(feature = "stdio")]
            TransportConfig::Stdio => StdioTransport::run(server).await?,
            #[cfg(feature = "tcp")]
            TransportConfig::Tcp(cfg) => TcpTransport::new(cfg).run(server).await?,
        }

        Ok(())
    }
}

#[cfg(all(test, feature = "tcp"))]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::core::transport::TransportError;
    use crate::domains::prompts::{FormatterKind, PromptRegistry, RegistryOptions, get_formatter};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_bind_failure_surfaces_as_transport_error() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let (registry, _) = PromptRegistry::build(
            Vec::new(),
            get_formatter(FormatterKind::Brace),
            RegistryOptions::default(),
        );
        let server = McpServer::new(Config::default(), Arc::new(registry));

        let err = TransportService::new(TransportConfig::tcp(port, "127.0.0.1"))
            .run(server)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            crate::core::Error::Transport(TransportError::BindError { .. })
        ));
    }
}
