//! MCP Server implementation and session lifecycle.
//!
//! [`McpServer`] holds the immutable state shared by every connection: the
//! configuration and the prompt service built at startup. Each connection
//! drives its own [`Session`], which owns the `Uninitialized -> Ready`
//! state and turns one JSON-RPC line into at most one response.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::config::Config;
use super::protocol::{self, JsonRpcRequest, JsonRpcResponse};
use crate::domains::prompts::{Bindings, PromptError, PromptRegistry, PromptService, load_prompts};
use crate::domains::sources::{SourceResolver, SourceSpec};

/// The main MCP server handler.
#[derive(Debug, Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Service for handling prompt-related requests.
    prompt_service: Arc<PromptService>,
}

impl McpServer {
    /// Create a new MCP server over a fully built registry.
    pub fn new(config: Config, registry: Arc<PromptRegistry>) -> Self {
        let prompt_service = Arc::new(PromptService::new(
            registry,
            config.prompts.argument_policy,
        ));

        Self {
            config: Arc::new(config),
            prompt_service,
        }
    }

    /// Resolve the configured prompt source and build the server over it.
    ///
    /// Git sources are fetched into the cache first. Fails when no source is
    /// configured, the fetch fails or the folder cannot be scanned.
    pub async fn load(config: Config) -> super::Result<Self> {
        let spec = SourceSpec::from_config(&config.source)?;
        let root = SourceResolver::with_git(&config.source.cache_dir)
            .resolve(&spec)
            .await?;

        let loaded = load_prompts(&root, &config.prompts)?;

        Ok(Self::new(config, loaded.registry))
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Start a new protocol session.
    pub fn session(&self) -> Session {
        Session {
            server: self.clone(),
            state: SessionState::Uninitialized,
        }
    }

    fn initialize_result(&self, requested_version: Option<&str>) -> Value {
        json!({
            "protocolVersion": protocol::negotiate_version(requested_version),
            "capabilities": {
                "prompts": { "listChanged": false }
            },
            "serverInfo": {
                "name": self.name(),
                "version": self.version()
            },
            "instructions": format!(
                "This server provides {} prompt templates loaded from markdown files. \
                 Use prompts/list to discover them and prompts/get to render one.",
                self.prompt_service.registry().len()
            )
        })
    }
}

/// Protocol state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
}

/// One client conversation.
#[derive(Debug)]
pub struct Session {
    server: McpServer,
    state: SessionState,
}

#[derive(Debug, Deserialize)]
struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    protocol_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

impl Session {
    /// Current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle one raw input line.
    ///
    /// Blank lines and notifications produce no response. A line that is
    /// not JSON is answered with a parse error carrying a `null` id.
    pub fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable message: {}", e);
                return Some(JsonRpcResponse::parse_error(format!("Parse error: {e}")));
            }
        };

        let id = value.get("id").filter(|id| !id.is_null()).cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request),
            Err(e) => {
                warn!("Malformed request: {}", e);
                Some(JsonRpcResponse::invalid_request(
                    id,
                    format!("Invalid Request: {e}"),
                ))
            }
        }
    }

    /// Handle one decoded request.
    #[instrument(skip_all, fields(method = %request.method))]
    pub fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let JsonRpcRequest {
            jsonrpc,
            id,
            method,
            params,
        } = request;

        if id.as_ref().is_some_and(Value::is_null) {
            warn!("Rejecting {} with a null id", method);
            return Some(JsonRpcResponse::invalid_request(
                None,
                "Invalid Request: id must not be null",
            ));
        }

        if jsonrpc != "2.0" {
            return Some(JsonRpcResponse::invalid_request(
                id,
                "Invalid Request: jsonrpc must be \"2.0\"",
            ));
        }

        let response = match method.as_str() {
            "ping" => JsonRpcResponse::success(id, json!({})),

            "initialize" => self.handle_initialize(id, params),

            _ if self.state == SessionState::Uninitialized => {
                warn!("Request before initialize: {}", method);
                JsonRpcResponse::invalid_request(id, "Server not initialized")
            }

            "prompts/list" => self.handle_prompts_list(id),

            "prompts/get" => self.handle_prompts_get(id, params),

            _ => {
                warn!("Unknown method: {}", method);
                JsonRpcResponse::method_not_found(id, &method)
            }
        };

        Some(response)
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => info!("Client reported initialized"),
            method => debug!("Ignoring notification {}", method),
        }
    }

    fn handle_initialize(&mut self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        if self.state == SessionState::Ready {
            warn!("Rejecting second initialize");
            return JsonRpcResponse::invalid_request(id, "Server already initialized");
        }

        let requested = params
            .and_then(|params| serde_json::from_value::<InitializeParams>(params).ok())
            .and_then(|params| params.protocol_version);

        self.state = SessionState::Ready;
        info!(
            "Session initialized (client protocol {})",
            requested.as_deref().unwrap_or("unspecified")
        );

        JsonRpcResponse::success(id, self.server.initialize_result(requested.as_deref()))
    }

    fn handle_prompts_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let prompts = self.server.prompt_service.list_prompts();
        debug!("Listing {} prompts", prompts.len());

        JsonRpcResponse::success(id, json!({ "prompts": prompts }))
    }

    fn handle_prompts_get(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: GetPromptParams = match params
            .map(serde_json::from_value::<GetPromptParams>)
            .transpose()
        {
            Ok(Some(params)) => params,
            Ok(None) => return JsonRpcResponse::invalid_params(id, "Missing params"),
            Err(e) => return JsonRpcResponse::invalid_params(id, format!("Invalid params: {e}")),
        };

        let bindings = match params.arguments.map(bindings_from_json).transpose() {
            Ok(bindings) => bindings,
            Err(msg) => return JsonRpcResponse::invalid_params(id, msg),
        };

        match self.server.prompt_service.get_prompt(&params.name, bindings) {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => JsonRpcResponse::internal_error(id, e.to_string()),
            },
            Err(e) => {
                warn!("prompts/get '{}' failed: {}", params.name, e);
                JsonRpcResponse::error(id, error_code(&e), e.to_string())
            }
        }
    }
}

/// Argument values must be strings; numbers and booleans are accepted in
/// their JSON spelling.
fn bindings_from_json(arguments: Map<String, Value>) -> Result<Bindings, String> {
    arguments
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key, s)),
            Value::Number(n) => Ok((key, n.to_string())),
            Value::Bool(b) => Ok((key, b.to_string())),
            _ => Err(format!("Argument '{key}' must be a string")),
        })
        .collect()
}

/// JSON-RPC error code for a failed `prompts/get`.
pub fn error_code(error: &PromptError) -> i32 {
    match error {
        PromptError::NotFound(_) => protocol::NOT_FOUND,
        PromptError::MissingRequiredArgument(_)
        | PromptError::UnknownArgument(_)
        | PromptError::InvalidIdentifier(_) => protocol::INVALID_PARAMS,
        _ => protocol::INTERNAL_ERROR,
    }
}
