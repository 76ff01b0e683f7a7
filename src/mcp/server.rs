use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::error::McpError;

use super::handlers::RequestHandler;
use super::types::*;

pub const SERVER_NAME: &str = "slack-mcp-server";

/// JSON-RPC method router. Holds no per-client state, so any transport can
/// share one instance across concurrent requests.
#[derive(Clone)]
pub struct McpServer {
    handler: Arc<RequestHandler>,
}

impl McpServer {
    pub fn new(handler: RequestHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Handle one raw JSON-RPC message. `None` means the message was a
    /// notification and nothing should be sent back.
    pub async fn handle_message(&self, input: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(input) {
            Ok(req) => req,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                return Some(JsonRpcResponse::error(None, JsonRpcError::parse_error()));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request(),
            ));
        }

        if request.is_notification() {
            debug!(method = %request.method, "Notification received");
            return None;
        }

        debug!(method = %request.method, "Request received");
        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "ping" => Ok(JsonRpcResponse::success(request.id, json!({}))),
            "tools/list" => self.handle_list_tools(request),
            "tools/call" => self.handle_call_tool(request).await,
            "prompts/list" => Ok(JsonRpcResponse::success(request.id, json!({"prompts": []}))),
            "resources/list" => Ok(JsonRpcResponse::success(
                request.id,
                json!({"resources": []}),
            )),
            _ => {
                warn!("Unknown method: {}", request.method);
                Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::method_not_found(&request.method),
                ))
            }
        };

        Some(response.unwrap_or_else(|e| {
            error!("Error processing request: {}", e);
            JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string()))
        }))
    }

    fn handle_initialize(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, McpError> {
        let params: InitializeRequest = match request.params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return Ok(JsonRpcResponse::error(
                        request.id,
                        JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)),
                    ));
                }
            },
            None => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params".to_string()),
                ));
            }
        };

        // Support both protocol versions
        let protocol_version = if params.protocol_version.starts_with("2025") {
            PROTOCOL_VERSION_2025.to_string()
        } else {
            PROTOCOL_VERSION.to_string()
        };

        let result = InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: HashMap::from([("listChanged".to_string(), Value::Bool(false))]),
                experimental: Default::default(),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }

    fn handle_list_tools(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, McpError> {
        let result = ListToolsResult {
            tools: self.handler.list_tools(),
        };

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }

    async fn handle_call_tool(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, McpError> {
        let params: CallToolRequest = match request.params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                ));
            }
            None => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params".to_string()),
                ));
            }
        };

        match self.handler.call_tool(&params.name, params.arguments).await {
            Ok(result) => Ok(JsonRpcResponse::success(
                request.id,
                serde_json::to_value(result)?,
            )),
            Err(McpError::NotFound(message)) => Ok(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params(message),
            )),
            Err(e) => Err(e),
        }
    }
}
