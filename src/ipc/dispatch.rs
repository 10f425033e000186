//! Top-level dispatcher — decodes one frame, routes by method, delegates to
//! handlers, and always produces at most one response.

use crate::ipc::handlers;
use crate::ipc::protocol::{
    JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION, METHOD_INITIALIZE, METHOD_PING,
    METHOD_PROMPTS_GET, METHOD_PROMPTS_LIST, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
    NOTIFICATION_INITIALIZED,
};
use crate::prompts::PromptCatalog;
use crate::tools::ToolRegistry;
use crate::types::{ClientId, Config, Error, Result};
use serde_json::Value;
use std::sync::Arc;

/// Per-connection state. The caller identity is fixed here, from
/// configuration, and never read from request payloads.
#[derive(Debug, Clone)]
pub struct Session {
    client_id: ClientId,
}

impl Session {
    pub fn new(client_id: ClientId) -> Self {
        Self { client_id }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client_id = ClientId::from_string(config.client_id.trim().to_string())
            .map_err(|e| Error::config(e.to_string()))?;
        Ok(Self::new(client_id))
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }
}

/// Routes requests to the tool registry and prompt catalog. Both are frozen
/// at construction.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tools: Arc<ToolRegistry>,
    prompts: Arc<PromptCatalog>,
}

impl Dispatcher {
    pub fn new(tools: ToolRegistry, prompts: PromptCatalog) -> Self {
        Self {
            tools: Arc::new(tools),
            prompts: Arc::new(prompts),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Decode and handle one raw frame. `None` means nothing is written back
    /// (the frame was a notification).
    pub async fn handle_frame(&self, session: &Session, frame: &[u8]) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_slice(frame) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable frame");
                return Some(JsonRpcResponse::parse_error(e));
            }
        };

        if !value.is_object() {
            return Some(JsonRpcResponse::invalid_request(
                Value::Null,
                "expected a single JSON-RPC object",
            ));
        }

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => return Some(JsonRpcResponse::invalid_request(id, e)),
        };

        if let Some(version) = request.jsonrpc.as_deref() {
            if version != JSONRPC_VERSION {
                return Some(JsonRpcResponse::invalid_request(
                    id,
                    format!("unsupported jsonrpc version '{}'", version),
                ));
            }
        }

        self.handle(session, request).await
    }

    /// Handle an already decoded request.
    pub async fn handle(
        &self,
        session: &Session,
        request: JsonRpcRequest,
    ) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            match request.method.as_str() {
                NOTIFICATION_INITIALIZED => tracing::info!("client initialized"),
                other => tracing::debug!(method = other, "notification ignored"),
            }
            return None;
        }

        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        let id = id.unwrap_or(Value::Null);
        tracing::debug!(method = %method, id = %id, "handling request");

        match self.route(session, &method, params).await {
            Ok(result) => Some(JsonRpcResponse::success(id, result)),
            Err(e) => {
                tracing::info!(method = %method, error = %e, "request failed");
                Some(JsonRpcResponse::from_error(id, &e))
            }
        }
    }

    async fn route(&self, session: &Session, method: &str, params: Option<Value>) -> Result<Value> {
        match method {
            METHOD_INITIALIZE | METHOD_PING => handlers::lifecycle::handle(method, params),
            METHOD_TOOLS_LIST | METHOD_TOOLS_CALL => {
                handlers::tools::handle(&self.tools, session, method, params).await
            }
            METHOD_PROMPTS_LIST | METHOD_PROMPTS_GET => {
                handlers::prompts::handle(&self.prompts, method, params)
            }
            _ => Err(Error::method_not_found(method)),
        }
    }
}
