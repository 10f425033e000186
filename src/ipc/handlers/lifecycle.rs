//! Lifecycle handler — `initialize` handshake and `ping`.

use crate::ipc::protocol::{
    parse_params, InitializeParams, MCP_PROTOCOL_VERSION, METHOD_INITIALIZE, METHOD_PING,
    SERVER_NAME,
};
use crate::types::{Error, Result};
use serde_json::{json, Value};

pub fn handle(method: &str, params: Option<Value>) -> Result<Value> {
    match method {
        METHOD_INITIALIZE => {
            let params: InitializeParams = parse_params(params)?;
            let protocol_version = params
                .protocol_version
                .unwrap_or_else(|| MCP_PROTOCOL_VERSION.to_string());
            tracing::info!(
                protocol_version = %protocol_version,
                client = ?params.client_info,
                "initialize handshake"
            );

            Ok(json!({
                "protocolVersion": protocol_version,
                "capabilities": {
                    "tools": { "listChanged": false },
                    "prompts": { "listChanged": false },
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }))
        }

        METHOD_PING => Ok(json!({})),

        _ => Err(Error::method_not_found(method)),
    }
}
