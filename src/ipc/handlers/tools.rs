//! Tools handler — `tools/list` and `tools/call`.

use crate::ipc::dispatch::Session;
use crate::ipc::protocol::{parse_params, CallToolParams, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST};
use crate::tools::ToolRegistry;
use crate::types::{Error, Result};
use serde_json::{json, Value};

pub async fn handle(
    registry: &ToolRegistry,
    session: &Session,
    method: &str,
    params: Option<Value>,
) -> Result<Value> {
    match method {
        METHOD_TOOLS_LIST => {
            let tools: Vec<Value> = registry
                .descriptors()
                .iter()
                .map(|d| d.to_listing())
                .collect();
            Ok(json!({ "tools": tools }))
        }

        METHOD_TOOLS_CALL => {
            let CallToolParams { name, arguments } = parse_params(params)?;
            tracing::debug!(tool = %name, client_id = %session.client_id(), "tools/call");

            let result = registry
                .call(&name, arguments.as_ref(), session.client_id())
                .await?;
            Ok(serde_json::to_value(result)?)
        }

        _ => Err(Error::method_not_found(method)),
    }
}
