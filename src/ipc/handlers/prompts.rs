//! Prompts handler — `prompts/list` and `prompts/get`.

use crate::ipc::protocol::{parse_params, GetPromptParams, METHOD_PROMPTS_GET, METHOD_PROMPTS_LIST};
use crate::prompts::PromptCatalog;
use crate::types::{Error, Result};
use serde_json::{json, Value};

pub fn handle(catalog: &PromptCatalog, method: &str, params: Option<Value>) -> Result<Value> {
    match method {
        METHOD_PROMPTS_LIST => Ok(json!({ "prompts": catalog.listings() })),

        METHOD_PROMPTS_GET => {
            let GetPromptParams { name, arguments } = parse_params(params)?;
            let rendered = catalog.render(&name, arguments.as_ref())?;
            Ok(rendered.to_value())
        }

        _ => Err(Error::method_not_found(method)),
    }
}
