//! The four summary tools exposed to MCP clients.
//!
//! Tool names and parameter names are a wire contract with existing clients
//! and must not change.

use super::catalog::{ParamDef, ParamSchema, ParamType, ToolDescriptor, ValidatedParams};
use super::registry::{ToolHandler, ToolRegistry};
use crate::storage::{DeleteOutcome, SummaryStore};
use crate::types::{ClientId, Result};
use crate::validation::{parse_summary_key, validate_content};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub const TOOL_PERSIST_SUMMARY: &str = "persist-summary-to-storage";
pub const TOOL_LOAD_SUMMARY: &str = "load-summary-from-storage";
pub const TOOL_LIST_SUMMARIES: &str = "list-summaries";
pub const TOOL_DELETE_SUMMARY: &str = "delete-summary";

/// Register all summary tools against `store`.
pub fn register_summary_tools(
    registry: &mut ToolRegistry,
    store: Arc<dyn SummaryStore>,
) -> Result<()> {
    registry.register(
        persist_descriptor(),
        Arc::new(PersistSummary {
            store: store.clone(),
        }),
    )?;
    registry.register(
        load_descriptor(),
        Arc::new(LoadSummary {
            store: store.clone(),
        }),
    )?;
    registry.register(
        list_descriptor(),
        Arc::new(ListSummaries {
            store: store.clone(),
        }),
    )?;
    registry.register(delete_descriptor(), Arc::new(DeleteSummary { store }))?;
    Ok(())
}

fn persist_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        TOOL_PERSIST_SUMMARY,
        "Save a conversation summary to persistent storage under a key.",
        ParamSchema::new(vec![
            ParamDef::required(
                "summaryKey",
                ParamType::String,
                "Unique key to store the summary under",
            ),
            ParamDef::required("summary", ParamType::String, "The summary text to store"),
            ParamDef::optional(
                "overwrite",
                ParamType::Bool,
                "Replace an existing summary with the same key",
                json!(true),
            ),
        ]),
    )
}

fn load_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        TOOL_LOAD_SUMMARY,
        "Load a previously saved conversation summary by key.",
        ParamSchema::new(vec![
            ParamDef::required("summaryKey", ParamType::String, "Key of the summary to load"),
            ParamDef::optional(
                "includeInContext",
                ParamType::Bool,
                "Frame the summary as context for the current conversation",
                json!(true),
            ),
        ]),
    )
}

fn list_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        TOOL_LIST_SUMMARIES,
        "List saved conversation summaries, most recently updated first.",
        ParamSchema::empty(),
    )
}

fn delete_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        TOOL_DELETE_SUMMARY,
        "Delete a saved conversation summary by key.",
        ParamSchema::new(vec![
            ParamDef::required("summaryKey", ParamType::String, "Key of the summary to delete"),
            ParamDef::optional(
                "confirm",
                ParamType::Bool,
                "Must be true for the deletion to happen",
                json!(true),
            ),
        ]),
    )
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistArgs {
    summary_key: String,
    summary: String,
    overwrite: bool,
}

#[derive(Debug)]
struct PersistSummary {
    store: Arc<dyn SummaryStore>,
}

#[async_trait]
impl ToolHandler for PersistSummary {
    async fn call(&self, client: &ClientId, params: ValidatedParams) -> Result<String> {
        let args: PersistArgs = params.parse()?;
        let key = parse_summary_key(&args.summary_key, "summaryKey")?;
        validate_content(&args.summary, "summary")?;

        let saved = self
            .store
            .save(client, &key, &args.summary, args.overwrite)
            .await?;
        tracing::info!(client_id = %client, key = %saved, "summary persisted");
        Ok(format!("Summary saved under key '{}'.", saved))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadArgs {
    summary_key: String,
    include_in_context: bool,
}

#[derive(Debug)]
struct LoadSummary {
    store: Arc<dyn SummaryStore>,
}

#[async_trait]
impl ToolHandler for LoadSummary {
    async fn call(&self, client: &ClientId, params: ValidatedParams) -> Result<String> {
        let args: LoadArgs = params.parse()?;
        let key = parse_summary_key(&args.summary_key, "summaryKey")?;

        let content = self.store.load(client, &key).await?;
        tracing::info!(client_id = %client, key = %key, "summary loaded");
        if args.include_in_context {
            Ok(format!("Summary '{}' loaded into context:\n\n{}", key, content))
        } else {
            Ok(content)
        }
    }
}

#[derive(Debug)]
struct ListSummaries {
    store: Arc<dyn SummaryStore>,
}

#[async_trait]
impl ToolHandler for ListSummaries {
    async fn call(&self, client: &ClientId, _params: ValidatedParams) -> Result<String> {
        let listings = self.store.list(client).await?;
        if listings.is_empty() {
            return Ok("No summaries stored yet.".to_string());
        }
        let mut lines = Vec::with_capacity(listings.len() + 1);
        lines.push(format!("Stored summaries ({}):", listings.len()));
        for listing in listings {
            lines.push(format!(
                "- {} (updated {}, created {})",
                listing.summary_key,
                listing.updated_at.to_rfc3339(),
                listing.created_at.to_rfc3339()
            ));
        }
        Ok(lines.join("\n"))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteArgs {
    summary_key: String,
    confirm: bool,
}

#[derive(Debug)]
struct DeleteSummary {
    store: Arc<dyn SummaryStore>,
}

#[async_trait]
impl ToolHandler for DeleteSummary {
    async fn call(&self, client: &ClientId, params: ValidatedParams) -> Result<String> {
        let args: DeleteArgs = params.parse()?;
        let key = parse_summary_key(&args.summary_key, "summaryKey")?;

        match self.store.delete(client, &key, args.confirm).await? {
            DeleteOutcome::Deleted => {
                tracing::info!(client_id = %client, key = %key, "summary deleted");
                Ok(format!("Summary '{}' deleted.", key))
            }
            DeleteOutcome::Cancelled => Ok(format!(
                "Deletion of '{}' cancelled: confirm was false.",
                key
            )),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
