//! Tool registry — name → (descriptor, handler).
//!
//! Populated once at startup and read-only afterwards, so the dispatcher can
//! share it behind an `Arc` without locking.

use super::catalog::{field_errors_to_error, ToolDescriptor, ValidatedParams};
use crate::types::{ClientId, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

// =============================================================================
// Invocation result
// =============================================================================

/// A content block of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

/// Result of one tool invocation. `is_error` marks application failures;
/// the response itself is always delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<Content>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// Text of the first content block.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| match c {
            Content::Text { text } => text.as_str(),
        })
    }
}

// =============================================================================
// Handler seam
// =============================================================================

/// Implementation behind a registered tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run with validated parameters on behalf of `client`. Returns the text
    /// shown to the caller.
    async fn call(&self, client: &ClientId, params: ValidatedParams) -> Result<String>;
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    /// Registration order, used for listing.
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names are unique.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<()> {
        if descriptor.name.is_empty() {
            return Err(Error::validation("Tool name cannot be empty"));
        }
        if self.tools.contains_key(&descriptor.name) {
            return Err(Error::duplicate_tool(descriptor.name));
        }
        self.order.push(descriptor.name.clone());
        self.tools.insert(
            descriptor.name.clone(),
            RegisteredTool {
                descriptor,
                handler,
            },
        );
        Ok(())
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| &t.descriptor)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `args` against the tool's schema, then run its handler.
    pub async fn dispatch(
        &self,
        name: &str,
        args: Option<&Value>,
        client: &ClientId,
    ) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::unknown_tool(name))?;
        let params = tool
            .descriptor
            .schema
            .validate(args)
            .map_err(|errors| field_errors_to_error(&errors))?;
        tool.handler.call(client, params).await
    }

    /// Like [`dispatch`](Self::dispatch), but folds every failure except an
    /// unknown tool name into an `is_error` result.
    pub async fn call(
        &self,
        name: &str,
        args: Option<&Value>,
        client: &ClientId,
    ) -> Result<ToolResult> {
        match self.dispatch(name, args, client).await {
            Ok(text) => {
                tracing::debug!(tool = name, "tool call succeeded");
                Ok(ToolResult::text(text))
            }
            Err(e @ Error::UnknownTool(_)) => Err(e),
            Err(e) => {
                if e.is_transport() {
                    tracing::error!(tool = name, error = %e, "tool call hit a storage outage");
                } else {
                    tracing::info!(tool = name, error = %e, "tool call failed");
                }
                Ok(ToolResult::error(e.client_message()))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
