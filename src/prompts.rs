//! Prompt templates — static instructions that steer the client to the
//! summary tools. No storage access.

use crate::tools::catalog::{field_errors_to_error, ParamDef, ParamSchema, ParamType};
use crate::tools::{TOOL_LOAD_SUMMARY, TOOL_PERSIST_SUMMARY};
use crate::types::{Error, Result};
use serde::Serialize;
use serde_json::{json, Value};

pub const PROMPT_SAVE_SUMMARY: &str = "save-summary";
pub const PROMPT_LOAD_SUMMARY: &str = "load-summary";

/// A rendered prompt: one user-role message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPrompt {
    pub description: String,
    pub message_text: String,
}

impl RenderedPrompt {
    /// `prompts/get` result body.
    pub fn to_value(&self) -> Value {
        json!({
            "description": self.description,
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": self.message_text },
            }],
        })
    }
}

#[derive(Clone)]
struct PromptTemplate {
    name: &'static str,
    description: &'static str,
    arguments: ParamSchema,
    render: fn(&str) -> String,
}

impl std::fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

fn render_save(key: &str) -> String {
    format!(
        "Please write a concise summary of our conversation so far, covering the key \
         decisions, facts and open questions. Then save it with the {} tool using \
         summaryKey \"{}\".",
        TOOL_PERSIST_SUMMARY, key
    )
}

fn render_load(key: &str) -> String {
    format!(
        "Please load the conversation summary stored under summaryKey \"{}\" with the {} \
         tool and use it as context for the rest of our conversation.",
        key, TOOL_LOAD_SUMMARY
    )
}

fn key_argument(description: &str) -> ParamSchema {
    ParamSchema::new(vec![ParamDef::required("key", ParamType::String, description)])
}

/// The fixed set of prompts the server advertises.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    templates: Vec<PromptTemplate>,
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self {
            templates: vec![
                PromptTemplate {
                    name: PROMPT_SAVE_SUMMARY,
                    description: "Summarize the current conversation and save it under a key",
                    arguments: key_argument("Key to save the summary under"),
                    render: render_save,
                },
                PromptTemplate {
                    name: PROMPT_LOAD_SUMMARY,
                    description: "Load a saved summary into the current conversation",
                    arguments: key_argument("Key of the summary to load"),
                    render: render_load,
                },
            ],
        }
    }
}

impl PromptCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// `prompts/list` entries.
    pub fn listings(&self) -> Vec<Value> {
        self.templates
            .iter()
            .map(|t| {
                let arguments: Vec<Value> = t
                    .arguments
                    .params
                    .iter()
                    .map(|p| {
                        json!({
                            "name": p.name,
                            "description": p.description,
                            "required": p.required,
                        })
                    })
                    .collect();
                json!({
                    "name": t.name,
                    "description": t.description,
                    "arguments": arguments,
                })
            })
            .collect()
    }

    /// Render `name` with `args`, validated like tool parameters.
    pub fn render(&self, name: &str, args: Option<&Value>) -> Result<RenderedPrompt> {
        let template = self
            .templates
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::unknown_prompt(name))?;
        let params = template
            .arguments
            .validate(args)
            .map_err(|errors| field_errors_to_error(&errors))?;
        let key = params
            .str("key")
            .ok_or_else(|| Error::validation("key: missing required parameter"))?;
        crate::validation::validate_non_empty(key, "key")?;

        Ok(RenderedPrompt {
            description: template.description.to_string(),
            message_text: (template.render)(key),
        })
    }
}
