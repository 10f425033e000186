//! Tool catalog — typed parameter schemas and validation.
//!
//! A [`ParamSchema`] is the ordered list of parameters a tool or prompt
//! accepts. Validation runs before any handler and yields either the
//! arguments with defaults filled in or every field that failed.

use crate::types::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

// =============================================================================
// Parameter types
// =============================================================================

/// Parameter type for tool inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Bool,
}

impl ParamType {
    /// Validate a JSON value against this parameter type.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        let ok = match self {
            ParamType::String => value.is_string(),
            ParamType::Bool => value.is_boolean(),
        };
        if ok {
            Ok(())
        } else {
            Err(format!(
                "expected {}, got {}",
                self.json_type(),
                value_type_name(value)
            ))
        }
    }

    /// JSON Schema `type` keyword.
    pub fn json_type(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Bool => "boolean",
        }
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Parameter definition
// =============================================================================

/// A single parameter definition for a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamDef {
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, param_type: ParamType, description: &str, default: Value) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            required: false,
            default: Some(default),
        }
    }
}

// =============================================================================
// Validation outcome
// =============================================================================

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Collapse field errors into a single `Validation` error.
pub fn field_errors_to_error(errors: &[FieldError]) -> Error {
    let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
    Error::validation(format!("invalid parameters: {}", joined.join("; ")))
}

/// Arguments that passed schema validation, with defaults substituted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedParams(Map<String, Value>);

impl ValidatedParams {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Deserialize into a typed argument struct.
    pub fn parse<T: DeserializeOwned>(&self) -> crate::types::Result<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| Error::validation(format!("invalid parameters: {}", e)))
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Ordered parameter list for one tool or prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamSchema {
    pub params: Vec<ParamDef>,
}

impl ParamSchema {
    pub fn new(params: Vec<ParamDef>) -> Self {
        Self { params }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate `args` (absent or `null` means no arguments).
    ///
    /// Reports every failing field: missing required parameters, type
    /// mismatches and unknown names. Omitted optional parameters take their
    /// defaults.
    pub fn validate(&self, args: Option<&Value>) -> Result<ValidatedParams, Vec<FieldError>> {
        let empty = Map::new();
        let provided = match args {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(vec![FieldError {
                    field: "arguments".to_string(),
                    message: format!("expected object, got {}", value_type_name(other)),
                }]);
            }
        };

        let mut errors = Vec::new();
        let mut validated = Map::new();

        for def in &self.params {
            match provided.get(&def.name) {
                Some(value) => match def.param_type.validate(value) {
                    Ok(()) => {
                        validated.insert(def.name.clone(), value.clone());
                    }
                    Err(message) => errors.push(FieldError {
                        field: def.name.clone(),
                        message,
                    }),
                },
                None if def.required => errors.push(FieldError {
                    field: def.name.clone(),
                    message: "missing required parameter".to_string(),
                }),
                None => {
                    if let Some(default) = &def.default {
                        validated.insert(def.name.clone(), default.clone());
                    }
                }
            }
        }

        for name in provided.keys() {
            if !self.params.iter().any(|p| &p.name == name) {
                errors.push(FieldError {
                    field: name.clone(),
                    message: "unknown parameter".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(ValidatedParams(validated))
        } else {
            Err(errors)
        }
    }

    /// JSON Schema object advertised as a tool's `inputSchema`.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for def in &self.params {
            let mut prop = json!({
                "type": def.param_type.json_type(),
                "description": def.description,
            });
            if let Some(default) = &def.default {
                prop["default"] = default.clone();
            }
            properties.insert(def.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

// =============================================================================
// Tool descriptor
// =============================================================================

/// Name, description and parameter schema of a registered tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub schema: ParamSchema,
}

impl ToolDescriptor {
    pub fn new(name: &str, description: &str, schema: ParamSchema) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            schema,
        }
    }

    /// Entry for a `tools/list` response.
    pub fn to_listing(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.schema.to_json_schema(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
