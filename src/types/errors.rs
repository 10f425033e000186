//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// JSON-RPC error codes used on the stdio transport.
pub mod rpc_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Caller-facing text for store outages. Connection details stay in the logs.
pub const STORAGE_UNAVAILABLE: &str =
    "Storage unavailable: the summary store could not be reached. Please try again later.";

/// Main error enum for the summary manager.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing parameters (map to INVALID_PARAMS).
    #[error("validation error: {0}")]
    Validation(String),

    /// `tools/call` named a tool that is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A tool name was registered twice at startup.
    #[error("duplicate tool: {0}")]
    DuplicateTool(String),

    /// `prompts/get` named a prompt that does not exist.
    #[error("unknown prompt: {0}")]
    UnknownPrompt(String),

    /// JSON-RPC method not served (map to METHOD_NOT_FOUND).
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// No summary stored for (client, key).
    #[error("not found: {0}")]
    NotFound(String),

    /// Summary already exists and overwrite was not allowed.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Remote store unreachable, rejected credentials or answered garbage.
    #[error("transport error: {0}")]
    Transport(String),

    /// Startup misconfiguration. Fatal.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal errors (map to INTERNAL_ERROR).
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert to a JSON-RPC error code.
    pub fn to_rpc_code(&self) -> i64 {
        match self {
            Error::Validation(_) | Error::UnknownTool(_) | Error::UnknownPrompt(_) => {
                rpc_codes::INVALID_PARAMS
            }
            Error::MethodNotFound(_) => rpc_codes::METHOD_NOT_FOUND,
            Error::DuplicateTool(_)
            | Error::NotFound(_)
            | Error::Conflict(_)
            | Error::Transport(_)
            | Error::Config(_)
            | Error::Internal(_)
            | Error::Serialization(_)
            | Error::Io(_) => rpc_codes::INTERNAL_ERROR,
        }
    }

    /// Message safe to hand back to the caller.
    pub fn client_message(&self) -> String {
        match self {
            Error::Transport(_) => STORAGE_UNAVAILABLE.to_string(),
            Error::Io(_) | Error::Internal(_) | Error::Serialization(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Whether this is a store outage rather than a domain outcome.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    pub fn duplicate_tool(name: impl Into<String>) -> Self {
        Self::DuplicateTool(name.into())
    }

    pub fn unknown_prompt(name: impl Into<String>) -> Self {
        Self::UnknownPrompt(name.into())
    }

    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound(method.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
