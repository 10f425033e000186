//! Tool infrastructure — parameter schemas, the registry, and the summary tools.

pub mod catalog;
pub mod registry;
pub mod summaries;

pub use catalog::{FieldError, ParamDef, ParamSchema, ParamType, ToolDescriptor, ValidatedParams};
pub use registry::{Content, ToolHandler, ToolRegistry, ToolResult};
pub use summaries::{
    register_summary_tools, TOOL_DELETE_SUMMARY, TOOL_LIST_SUMMARIES, TOOL_LOAD_SUMMARY,
    TOOL_PERSIST_SUMMARY,
};
