//! Per-area request handlers. Each takes the method name and raw params and
//! returns the JSON-RPC `result` value.

pub mod lifecycle;
pub mod prompts;
pub mod tools;
