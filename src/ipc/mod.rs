//! Stdio MCP transport layer.
//!
//! Newline-delimited JSON-RPC 2.0 over stdin/stdout: `codec` frames lines,
//! `protocol` holds the envelope types, `dispatch` routes one request to the
//! `handlers`, and `server` runs the sequential loop.

pub mod codec;
pub mod dispatch;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use dispatch::{Dispatcher, Session};
pub use server::StdioServer;
