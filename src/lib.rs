//! # Summary Manager - MCP conversation summary store
//!
//! A long-lived stdio MCP server exposing four tools that save, load, list
//! and delete named conversation summaries in a remote PostgREST store, plus
//! two prompt templates that steer clients toward those tools.
//!
//! ## Architecture
//!
//! One sequential worker per process:
//! ```text
//!                 ┌──────────────────────────────────────────┐
//!   stdin  ──→    │ codec ──→ Dispatcher ──→ ToolRegistry    │
//!                 │              │              │            │
//!                 │              ▼              ▼            │
//!                 │        PromptCatalog   SummaryStore ──┼──→ PostgREST
//!   stdout ←──    │ codec ←── response                       │
//!                 └──────────────────────────────────────────┘
//! ```
//! The schema bootstrapper runs once before the first frame is read. The
//! caller identity is bound per session from configuration and passed
//! explicitly to every store call.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod ipc;
pub mod prompts;
pub mod storage;
pub mod tools;
pub mod types;
pub mod validation;

// Internal utilities
pub mod observability;

pub use types::{Config, Error, Result};
