//! Core types for the summary manager.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (ClientId, SummaryKey, RecordId)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for the store, transport and logging

mod config;
mod errors;
mod ids;

pub use config::{Config, IpcConfig, ObservabilityConfig, StoreBackend, StoreConfig};
pub use errors::{rpc_codes, Error, Result, STORAGE_UNAVAILABLE};
pub use ids::{ClientId, RecordId, SummaryKey};
