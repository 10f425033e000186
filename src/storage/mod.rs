//! Summary storage — the keyed record store behind the summary tools.
//!
//! Every operation is scoped by an explicit [`ClientId`]. The store never
//! learns the caller from ambient state; the transport binds the identity once
//! per session and passes it down on each call.
//!
//! Two backends implement [`SummaryStore`]:
//! - [`PostgrestStore`]: PostgREST/Supabase over HTTP (production)
//! - [`MemoryStore`]: process-local map (local trials, tests)

pub mod memory;
pub mod postgrest;
pub mod schema;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;
pub use schema::{bootstrap_schema, SchemaState};

use crate::types::{ClientId, RecordId, Result, StoreBackend, StoreConfig, SummaryKey};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Table definition the store expects. Logged when provisioning fails.
pub fn schema_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    client_id TEXT NOT NULL,
    summary_key TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    last_accessed TIMESTAMPTZ,
    UNIQUE (client_id, summary_key)
);
CREATE INDEX IF NOT EXISTS {table}_client_updated_idx ON {table} (client_id, updated_at DESC);"
    )
}

/// A stored summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Row id, assigned on first insert and kept across overwrites.
    pub id: RecordId,
    pub client_id: ClientId,
    pub summary_key: SummaryKey,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
}

/// One row of a `list` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryListing {
    pub summary_key: SummaryKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// `confirm` was false; nothing was touched.
    Cancelled,
}

/// Result of probing for the backing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaProbe {
    Present,
    Missing,
}

/// Keyed summary store scoped by caller identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SummaryStore: Send + Sync + std::fmt::Debug {
    /// Upsert `content` under (client, key). With `overwrite == false` an
    /// existing record is a `Conflict` and stays untouched.
    async fn save(
        &self,
        client: &ClientId,
        key: &SummaryKey,
        content: &str,
        overwrite: bool,
    ) -> Result<SummaryKey>;

    /// Fetch content and refresh `last_accessed`. Missing records are `NotFound`.
    async fn load(&self, client: &ClientId, key: &SummaryKey) -> Result<String>;

    /// All records of a client, most recently updated first.
    async fn list(&self, client: &ClientId) -> Result<Vec<SummaryListing>>;

    /// Remove a record. `confirm == false` is a no-op returning `Cancelled`.
    async fn delete(
        &self,
        client: &ClientId,
        key: &SummaryKey,
        confirm: bool,
    ) -> Result<DeleteOutcome>;

    /// Minimal read that tells whether the backing table exists.
    async fn probe_schema(&self) -> Result<SchemaProbe>;

    /// Idempotently create the backing table.
    async fn provision_schema(&self) -> Result<()>;
}

/// Build the store selected by `config`.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn SummaryStore>> {
    match config.backend {
        StoreBackend::Postgrest => Ok(Arc::new(PostgrestStore::new(config)?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
