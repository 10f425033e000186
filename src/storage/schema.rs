//! Startup schema check.
//!
//! Runs once before the server reads its first request. A missing table that
//! cannot be provisioned leaves the process serving in degraded mode: tools
//! stay registered and storage calls fail until an operator creates the table.

use super::{SchemaProbe, SummaryStore};
use crate::types::{Error, Result};

/// Outcome of [`bootstrap_schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaState {
    /// Table already existed.
    Ready,
    /// Table was missing and has been created.
    Provisioned,
    /// Table is missing or unreachable; storage calls will fail.
    Degraded { reason: String },
}

impl SchemaState {
    pub fn is_degraded(&self) -> bool {
        matches!(self, SchemaState::Degraded { .. })
    }
}

/// Probe for the summary table and provision it when missing.
///
/// `schema_ddl` is logged verbatim when provisioning fails so an operator can
/// apply it by hand. Only configuration and internal faults are returned as
/// errors; outages and missing tables degrade.
pub async fn bootstrap_schema(store: &dyn SummaryStore, schema_ddl: &str) -> Result<SchemaState> {
    match store.probe_schema().await {
        Ok(SchemaProbe::Present) => {
            tracing::info!("summary table present");
            Ok(SchemaState::Ready)
        }
        Ok(SchemaProbe::Missing) => {
            tracing::info!("summary table missing, attempting to provision");
            match store.provision_schema().await {
                Ok(()) => {
                    tracing::info!("summary table provisioned");
                    Ok(SchemaState::Provisioned)
                }
                Err(e @ (Error::Config(_) | Error::Internal(_))) => Err(e),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "could not provision summary table; storage tools will fail until it exists. Required schema:\n{}",
                        schema_ddl
                    );
                    Ok(SchemaState::Degraded {
                        reason: format!("provisioning failed: {}", e),
                    })
                }
            }
        }
        Err(e @ (Error::Config(_) | Error::Internal(_))) => Err(e),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "summary table probe failed; continuing in degraded mode"
            );
            Ok(SchemaState::Degraded {
                reason: format!("probe failed: {}", e),
            })
        }
    }
}
