//! PostgREST (Supabase) summary store.
//!
//! Talks to `{url}/rest/v1/{table}` with the access key sent both as `apikey`
//! and bearer token. Uniqueness of (client_id, summary_key) is enforced by the
//! table; this client never takes locks of its own.

use super::{schema_sql, DeleteOutcome, SchemaProbe, SummaryListing, SummaryStore};
use crate::types::{ClientId, Error, Result, StoreConfig, SummaryKey};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Postgres `undefined_table`.
const PG_UNDEFINED_TABLE: &str = "42P01";
/// PostgREST "relation not found in schema cache".
const PGRST_TABLE_NOT_FOUND: &str = "PGRST205";
/// Postgres `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Error body PostgREST returns on failures.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentRow {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    summary_key: SummaryKey,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PostgrestStore {
    http: Client,
    base_url: String,
    api_key: String,
    table: String,
    provision_rpc: String,
}

impl std::fmt::Debug for PostgrestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestStore")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .finish()
    }
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            table: config.table.clone(),
            provision_rpc: config.provision_rpc.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, self.provision_rpc)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn scoped(client: &ClientId, key: &SummaryKey) -> [(&'static str, String); 2] {
        [
            ("client_id", format!("eq.{}", client)),
            ("summary_key", format!("eq.{}", key)),
        ]
    }

    async fn send(&self, builder: RequestBuilder, op: &'static str) -> Result<Response> {
        self.authorized(builder).send().await.map_err(|e| {
            tracing::error!(op, error = %e, "summary store request failed");
            Error::transport(format!("{} request failed: {}", op, e))
        })
    }

    async fn decode<T: for<'de> Deserialize<'de>>(response: Response, op: &'static str) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            tracing::error!(op, error = %e, "malformed summary store response");
            Error::transport(format!("{} returned a malformed body: {}", op, e))
        })
    }

    /// Turn a non-success response into a transport error, keeping detail in logs.
    async fn failure(response: Response, op: &'static str) -> Error {
        let status = response.status();
        let body = response.json::<PostgrestError>().await.unwrap_or_default();
        tracing::error!(
            op,
            %status,
            code = body.code.as_deref().unwrap_or(""),
            message = body.message.as_deref().unwrap_or(""),
            "summary store rejected request"
        );
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Error::transport(format!("{} rejected credentials ({})", op, status))
            }
            _ => Error::transport(format!("{} failed with {}", op, status)),
        }
    }
}

#[async_trait]
impl SummaryStore for PostgrestStore {
    async fn save(
        &self,
        client: &ClientId,
        key: &SummaryKey,
        content: &str,
        overwrite: bool,
    ) -> Result<SummaryKey> {
        // created_at is left to the column default so only inserts set it.
        let body = json!({
            "client_id": client,
            "summary_key": key,
            "content": content,
            "updated_at": Utc::now(),
        });

        let mut request = self.http.post(self.table_url()).json(&body);
        request = if overwrite {
            request
                .query(&[("on_conflict", "client_id,summary_key")])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
        } else {
            request.header("Prefer", "return=minimal")
        };

        let response = self.send(request, "save").await?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(client_id = %client, key = %key, overwrite, "summary saved");
            return Ok(key.clone());
        }
        if status == StatusCode::CONFLICT {
            return Err(Error::conflict(format!(
                "summary '{}' already exists and overwrite is false",
                key
            )));
        }
        if status == StatusCode::BAD_REQUEST {
            let bytes = response.bytes().await.unwrap_or_default();
            let detail: PostgrestError = serde_json::from_slice(&bytes).unwrap_or_default();
            if detail.code.as_deref() == Some(PG_UNIQUE_VIOLATION) {
                return Err(Error::conflict(format!(
                    "summary '{}' already exists and overwrite is false",
                    key
                )));
            }
            tracing::error!(op = "save", %status, code = ?detail.code, "summary store rejected request");
            return Err(Error::transport(format!("save failed with {}", status)));
        }
        Err(Self::failure(response, "save").await)
    }

    async fn load(&self, client: &ClientId, key: &SummaryKey) -> Result<String> {
        let request = self
            .http
            .get(self.table_url())
            .query(&[("select", "content"), ("limit", "1")])
            .query(&Self::scoped(client, key));
        let response = self.send(request, "load").await?;
        if !response.status().is_success() {
            return Err(Self::failure(response, "load").await);
        }
        let rows: Vec<ContentRow> = Self::decode(response, "load").await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("no summary stored under '{}'", key)))?;

        let touch = self
            .http
            .patch(self.table_url())
            .query(&Self::scoped(client, key))
            .header("Prefer", "return=minimal")
            .json(&json!({ "last_accessed": Utc::now() }));
        match self.send(touch, "touch").await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(key = %key, status = %response.status(), "failed to refresh last_accessed");
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to refresh last_accessed");
            }
        }

        Ok(row.content)
    }

    async fn list(&self, client: &ClientId) -> Result<Vec<SummaryListing>> {
        let request = self.http.get(self.table_url()).query(&[
            ("select", "summary_key,created_at,updated_at".to_string()),
            ("client_id", format!("eq.{}", client)),
            ("order", "updated_at.desc".to_string()),
        ]);
        let response = self.send(request, "list").await?;
        if !response.status().is_success() {
            return Err(Self::failure(response, "list").await);
        }
        let rows: Vec<ListingRow> = Self::decode(response, "list").await?;
        Ok(rows
            .into_iter()
            .map(|row| SummaryListing {
                summary_key: row.summary_key,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn delete(
        &self,
        client: &ClientId,
        key: &SummaryKey,
        confirm: bool,
    ) -> Result<DeleteOutcome> {
        if !confirm {
            return Ok(DeleteOutcome::Cancelled);
        }
        let request = self
            .http
            .delete(self.table_url())
            .query(&Self::scoped(client, key))
            .header("Prefer", "return=representation");
        let response = self.send(request, "delete").await?;
        if !response.status().is_success() {
            return Err(Self::failure(response, "delete").await);
        }
        let removed: Vec<serde_json::Value> = Self::decode(response, "delete").await?;
        if removed.is_empty() {
            return Err(Error::not_found(format!(
                "no summary stored under '{}'",
                key
            )));
        }
        Ok(DeleteOutcome::Deleted)
    }

    async fn probe_schema(&self) -> Result<SchemaProbe> {
        let request = self
            .http
            .get(self.table_url())
            .query(&[("select", "id"), ("limit", "1")]);
        let response = self.send(request, "probe").await?;
        let status = response.status();
        if status.is_success() {
            return Ok(SchemaProbe::Present);
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(SchemaProbe::Missing);
        }
        let bytes = response.bytes().await.unwrap_or_default();
        let detail: PostgrestError = serde_json::from_slice(&bytes).unwrap_or_default();
        match detail.code.as_deref() {
            Some(PG_UNDEFINED_TABLE) | Some(PGRST_TABLE_NOT_FOUND) => Ok(SchemaProbe::Missing),
            code => {
                tracing::error!(op = "probe", %status, code = ?code, "schema probe failed");
                Err(Error::transport(format!("probe failed with {}", status)))
            }
        }
    }

    async fn provision_schema(&self) -> Result<()> {
        let request = self
            .http
            .post(self.rpc_url())
            .json(&json!({ "query": schema_sql(&self.table) }));
        let response = self.send(request, "provision").await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::failure(response, "provision").await)
        }
    }
}
