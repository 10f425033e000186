//! In-memory summary store.
//!
//! A single `tokio::sync::RwLock` around the map gives each write the same
//! all-or-nothing behaviour the unique constraint gives the remote table.

use super::{DeleteOutcome, SchemaProbe, SummaryListing, SummaryRecord, SummaryStore};
use crate::types::{ClientId, Error, RecordId, Result, SummaryKey};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

type RecordKey = (ClientId, SummaryKey);

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<RecordKey, SummaryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a record, including timestamps.
    pub async fn get_record(&self, client: &ClientId, key: &SummaryKey) -> Option<SummaryRecord> {
        self.records
            .read()
            .await
            .get(&(client.clone(), key.clone()))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl SummaryStore for MemoryStore {
    async fn save(
        &self,
        client: &ClientId,
        key: &SummaryKey,
        content: &str,
        overwrite: bool,
    ) -> Result<SummaryKey> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        match records.get_mut(&(client.clone(), key.clone())) {
            Some(_) if !overwrite => {
                return Err(Error::conflict(format!(
                    "summary '{}' already exists and overwrite is false",
                    key
                )));
            }
            Some(record) => {
                record.content = content.to_string();
                record.updated_at = now;
            }
            None => {
                let record = SummaryRecord {
                    id: RecordId::new(),
                    client_id: client.clone(),
                    summary_key: key.clone(),
                    content: content.to_string(),
                    created_at: now,
                    updated_at: now,
                    last_accessed: None,
                };
                records.insert((client.clone(), key.clone()), record);
            }
        }
        Ok(key.clone())
    }

    async fn load(&self, client: &ClientId, key: &SummaryKey) -> Result<String> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&(client.clone(), key.clone()))
            .ok_or_else(|| Error::not_found(format!("no summary stored under '{}'", key)))?;
        record.last_accessed = Some(Utc::now());
        Ok(record.content.clone())
    }

    async fn list(&self, client: &ClientId) -> Result<Vec<SummaryListing>> {
        let records = self.records.read().await;
        let mut listings: Vec<SummaryListing> = records
            .values()
            .filter(|record| &record.client_id == client)
            .map(|record| SummaryListing {
                summary_key: record.summary_key.clone(),
                created_at: record.created_at,
                updated_at: record.updated_at,
            })
            .collect();
        listings.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.summary_key.cmp(&b.summary_key))
        });
        Ok(listings)
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
        self.records
            .write()
            .await
            .remove(&(client.clone(), key.clone()))
            .map(|_| DeleteOutcome::Deleted)
            .ok_or_else(|| Error::not_found(format!("no summary stored under '{}'", key)))
    }

    async fn probe_schema(&self) -> Result<SchemaProbe> {
        Ok(SchemaProbe::Present)
    }

    async fn provision_schema(&self) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn client(s: &str) -> ClientId {
        ClientId::from_string(s.to_string()).unwrap()
    }

    fn key(s: &str) -> SummaryKey {
        SummaryKey::from_string(s.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryStore::new();
        let saved = store
            .save(&client("x"), &key("k"), "hello", true)
            .await
            .unwrap();
        assert_eq!(saved, key("k"));
        assert_eq!(store.load(&client("x"), &key("k")).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_overwrite_keeps_created_at() {
        let store = MemoryStore::new();
        store.save(&client("x"), &key("k"), "v1", true).await.unwrap();
        let first = store.get_record(&client("x"), &key("k")).await.unwrap();

        store.save(&client("x"), &key("k"), "v2", true).await.unwrap();
        let second = store.get_record(&client("x"), &key("k")).await.unwrap();

        assert_eq!(second.content, "v2");
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_conflict_leaves_content() {
        let store = MemoryStore::new();
        store.save(&client("x"), &key("k"), "original", true).await.unwrap();

        let err = store
            .save(&client("x"), &key("k"), "replacement", false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.load(&client("x"), &key("k")).await.unwrap(), "original");
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.load(&client("x"), &key("nope")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_refreshes_last_accessed() {
        let store = MemoryStore::new();
        store.save(&client("x"), &key("k"), "v", true).await.unwrap();
        assert!(store
            .get_record(&client("x"), &key("k"))
            .await
            .unwrap()
            .last_accessed
            .is_none());

        store.load(&client("x"), &key("k")).await.unwrap();
        assert!(store
            .get_record(&client("x"), &key("k"))
            .await
            .unwrap()
            .last_accessed
            .is_some());
    }

    #[tokio::test]
    async fn test_delete_unconfirmed_is_noop() {
        let store = MemoryStore::new();
        store.save(&client("x"), &key("k"), "keep me", true).await.unwrap();

        let outcome = store.delete(&client("x"), &key("k"), false).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(store.load(&client("x"), &key("k")).await.unwrap(), "keep me");
    }

    #[tokio::test]
    async fn test_delete_removes_and_reports_missing() {
        let store = MemoryStore::new();
        store.save(&client("x"), &key("k"), "v", true).await.unwrap();

        assert_eq!(
            store.delete(&client("x"), &key("k"), true).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(matches!(
            store.delete(&client("x"), &key("k"), true).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_isolates_clients_and_orders_by_recency() {
        let store = MemoryStore::new();
        store.save(&client("x"), &key("a"), "1", true).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.save(&client("x"), &key("b"), "2", true).await.unwrap();

        let listed = store.list(&client("x")).await.unwrap();
        let keys: Vec<&str> = listed.iter().map(|l| l.summary_key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);

        assert!(store.list(&client("y")).await.unwrap().is_empty());
        assert!(matches!(
            store.load(&client("y"), &key("a")).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_saves_keep_one_payload() {
        let store = Arc::new(MemoryStore::new());
        let a = "A".repeat(10_000);
        let b = "B".repeat(10_000);

        let (s1, s2) = (store.clone(), store.clone());
        let (a2, b2) = (a.clone(), b.clone());
        let t1 = tokio::spawn(async move { s1.save(&client("x"), &key("k"), &a2, true).await });
        let t2 = tokio::spawn(async move { s2.save(&client("x"), &key("k"), &b2, true).await });
        t1.await.unwrap().unwrap();
        t2.await.unwrap().unwrap();

        let content = store.load(&client("x"), &key("k")).await.unwrap();
        assert!(content == a || content == b);
        assert_eq!(store.len().await, 1);
    }

    proptest! {
        #[test]
        fn prop_save_load_round_trip(
            key_str in "[a-zA-Z0-9_-]{1,64}",
            content in "\\PC{1,512}",
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = MemoryStore::new();
                let k = key(&key_str);
                store.save(&client("x"), &k, &content, true).await.unwrap();
                let loaded = store.load(&client("x"), &k).await.unwrap();
                prop_assert_eq!(loaded, content.clone());
                Ok(())
            })?;
        }
    }
}
