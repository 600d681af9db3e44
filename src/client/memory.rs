use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::StoreClient;
use crate::errors::StoreError;
use crate::record::SessionRecord;

/// In-process store client. Records are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStoreClient {
    records: Mutex<HashMap<String, SessionRecord>>,
}

impl MemoryStoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, SessionRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }
}

#[async_trait]
impl StoreClient for MemoryStoreClient {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn upsert(&self, id: &str, mut record: SessionRecord) -> Result<SessionRecord, StoreError> {
        let mut records = self.lock()?;
        record.id = id.to_string();
        if let Some(existing) = records.get(id) {
            record.created_on = existing.created_on;
            record.expires_on = record.expires_on.max(existing.expires_on);
        }
        records.insert(id.to_string(), record.clone());
        Ok(record)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        self.lock()?.remove(id);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|_, r| r.expires_on >= now);
        Ok(before - records.len())
    }
}
