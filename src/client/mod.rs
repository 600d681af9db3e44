pub mod memory;
pub mod sqlite;

pub use memory::MemoryStoreClient;
pub use sqlite::SqliteStoreClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::record::SessionRecord;


/// Backing store for session records.
///
/// Implementations must be safe to call concurrently; the session layer
/// holds no lock of its own around these calls.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Create the sessions table if it does not exist yet.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// `Ok(None)` when no record exists under `id`.
    async fn fetch_by_id(&self, id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Insert or update the record stored under `id` and return what is now
    /// stored. An existing record keeps its `created_on`.
    async fn upsert(&self, id: &str, record: SessionRecord) -> Result<SessionRecord, StoreError>;

    /// Deleting a missing record is not an error.
    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;

    /// Delete every record with `expires_on < now`, returning how many went.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}
