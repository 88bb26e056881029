//! Table store seam
//!
//! The table store is a managed schema-light row store queried by partition
//! scans. Entities cross this seam as raw JSON objects; the relays republish
//! them untouched, and only the ingestion path interprets them.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Continuation token for a segmented scan
///
/// Returned when a query stopped at a page boundary; passing it back resumes
/// the scan at the next row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    /// Partition key to resume from
    pub next_partition_key: String,

    /// Row key to resume from, when the boundary fell inside a partition
    pub next_row_key: Option<String>,
}

/// One page of scan results
#[derive(Debug, Clone, Default)]
pub struct EntitySegment {
    /// Entities in this page, in storage order
    pub entities: Vec<Value>,

    /// Set when more pages remain
    pub continuation: Option<Continuation>,
}

/// Client handle for the managed table store
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Fetch one page of an unfiltered table scan
    async fn query_segment(
        &self,
        table: &str,
        continuation: Option<&Continuation>,
    ) -> Result<EntitySegment>;

    /// Point-read a single entity; `None` when the row does not exist
    async fn get_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<Value>>;

    /// Insert a new entity; fails if the row already exists
    async fn insert_entity(&self, table: &str, entity: &Value) -> Result<()>;

    /// Merge into an existing entity, guarded by its etag
    ///
    /// Returns [`crate::Error::StorageConflict`] when the stored etag no
    /// longer matches (a concurrent writer updated the row first).
    async fn merge_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        etag: &str,
        entity: &Value,
    ) -> Result<()>;
}

/// Etag of a stored entity, when present
pub fn entity_etag(entity: &Value) -> Option<&str> {
    entity.get("odata.etag").and_then(Value::as_str)
}
