use async_trait::async_trait;
use serde_json::{Map, Value};

use super::manager::DatabaseError;

/// A record as exchanged with the store: an untyped JSON object
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    /// Identifier assigned by the store; `None` means nothing was inserted
    pub inserted_id: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

/// The document database behind every resource.
///
/// Filters and projections use MongoDB's query document syntax.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_one(&self, collection: &str, document: Document) -> Result<InsertOutcome, DatabaseError>;

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, DatabaseError>;

    /// Merge `set` into the first matching document; never upserts
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> Result<UpdateOutcome, DatabaseError>;

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<DeleteOutcome, DatabaseError>;

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Vec<Document>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;

    async fn close(&self) {}
}
