use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::store::{DeleteOutcome, Document, DocumentStore, InsertOutcome, UpdateOutcome};
use crate::filter::{json_eq, FilterWhere, Projection};

/// In-process [`DocumentStore`] for local runs and tests.
///
/// Every data operation bumps a call counter so tests can assert that a
/// request never reached the store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of data operations issued so far (ping excluded)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    /// Raw contents of a collection, bypassing the call counter
    pub async fn snapshot(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<InsertOutcome, DatabaseError> {
        self.record_call();

        let id = document
            .entry("_id")
            .or_insert_with(|| Value::String(ObjectId::new().to_hex()))
            .clone();

        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();
        if records.iter().any(|r| r.get("_id").is_some_and(|existing| json_eq(existing, &id))) {
            return Err(DatabaseError::QueryError(format!(
                "duplicate key in collection {}: _id {}",
                collection, id
            )));
        }
        records.push(document);

        Ok(InsertOutcome { inserted_id: Some(id) })
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, DatabaseError> {
        self.record_call();
        let filter = FilterWhere::parse(&filter)?;

        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.iter().find(|r| filter.matches(r)).cloned()))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> Result<UpdateOutcome, DatabaseError> {
        self.record_call();
        let filter = FilterWhere::parse(&filter)?;

        let mut collections = self.collections.write().await;
        let Some(record) = collections
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| filter.matches(r)))
        else {
            return Ok(UpdateOutcome { matched_count: 0, modified_count: 0 });
        };

        // Writing identical values is not a modification
        let mut changed = false;
        for (field, value) in set {
            if !record.get(&field).is_some_and(|current| json_eq(current, &value)) {
                record.insert(field, value);
                changed = true;
            }
        }

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(changed),
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<DeleteOutcome, DatabaseError> {
        self.record_call();
        let filter = FilterWhere::parse(&filter)?;

        let mut collections = self.collections.write().await;
        let removed = match collections.get_mut(collection) {
            Some(records) => match records.iter().position(|r| filter.matches(r)) {
                Some(index) => {
                    records.remove(index);
                    1
                }
                None => 0,
            },
            None => 0,
        };

        Ok(DeleteOutcome { deleted_count: removed })
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Vec<Document>, DatabaseError> {
        self.record_call();
        let filter = FilterWhere::parse(&filter)?;
        let projection = projection.as_ref().map(Projection::parse).transpose()?;

        let collections = self.collections.read().await;
        let records = collections.get(collection).map(Vec::as_slice).unwrap_or_default();
        Ok(records
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| match &projection {
                Some(projection) => projection.apply(r),
                None => r.clone(),
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
