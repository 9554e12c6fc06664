use std::sync::Arc;

use async_trait::async_trait;

use super::{CollectionBinding, RecordId};
use crate::database::{DatabaseError, DeleteOutcome, Document, DocumentStore, InsertOutcome, UpdateOutcome};

/// The five record operations a controller delegates to.
///
/// Every method has a default implementation against [`binding`](Self::binding)
/// and [`store`](Self::store); a resource overrides only the ones it needs.
#[async_trait]
pub trait RecordOperations: Send + Sync {
    fn binding(&self) -> &CollectionBinding;

    fn store(&self) -> &dyn DocumentStore;

    async fn create(&self, record: Document) -> Result<InsertOutcome, DatabaseError> {
        self.store().insert_one(self.binding().collection(), record).await
    }

    async fn read(&self, id: &RecordId) -> Result<Option<Document>, DatabaseError> {
        let filter = self.binding().filter_for(id.value());
        self.store().find_one(self.binding().collection(), filter).await
    }

    /// Partial merge of `data` into the record; never upserts
    async fn update(&self, id: &RecordId, data: Document) -> Result<UpdateOutcome, DatabaseError> {
        let filter = self.binding().filter_for(id.value());
        self.store().update_one(self.binding().collection(), filter, data).await
    }

    async fn delete(&self, id: &RecordId) -> Result<DeleteOutcome, DatabaseError> {
        let filter = self.binding().filter_for(id.value());
        self.store().delete_one(self.binding().collection(), filter).await
    }

    async fn query(&self, filter: Document, projection: Option<Document>) -> Result<Vec<Document>, DatabaseError> {
        self.store().find(self.binding().collection(), filter, projection).await
    }
}

/// Default operations with no overrides
pub struct StandardOperations {
    binding: CollectionBinding,
    store: Arc<dyn DocumentStore>,
}

impl StandardOperations {
    pub fn new(binding: CollectionBinding, store: Arc<dyn DocumentStore>) -> Self {
        Self { binding, store }
    }
}

#[async_trait]
impl RecordOperations for StandardOperations {
    fn binding(&self) -> &CollectionBinding {
        &self.binding
    }

    fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}
