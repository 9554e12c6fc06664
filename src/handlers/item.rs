use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::Value;

use super::resource::{self, IdentityKind, Resource, ResourceDefinition};
use crate::controller::{CollectionBinding, RecordId, RecordOperations, StandardOperations};
use crate::database::{DatabaseError, DeleteOutcome, Document, DocumentStore, InsertOutcome, UpdateOutcome};
use crate::middleware::AuthGate;

pub const ITEM: ResourceDefinition = ResourceDefinition {
    path: "/item",
    label: "Item",
    collection: "items",
    identity_field: "itemId",
    identity: IdentityKind::Numeric,
    supports_query: true,
};

/// Item ids arrive as numbers in the path but are stored as strings, so every
/// single-record operation works on the string form. Query is unchanged.
pub struct ItemOperations {
    inner: StandardOperations,
}

impl ItemOperations {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner: StandardOperations::new(ITEM.binding(), store),
        }
    }

    /// A numeric `itemId` in a record or patch becomes its string form
    fn stringify_identity(&self, record: &mut Document) {
        if let Some(declared) = record.get_mut(self.binding().identity_field()) {
            if let Value::Number(n) = declared {
                let text = n.as_i64().map(|i| i.to_string()).unwrap_or_else(|| n.to_string());
                *declared = Value::String(text);
            }
        }
    }
}

#[async_trait]
impl RecordOperations for ItemOperations {
    fn binding(&self) -> &CollectionBinding {
        self.inner.binding()
    }

    fn store(&self) -> &dyn DocumentStore {
        self.inner.store()
    }

    async fn create(&self, mut record: Document) -> Result<InsertOutcome, DatabaseError> {
        self.stringify_identity(&mut record);
        self.inner.create(record).await
    }

    async fn read(&self, id: &RecordId) -> Result<Option<Document>, DatabaseError> {
        self.inner.read(&id.to_text()).await
    }

    async fn update(&self, id: &RecordId, mut data: Document) -> Result<UpdateOutcome, DatabaseError> {
        self.stringify_identity(&mut data);
        self.inner.update(&id.to_text(), data).await
    }

    async fn delete(&self, id: &RecordId) -> Result<DeleteOutcome, DatabaseError> {
        self.inner.delete(&id.to_text()).await
    }
}

pub fn router(store: Arc<dyn DocumentStore>, gate: AuthGate) -> Router {
    resource::router(Resource::with_operations(ITEM, ItemOperations::new(store)), gate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ResourceController;
    use crate::database::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn numeric_ids_are_stored_as_strings() {
        let store = Arc::new(MemoryStore::new());
        let controller = ResourceController::new(ItemOperations::new(store.clone()));
        let id = RecordId::numeric("1001").unwrap();

        let body = json!({"itemId": 1001, "name": "Rusty Sword"}).as_object().cloned().unwrap();
        controller.create(&id, body).await.unwrap();

        let stored = store.snapshot("items").await;
        assert_eq!(stored[0].get("itemId"), Some(&json!("1001")));

        controller.read(&id).await.unwrap();
        let patch = json!({"name": "Sharp Sword"}).as_object().cloned().unwrap();
        controller.update(&id, patch).await.unwrap();
        controller.delete(&id).await.unwrap();
        assert!(store.snapshot("items").await.is_empty());
    }

    #[tokio::test]
    async fn numeric_ids_in_patches_stay_strings() {
        let store = Arc::new(MemoryStore::new());
        let controller = ResourceController::new(ItemOperations::new(store.clone()));
        let id = RecordId::numeric("1001").unwrap();

        controller
            .create(&id, json!({"itemId": 1001}).as_object().cloned().unwrap())
            .await
            .unwrap();
        controller
            .update(&id, json!({"itemId": 1001, "name": "Axe"}).as_object().cloned().unwrap())
            .await
            .unwrap();

        assert_eq!(store.snapshot("items").await[0].get("itemId"), Some(&json!("1001")));
        controller.read(&id).await.unwrap();
    }

    #[tokio::test]
    async fn query_is_not_coerced() {
        let store = Arc::new(MemoryStore::new());
        let id = RecordId::numeric("7").unwrap();
        let controller = ResourceController::new(ItemOperations::new(store.clone()));
        controller
            .create(&id, json!({"itemId": "7", "rarity": 3}).as_object().cloned().unwrap())
            .await
            .unwrap();

        let filter = json!({"rarity": {"$gte": 2}}).as_object().cloned().unwrap();
        let found = ItemOperations::new(store).query(filter, None).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
