use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson};
use mongodb::Collection;
use serde_json::Value;

use super::manager::{DatabaseError, DatabaseManager};
use super::store::{DeleteOutcome, Document, DocumentStore, InsertOutcome, UpdateOutcome};

/// [`DocumentStore`] backed by MongoDB through the shared [`DatabaseManager`]
pub struct MongoStore {
    manager: Arc<DatabaseManager>,
    database: String,
}

impl MongoStore {
    pub fn new(manager: Arc<DatabaseManager>, database: impl Into<String>) -> Self {
        Self {
            manager,
            database: database.into(),
        }
    }

    async fn collection(&self, name: &str) -> Result<Collection<bson::Document>, DatabaseError> {
        Ok(self.manager.database(&self.database).await?.collection(name))
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_one(&self, collection: &str, document: Document) -> Result<InsertOutcome, DatabaseError> {
        let result = self.collection(collection).await?.insert_one(to_bson(&document)?).await?;
        let inserted_id = match to_json(result.inserted_id) {
            Value::Null => None,
            id => Some(id),
        };
        Ok(InsertOutcome { inserted_id })
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, DatabaseError> {
        let found = self.collection(collection).await?.find_one(to_bson(&filter)?).await?;
        Ok(found.map(document_to_json))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> Result<UpdateOutcome, DatabaseError> {
        let result = self
            .collection(collection)
            .await?
            .update_one(to_bson(&filter)?, doc! { "$set": to_bson(&set)? })
            .upsert(false)
            .await?;
        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<DeleteOutcome, DatabaseError> {
        let result = self.collection(collection).await?.delete_one(to_bson(&filter)?).await?;
        Ok(DeleteOutcome {
            deleted_count: result.deleted_count,
        })
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Vec<Document>, DatabaseError> {
        let collection = self.collection(collection).await?;
        let mut find = collection.find(to_bson(&filter)?);
        if let Some(projection) = projection {
            find = find.projection(to_bson(&projection)?);
        }

        let records: Vec<bson::Document> = find.await?.try_collect().await?;
        Ok(records.into_iter().map(document_to_json).collect())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.manager
            .database(&self.database)
            .await?
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn close(&self) {
        self.manager.close().await;
    }
}

fn to_bson(document: &Document) -> Result<bson::Document, DatabaseError> {
    bson::to_document(document).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn document_to_json(document: bson::Document) -> Document {
    document.into_iter().map(|(k, v)| (k, to_json(v))).collect()
}

/// Relaxed extended JSON, except that ObjectIds and dates render the way
/// JSON clients expect them: a hex string and an RFC 3339 timestamp
fn to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Bson::DateTime(dt).into_relaxed_extjson(),
        },
        Bson::Document(doc) => Value::Object(document_to_json(doc)),
        Bson::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}
