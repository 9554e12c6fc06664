use std::sync::Arc;

use axum::{
    response::{IntoResponse, Json, Response},
    http::StatusCode,
};
use tracing::{debug, error};

use super::operations::{RecordOperations, StandardOperations};
use super::{CollectionBinding, RecordId};
use crate::database::{Document, DocumentStore};
use crate::error::ApiError;

/// Successful controller outcome: a message, one record, or a list of records.
/// Always 200; failures are [`ApiError`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerReply {
    Message(String),
    Record(Document),
    Records(Vec<Document>),
}

impl IntoResponse for ControllerReply {
    fn into_response(self) -> Response {
        match self {
            ControllerReply::Message(msg) => (StatusCode::OK, msg).into_response(),
            ControllerReply::Record(record) => (StatusCode::OK, Json(record)).into_response(),
            ControllerReply::Records(records) => (StatusCode::OK, Json(records)).into_response(),
        }
    }
}

/// Request-handling wrapper around a resource's [`RecordOperations`].
///
/// Existence checks and status mapping live here and always go through the
/// currently bound operations, overridden or not. No per-request state is kept.
#[derive(Clone)]
pub struct ResourceController {
    operations: Arc<dyn RecordOperations>,
}

impl ResourceController {
    pub fn new(operations: impl RecordOperations + 'static) -> Self {
        Self {
            operations: Arc::new(operations),
        }
    }

    pub fn standard(binding: CollectionBinding, store: Arc<dyn DocumentStore>) -> Self {
        Self::new(StandardOperations::new(binding, store))
    }

    pub fn binding(&self) -> &CollectionBinding {
        self.operations.binding()
    }

    fn collection(&self) -> &str {
        self.binding().collection()
    }

    fn describe(&self, id: &RecordId) -> String {
        format!("{{{}: {}}}", self.binding().identity_field(), id)
    }

    /// Existence check shared by create, update and delete
    async fn existing(&self, id: &RecordId) -> Result<Option<Document>, ApiError> {
        self.operations.read(id).await.map_err(|e| {
            error!("Existence check for {} in {} failed: {}", self.describe(id), self.collection(), e);
            ApiError::unexpected()
        })
    }

    /// Store the body's identifier in the same typed form reads filter on,
    /// so `"-1"` in a form body becomes `-1`. Bodies that declare a different
    /// identifier are left alone.
    fn normalize_identity(&self, id: &RecordId, body: &mut Document) -> bool {
        let identity_field = self.binding().identity_field();
        match body.get_mut(identity_field) {
            Some(declared) if id.matches(declared) => {
                *declared = id.value().clone();
                true
            }
            _ => false,
        }
    }

    pub async fn create(&self, id: &RecordId, mut body: Document) -> Result<ControllerReply, ApiError> {
        if !self.normalize_identity(id, &mut body) {
            return Err(ApiError::bad_request(
                "Error inserting record: Request ID param and record ID must match",
            ));
        }

        if self.existing(id).await?.is_some() {
            return Err(ApiError::conflict(format!(
                "Cannot create new record for collection \"{}\". Record with ID {} already exists!",
                self.collection(),
                id
            )));
        }

        let outcome = self.operations.create(body).await?;
        match outcome.inserted_id {
            Some(inserted_id) => {
                debug!("Inserted {} into {} as {}", self.describe(id), self.collection(), inserted_id);
                Ok(ControllerReply::Message(format!(
                    "New record created in collection \"{}\"",
                    self.collection()
                )))
            }
            None => Err(ApiError::bad_request(format!(
                "Error inserting new record into collection \"{}\"",
                self.collection()
            ))),
        }
    }

    pub async fn read(&self, id: &RecordId) -> Result<ControllerReply, ApiError> {
        match self.existing(id).await? {
            Some(record) => {
                debug!("Record Found! Retrieved record with ID {} from collection {}", self.describe(id), self.collection());
                Ok(ControllerReply::Record(record))
            }
            None => {
                debug!("Unable to find record with ID {} from collection {}", self.describe(id), self.collection());
                Err(ApiError::not_found(format!(
                    "Record with ID {} from collection \"{}\" not found",
                    self.describe(id),
                    self.collection()
                )))
            }
        }
    }

    pub async fn update(&self, id: &RecordId, mut data: Document) -> Result<ControllerReply, ApiError> {
        self.normalize_identity(id, &mut data);
        if self.existing(id).await?.is_none() {
            let msg = format!(
                "Error updating record. No record found with id {} in collection \"{}\"",
                self.describe(id),
                self.collection()
            );
            debug!("{}", msg);
            return Err(ApiError::not_found(msg));
        }

        let outcome = self.operations.update(id, data).await?;
        if outcome.modified_count < 1 {
            let msg = format!(
                "Error updating record with ID {} from collection \"{}\". No records modified",
                self.describe(id),
                self.collection()
            );
            debug!("{}", msg);
            return Err(ApiError::bad_request(msg));
        }

        let msg = format!(
            "Updated record with ID {} from collection \"{}\"",
            self.describe(id),
            self.collection()
        );
        debug!("{}", msg);
        Ok(ControllerReply::Message(msg))
    }

    pub async fn delete(&self, id: &RecordId) -> Result<ControllerReply, ApiError> {
        if self.existing(id).await?.is_none() {
            let msg = format!(
                "Error deleting record. No record found with id {} in collection \"{}\"",
                self.describe(id),
                self.collection()
            );
            debug!("{}", msg);
            return Err(ApiError::not_found(msg));
        }

        let outcome = self.operations.delete(id).await?;
        if outcome.deleted_count > 0 {
            Ok(ControllerReply::Message(format!(
                "Record with ID {} from collection \"{}\" deleted",
                self.describe(id),
                self.collection()
            )))
        } else {
            // Existence was just confirmed, so this is not a client problem
            error!("Delete of {} in {} removed nothing", self.describe(id), self.collection());
            Err(ApiError::internal_server_error(format!(
                "Unknown error encountered attempting to delete record with ID {} from collection \"{}\"",
                self.describe(id),
                self.collection()
            )))
        }
    }

    pub async fn query(&self, filter: Document, projection: Option<Document>) -> Result<ControllerReply, ApiError> {
        let records = self.operations.query(filter, projection).await?;
        debug!("Query on {} matched {} records", self.collection(), records.len());
        Ok(ControllerReply::Records(records))
    }
}
