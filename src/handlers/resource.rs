use std::sync::Arc;

use axum::{
    extract::{Path, State},
    middleware,
    routing::{any, get, post, MethodRouter},
    Router,
};

use super::validate::{QueryRequest, RequestValidator};
use crate::api::RequestBody;
use crate::controller::{CollectionBinding, ControllerReply, RecordOperations, ResourceController};
use crate::database::DocumentStore;
use crate::error::ApiError;
use crate::middleware::{require_auth, AuthGate};

/// How a resource's path identifier is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    Numeric,
    Text,
}

/// Static description of one HTTP resource
#[derive(Debug, Clone, Copy)]
pub struct ResourceDefinition {
    /// Mount path, e.g. `/player`
    pub path: &'static str,
    /// Name used in validation messages
    pub label: &'static str,
    pub collection: &'static str,
    pub identity_field: &'static str,
    pub identity: IdentityKind,
    pub supports_query: bool,
}

impl ResourceDefinition {
    pub fn binding(&self) -> CollectionBinding {
        CollectionBinding::new(self.collection, self.identity_field)
    }
}

/// A resource's validator and controller, shared by all of its routes
pub struct Resource {
    definition: ResourceDefinition,
    validator: RequestValidator,
    controller: ResourceController,
}

impl Resource {
    pub fn standard(definition: ResourceDefinition, store: Arc<dyn DocumentStore>) -> Self {
        Self::with_controller(definition, ResourceController::standard(definition.binding(), store))
    }

    pub fn with_operations(definition: ResourceDefinition, operations: impl RecordOperations + 'static) -> Self {
        Self::with_controller(definition, ResourceController::new(operations))
    }

    fn with_controller(definition: ResourceDefinition, controller: ResourceController) -> Self {
        Self {
            validator: RequestValidator::new(definition.label, definition.identity),
            definition,
            controller,
        }
    }
}

/// Routes for one resource:
///
/// - `POST|GET|PUT|DELETE <path>/:id` behind the authentication gate
/// - `GET <path>/` for query (authenticated) where supported
/// - every other collection-level verb answers 400
pub fn router(resource: Resource, gate: AuthGate) -> Router {
    let path = resource.definition.path;
    let supports_query = resource.definition.supports_query;

    let auth = middleware::from_fn_with_state(gate, require_auth);

    let record = post(create)
        .get(read)
        .put(update)
        .delete(delete)
        .route_layer(auth.clone());

    let collection: MethodRouter<Arc<Resource>> = if supports_query {
        get(query)
            .route_layer(auth)
            .post(invalid_action)
            .put(invalid_action)
            .delete(invalid_action)
    } else {
        any(invalid_action)
    };

    Router::new()
        .route(&format!("{}/:id", path), record)
        .route(path, collection.clone())
        .route(&format!("{}/", path), collection)
        .with_state(Arc::new(resource))
}

async fn create(
    State(resource): State<Arc<Resource>>,
    Path(id): Path<String>,
    RequestBody(body): RequestBody,
) -> Result<ControllerReply, ApiError> {
    let id = resource.validator.record_id(&id)?;
    resource.validator.require_body("POST", &body)?;
    resource.controller.create(&id, body).await
}

async fn read(State(resource): State<Arc<Resource>>, Path(id): Path<String>) -> Result<ControllerReply, ApiError> {
    let id = resource.validator.record_id(&id)?;
    resource.controller.read(&id).await
}

async fn update(
    State(resource): State<Arc<Resource>>,
    Path(id): Path<String>,
    RequestBody(body): RequestBody,
) -> Result<ControllerReply, ApiError> {
    let id = resource.validator.record_id(&id)?;
    resource.validator.require_body("PUT", &body)?;
    resource.controller.update(&id, body).await
}

async fn delete(State(resource): State<Arc<Resource>>, Path(id): Path<String>) -> Result<ControllerReply, ApiError> {
    let id = resource.validator.record_id(&id)?;
    resource.controller.delete(&id).await
}

async fn query(
    State(resource): State<Arc<Resource>>,
    RequestBody(body): RequestBody,
) -> Result<ControllerReply, ApiError> {
    let QueryRequest { filter, projection } = resource.validator.query_request(body)?;
    resource.controller.query(filter, projection).await
}

async fn invalid_action() -> ApiError {
    ApiError::bad_request("This action is not available at this endpoint")
}
