use std::sync::Arc;

use axum::Router;

use super::resource::{self, IdentityKind, Resource, ResourceDefinition};
use crate::database::DocumentStore;
use crate::middleware::AuthGate;

pub const MONSTER: ResourceDefinition = ResourceDefinition {
    path: "/monster",
    label: "Monster",
    collection: "monsters",
    identity_field: "monsterId",
    identity: IdentityKind::Numeric,
    supports_query: true,
};

pub fn router(store: Arc<dyn DocumentStore>, gate: AuthGate) -> Router {
    resource::router(Resource::standard(MONSTER, store), gate)
}
