use std::sync::Arc;

use axum::Router;

use super::resource::{self, IdentityKind, Resource, ResourceDefinition};
use crate::database::DocumentStore;
use crate::middleware::AuthGate;

/// Players are addressed by `userId` and have no query endpoint
pub const PLAYER: ResourceDefinition = ResourceDefinition {
    path: "/player",
    label: "Player",
    collection: "players",
    identity_field: "userId",
    identity: IdentityKind::Numeric,
    supports_query: false,
};

pub fn router(store: Arc<dyn DocumentStore>, gate: AuthGate) -> Router {
    resource::router(Resource::standard(PLAYER, store), gate)
}
