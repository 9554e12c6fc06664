use std::sync::Arc;

use axum::Router;

use super::resource::{self, IdentityKind, Resource, ResourceDefinition};
use crate::database::DocumentStore;
use crate::middleware::AuthGate;

pub const WEAPON: ResourceDefinition = ResourceDefinition {
    path: "/weapon",
    label: "Weapon",
    collection: "weapons",
    identity_field: "weaponId",
    identity: IdentityKind::Numeric,
    supports_query: true,
};

pub fn router(store: Arc<dyn DocumentStore>, gate: AuthGate) -> Router {
    resource::router(Resource::standard(WEAPON, store), gate)
}
