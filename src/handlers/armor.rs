use std::sync::Arc;

use axum::Router;

use super::resource::{self, IdentityKind, Resource, ResourceDefinition};
use crate::database::DocumentStore;
use crate::middleware::AuthGate;

pub const ARMOR: ResourceDefinition = ResourceDefinition {
    path: "/armor",
    label: "Armor",
    collection: "armor",
    identity_field: "armorId",
    identity: IdentityKind::Numeric,
    supports_query: true,
};

pub fn router(store: Arc<dyn DocumentStore>, gate: AuthGate) -> Router {
    resource::router(Resource::standard(ARMOR, store), gate)
}
