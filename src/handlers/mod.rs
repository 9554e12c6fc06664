pub mod armor;
pub mod item;
pub mod monster;
pub mod player;
pub mod resource;
pub mod validate;
pub mod weapon;

use std::sync::Arc;

use axum::Router;

use crate::database::DocumentStore;
use crate::middleware::AuthGate;

pub use resource::{IdentityKind, Resource, ResourceDefinition};
pub use validate::{QueryRequest, RequestValidator};

/// All resource routers, sharing one store and one authentication mode
pub fn routes(store: Arc<dyn DocumentStore>, gate: AuthGate) -> Router {
    Router::new()
        .merge(player::router(store.clone(), gate.clone()))
        .merge(item::router(store.clone(), gate.clone()))
        .merge(armor::router(store.clone(), gate.clone()))
        .merge(weapon::router(store.clone(), gate.clone()))
        .merge(monster::router(store, gate))
}
