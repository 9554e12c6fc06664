pub mod manager;
pub mod memory;
pub mod mongo;
pub mod store;

use std::sync::Arc;

use tracing::info;

use crate::config::{DatabaseConfig, StoreBackend};

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use store::{DeleteOutcome, Document, DocumentStore, InsertOutcome, UpdateOutcome};

/// Build the configured store. For MongoDB the connection is established
/// eagerly so that an unreachable server stops startup.
pub async fn connect_store(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Mongo => {
            let manager = Arc::new(DatabaseManager::new(config));
            manager.connect().await?;
            info!("Using MongoDB database: {}", config.name);
            Ok(Arc::new(MongoStore::new(manager, config.name.clone())))
        }
    }
}
