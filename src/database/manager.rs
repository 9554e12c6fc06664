use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::filter::FilterError;

/// Errors from the document store and its connection manager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

/// Owns the single, lazily established MongoDB client shared by every resource.
///
/// The first caller of [`connect`](Self::connect) establishes the client while
/// holding the write lock; concurrent callers wait on the lock and then reuse
/// the client instead of racing to open their own.
pub struct DatabaseManager {
    url: String,
    connect_timeout: Duration,
    server_selection_timeout: Duration,
    client: RwLock<Option<Client>>,
}

impl DatabaseManager {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            server_selection_timeout: Duration::from_millis(config.server_selection_timeout_ms),
            client: RwLock::new(None),
        }
    }

    /// Get the existing client or establish one lazily
    pub async fn connect(&self) -> Result<Client, DatabaseError> {
        // Fast path: try read lock
        {
            let client = self.client.read().await;
            if let Some(client) = client.as_ref() {
                return Ok(client.clone());
            }
        }

        let mut slot = self.client.write().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = self.establish().await.inspect_err(|e| {
            warn!(
                "Error connecting to MongoDB. Check that the connection string is correct and that mongo is running: {}",
                e
            );
        })?;
        *slot = Some(client.clone());

        info!("Connected to MongoDB");
        Ok(client)
    }

    async fn establish(&self) -> Result<Client, DatabaseError> {
        let mut options = ClientOptions::parse(self.url.as_str())
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;
        options.connect_timeout = Some(self.connect_timeout);
        options.server_selection_timeout = Some(self.server_selection_timeout);
        options.app_name = Some("fries-rest".to_string());

        let client = Client::with_options(options).map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        // The driver connects lazily; ping so failures surface within the timeout
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(client)
    }

    /// Select a named logical database on the shared client
    pub async fn database(&self, name: &str) -> Result<Database, DatabaseError> {
        Ok(self.connect().await?.database(name))
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Release the client; the next `connect` re-establishes it
    pub async fn close(&self) {
        let client = self.client.write().await.take();
        if let Some(client) = client {
            client.shutdown().await;
            info!("Closed MongoDB connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;

    fn config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            backend: StoreBackend::Mongo,
            url: url.to_string(),
            name: "fries-rest-test".to_string(),
            connect_timeout_ms: 250,
            server_selection_timeout_ms: 250,
        }
    }

    #[test]
    fn timeouts_come_from_config() {
        let manager = DatabaseManager::new(&config("mongodb://localhost:27017"));
        assert_eq!(manager.connect_timeout, Duration::from_millis(250));
        assert_eq!(manager.server_selection_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn malformed_url_fails_without_caching_a_client() {
        let manager = DatabaseManager::new(&config("not-a-mongo-url"));

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConnectionError(_)));
        assert!(!manager.is_connected().await);

        let err = manager.database("fries").await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConnectionError(_)));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let manager = DatabaseManager::new(&config("mongodb://localhost:27017"));
        manager.close().await;
        manager.close().await;
        assert!(!manager.is_connected().await);
    }
}
