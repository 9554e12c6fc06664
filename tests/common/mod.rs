#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use fries_rest::auth::{generate_jwt, Claims};
use fries_rest::database::MemoryStore;
use fries_rest::middleware::AuthGate;
use fries_rest::server::{app, ApiServer};

pub const SECRET: &str = "integration-test-secret";
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// An in-process server backed by a fresh in-memory store
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
    server: ApiServer,
}

impl TestServer {
    /// Authentication enabled with [`SECRET`]
    pub async fn start() -> Result<Self> {
        Self::spawn(AuthGate::enabled(SECRET, MAX_BODY_BYTES)?).await
    }

    pub async fn start_without_auth() -> Result<Self> {
        Self::spawn(AuthGate::disabled()).await
    }

    async fn spawn(gate: AuthGate) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let store = Arc::new(MemoryStore::new());

        let server = ApiServer::start(app(store.clone(), gate, MAX_BODY_BYTES), &format!("127.0.0.1:{}", port)).await?;

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            client: reqwest::Client::new(),
            server,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn stop(mut self) -> Result<()> {
        self.server.stop().await
    }
}

pub fn token() -> String {
    generate_jwt(&Claims::new("integration", 1), SECRET).expect("failed to mint test token")
}
