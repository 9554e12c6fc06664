use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{extract::{DefaultBodyLimit, State}, routing::get, Router};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::database::DocumentStore;
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::AuthGate;

/// The full HTTP application: liveness, health and every resource router.
/// Request bodies over `max_body_bytes` are rejected with 413 whether or not
/// authentication is enabled.
pub fn app(store: Arc<dyn DocumentStore>, gate: AuthGate, max_body_bytes: usize) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health))
        .with_state(store.clone());

    Router::new()
        .route("/", get(root))
        .merge(health_routes)
        .merge(handlers::routes(store, gate))
        // Global middleware
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn root() -> &'static str {
    "API is here and listening!"
}

async fn health(State(store): State<Arc<dyn DocumentStore>>) -> Result<&'static str, ApiError> {
    store.ping().await.map_err(|e| {
        error!("Health check failed: {}", e);
        ApiError::service_unavailable("store unavailable")
    })?;
    Ok("ok")
}

/// A running HTTP listener. Serving happens on a background task until
/// [`stop`](ApiServer::stop) is called.
pub struct ApiServer {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl ApiServer {
    pub async fn start(app: Router, addr: &str) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        let local_addr = listener.local_addr()?;

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await
        });

        info!("Server listening on http://{}", local_addr);
        Ok(Self {
            local_addr,
            shutdown: Some(shutdown),
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    /// Stopping a stopped server does nothing.
    pub async fn stop(&mut self) -> anyhow::Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.context("server task panicked")??;
            info!("Server on {} stopped", self.local_addr);
        }
        Ok(())
    }
}
