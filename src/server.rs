use crate::{
    cache::{CacheBackend, CacheManager},
    config::Config,
    error::AppError,
    items::ContactService,
    oauth::OAuthFlows,
    routes::create_hubspot_routes,
};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    pub cache: Arc<CacheBackend>,
    pub oauth_flows: Arc<OAuthFlows>,
    pub contact_service: Arc<ContactService>,
}

impl Server {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let cache = Arc::new(CacheManager::new_from_config(&config.cache).await?);
        Ok(Self::build(config, cache))
    }

    /// Server backed by an in-memory cache, for tests and single-instance use
    pub fn with_memory_cache(config: Config) -> Self {
        Self::build(config, Arc::new(CacheManager::new_memory()))
    }

    fn build(config: Config, cache: Arc<CacheBackend>) -> Self {
        let oauth_flows = Arc::new(OAuthFlows::new(config.oauth.clone(), cache.clone()));
        let contact_service = Arc::new(ContactService::new(config.oauth.clone()));

        Self {
            config: Arc::new(config),
            cache,
            oauth_flows,
            contact_service,
        }
    }

    pub fn create_app(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .nest("/integrations/hubspot", create_hubspot_routes())
            .with_state(self.clone())
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let app = self.create_app();

        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid listen address: {}", e)))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind to address: {}", e)))?;

        info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "hubspot-connector",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
