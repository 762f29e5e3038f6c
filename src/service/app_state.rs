use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use crate::config::GatewayConfig;
use crate::service::storage::{Storage, build_storage};

/// Immutable per-process state shared by both gateways. Constructed once at
/// startup; request handlers never touch the environment.
pub struct AppState {
    pub config: GatewayConfig,
    pub http: reqwest::Client,
    pub storage: Arc<dyn Storage>,
}

pub type SharedState = Arc<AppState>;

pub type StateRouter = Router<SharedState>;

pub fn create_state_router() -> StateRouter {
    Router::new()
}

/// One client for all upstream calls. Without a configured timeout the call
/// has no deadline; bounding latency is then the caller's concern.
pub fn build_http_client(timeout_secs: Option<u64>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().expect("failed to build HTTP client")
}

pub async fn create_app_state(config: GatewayConfig) -> SharedState {
    let storage = build_storage(&config.storage)
        .await
        .expect("failed to initialize storage");
    let http = build_http_client(config.upstream.timeout_secs);
    Arc::new(AppState {
        config,
        http,
        storage,
    })
}
