use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::GatewayConfig;
use crate::service::app_state::{StateRouter, create_app_state, create_state_router};

mod assets;
mod config;
mod error;
mod proxy;
mod service;
mod utils;

fn create_app_router() -> StateRouter {
    create_state_router()
        .nest("/assets", assets::create_assets_router())
        .merge(proxy::create_proxy_router())
}

#[tokio::main]
async fn main() {
    let config = GatewayConfig::load();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let addr = format!("{}:{}", &config.host, config.port);
    info!("gateway start at {}", &addr);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    let app_state = create_app_state(config).await;
    axum::serve(
        listener,
        create_app_router().with_state(app_state).into_make_service(),
    )
    .await
    .expect("failed to start server");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use tempfile::tempdir;
    use tower::ServiceExt;

    use super::create_app_router;
    use crate::config::GatewayConfig;
    use crate::service::app_state::{AppState, build_http_client};
    use crate::service::storage::local::LocalStorage;

    fn test_state(dir: &tempfile::TempDir) -> Arc<AppState> {
        let config = GatewayConfig::default();
        let storage = Arc::new(LocalStorage::new(dir.path().to_str().unwrap()));
        Arc::new(AppState {
            http: build_http_client(config.upstream.timeout_secs),
            config,
            storage,
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn asset_routes_are_not_treated_as_providers() {
        let dir = tempdir().unwrap();
        let app = create_app_router().with_state(test_state(&dir));

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/assets/images/cat.png")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Hits the asset gateway (404 for a missing object), not the
        // inference dispatcher's "Service not found".
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "File not found");
    }

    #[tokio::test]
    async fn unknown_provider_is_service_not_found() {
        let dir = tempdir().unwrap();
        let app = create_app_router().with_state(test_state(&dir));

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/openai/chat/completions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Service not found");
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let dir = tempdir().unwrap();
        let app = create_app_router().with_state(test_state(&dir));

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }
}
