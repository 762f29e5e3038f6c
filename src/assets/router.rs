use axum::{
    body::Body,
    extract::{Path, Request, State},
    middleware,
    routing::any,
};

use super::handlers::handle_assets_request;
use crate::service::app_state::{SharedState, StateRouter, create_state_router};
use crate::utils::cors::assets_cors;

pub fn create_assets_router() -> StateRouter {
    create_state_router()
        .route(
            "/",
            any(
                |State(state): State<SharedState>, request: Request<Body>| async move {
                    handle_assets_request(state, String::new(), request).await
                },
            ),
        )
        .route(
            "/{*key}",
            any(
                |State(state): State<SharedState>,
                 Path(key): Path<String>,
                 request: Request<Body>| async move {
                    handle_assets_request(state, key, request).await
                },
            ),
        )
        .layer(middleware::from_fn(assets_cors))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use bytes::Bytes;
    use serde_json::{Value, json};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use super::create_assets_router;
    use crate::config::GatewayConfig;
    use crate::service::app_state::{AppState, build_http_client};
    use crate::service::storage::Storage;
    use crate::service::storage::local::LocalStorage;
    use crate::service::storage::types::{
        PutObjectOptions, StorageError, StorageResult, StoredObject,
    };

    // Records calls instead of storing anything; proves the 400 paths never
    // reach the store.
    #[derive(Default)]
    struct SpyStorage {
        puts: AtomicUsize,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl Storage for SpyStorage {
        async fn put_object(
            &self,
            _key: &str,
            _data: Bytes,
            _options: PutObjectOptions<'_>,
        ) -> StorageResult<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get_object(&self, _key: &str) -> StorageResult<StoredObject> {
            Err(StorageError::NotFound)
        }

        async fn delete_object(&self, _key: &str) -> StorageResult<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn state_with(storage: Arc<dyn Storage>) -> Arc<AppState> {
        let mut config = GatewayConfig::default();
        config.assets.public_base_url = "https://assets.example.com".to_string();
        Arc::new(AppState {
            http: build_http_client(None),
            config,
            storage,
        })
    }

    fn app(state: Arc<AppState>) -> axum::Router {
        create_assets_router().with_state(state)
    }

    async fn body_json_of(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_cors(response: &axum::response::Response) {
        let headers = response.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(
            headers.get("access-control-allow-headers").unwrap(),
            "Content-Type, Authorization, X-File-Name, X-File-Type"
        );
    }

    #[tokio::test]
    async fn preflight_needs_no_bearer() {
        let app = app(state_with(Arc::new(SpyStorage::default())));

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/images/cat.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn missing_bearer_is_401_with_cors() {
        let app = app(state_with(Arc::new(SpyStorage::default())));

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/images/cat.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_cors(&response);
        let body = body_json_of(response).await;
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn upload_without_file_name_never_touches_storage() {
        let spy = Arc::new(SpyStorage::default());
        let app = app(state_with(spy.clone()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/images")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .body(Body::from("bytes"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_cors(&response);
        let body = body_json_of(response).await;
        assert_eq!(body, json!({ "error": "X-File-Name header is required" }));
        assert_eq!(spy.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upload_get_delete_round_trip() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path().to_str().unwrap()));
        let state = state_with(storage);
        let payload = b"\x89PNG fake image bytes".to_vec();

        let response = app(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/images/cat.png")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .header("X-File-Name", "cat.png")
                    .header(header::CONTENT_TYPE, "image/png")
                    .body(Body::from(payload.clone()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json_of(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["fileName"], "cat.png");
        assert_eq!(body["path"], "images/cat.png");
        assert_eq!(body["url"], "https://assets.example.com/images/cat.png");
        assert_eq!(body["size"], payload.len());

        let response = app(state.clone())
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/images/cat.png")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
        assert!(response.headers().get(header::ETAG).is_some());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes.as_ref(), payload.as_slice());

        let response = app(state.clone())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/images/cat.png")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json_of(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "File images/cat.png successfully deleted");

        let response = app(state)
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/images/cat.png")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_cors(&response);
        let body = body_json_of(response).await;
        assert_eq!(body, json!({ "error": "File not found" }));
    }

    #[tokio::test]
    async fn delete_missing_key_is_success() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path().to_str().unwrap()));
        let app = app(state_with(storage));

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/never-uploaded.png")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json_of(response).await;
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn get_without_path_is_400() {
        let app = app(state_with(Arc::new(SpyStorage::default())));

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json_of(response).await;
        assert_eq!(body, json!({ "error": "Path is required" }));
    }

    #[tokio::test]
    async fn unsupported_method_is_405() {
        let app = app(state_with(Arc::new(SpyStorage::default())));

        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/images/cat.png")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_cors(&response);
        let body = body_json_of(response).await;
        assert_eq!(body, json!({ "error": "Method not allowed" }));
    }

    #[tokio::test]
    async fn upload_to_root_uses_bare_file_name() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path().to_str().unwrap()));
        let app = app(state_with(storage));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::AUTHORIZATION, "Bearer token")
                    .header("X-File-Name", "readme.txt")
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from("hello"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json_of(response).await;
        assert_eq!(body["path"], "readme.txt");
        assert_eq!(body["size"], 5);
    }
}
