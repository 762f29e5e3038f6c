use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    middleware,
    response::Response,
    routing::{any, get},
};
use serde_json::json;
use tracing::debug;

use super::dispatch::RouteDecision;
use super::fal::handle_fal_request;
use super::runpod::handle_runpod_request;
use crate::error::GatewayError;
use crate::service::app_state::{SharedState, StateRouter, create_state_router};
use crate::utils::cors::inference_cors;

async fn handle_inference_request(
    State(state): State<SharedState>,
    request: Request<Body>,
) -> Result<Response<Body>, GatewayError> {
    let path = request.uri().path().to_string();
    debug!("{} ---", &path);

    match RouteDecision::resolve(&path) {
        RouteDecision::Fal { rest } => handle_fal_request(state, rest, request).await,
        RouteDecision::Runpod { endpoint_id, route } => {
            handle_runpod_request(state, endpoint_id, route, request).await
        }
        RouteDecision::NotFound => Err(GatewayError::NotFound("Service not found".to_string())),
    }
}

pub fn create_proxy_router() -> StateRouter {
    create_state_router()
        .route("/healthz", get(|| async { Json(json!({ "status": "ok" })) }))
        .route("/", any(handle_inference_request))
        .route("/{*path}", any(handle_inference_request))
        .layer(middleware::from_fn(inference_cors))
}
