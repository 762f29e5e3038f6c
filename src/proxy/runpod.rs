use axum::{body::Body, extract::Request, response::Response};
use reqwest::header::{CONTENT_TYPE, HeaderValue};

use super::core::{forward_request, read_request_body};
use crate::error::GatewayError;
use crate::service::app_state::SharedState;

/// Forwards `/runpod/<endpointId>[/<route>]` to the runpod queue API. The
/// queue API versions its endpoints under `/v2`.
pub async fn handle_runpod_request(
    state: SharedState,
    endpoint_id: String,
    route: String,
    request: Request<Body>,
) -> Result<Response<Body>, GatewayError> {
    let provider = &state.config.providers.runpod;
    let url = format!(
        "{}/v2/{}/{}",
        provider.base_url.trim_end_matches('/'),
        endpoint_id,
        route
    );

    let auth_header = HeaderValue::from_str(&format!("Bearer {}", provider.api_key))
        .map_err(|_| GatewayError::Internal("runpod api key is not a valid header".to_string()))?;

    let method = request.method().clone();
    let content_type = request.headers().get(CONTENT_TYPE).cloned();
    let body = read_request_body(request).await?;

    forward_request(&state.http, method, url, auth_header, content_type, body).await
}
