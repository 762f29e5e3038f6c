use axum::{body::Body, extract::Request, response::Response};
use reqwest::header::{CONTENT_TYPE, HeaderValue};

use super::core::{forward_request, read_request_body};
use crate::error::GatewayError;
use crate::service::app_state::SharedState;

/// Forwards `/fal/<rest>` to the fal API with the provider key injected.
pub async fn handle_fal_request(
    state: SharedState,
    rest: String,
    request: Request<Body>,
) -> Result<Response<Body>, GatewayError> {
    let provider = &state.config.providers.fal;
    let url = format!("{}/{}", provider.base_url.trim_end_matches('/'), rest);

    let auth_header = HeaderValue::from_str(&format!("Key {}", provider.api_key))
        .map_err(|_| GatewayError::Internal("fal api key is not a valid header".to_string()))?;

    let method = request.method().clone();
    let content_type = request.headers().get(CONTENT_TYPE).cloned();
    let body = read_request_body(request).await?;

    forward_request(&state.http, method, url, auth_header, content_type, body).await
}
