use axum::{body::Body, extract::Request, response::Response};
use bytes::Bytes;
use reqwest::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue},
};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::GatewayError;

// Reads the full request body into memory; inference payloads are buffered,
// not streamed.
pub(super) async fn read_request_body(request: Request<Body>) -> Result<Bytes, GatewayError> {
    axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| GatewayError::BadRequest(format!("Failed to read body: {}", e)))
}

/// Sends a single-attempt request upstream and relays the JSON answer.
///
/// The upstream status is passed through verbatim, non-2xx included. A
/// network failure or a body that does not decode as JSON surfaces as a 500
/// envelope with the raw error message. Nothing is retried and nothing is
/// masked.
pub(super) async fn forward_request(
    client: &reqwest::Client,
    method: Method,
    url: String,
    auth_header: HeaderValue,
    content_type: Option<HeaderValue>,
    body: Bytes,
) -> Result<Response<Body>, GatewayError> {
    debug!("[forward_request] {} {}", method, &url);

    let mut upstream_request = client
        .request(method.clone(), &url)
        .header(AUTHORIZATION, auth_header)
        .header(
            CONTENT_TYPE,
            content_type.unwrap_or_else(|| HeaderValue::from_static("application/json")),
        );
    if method != Method::GET {
        upstream_request = upstream_request.body(body);
    }

    let response = match upstream_request.send().await {
        Ok(resp) => resp,
        Err(e) => {
            let error_message = format!("upstream request failed: {}", e);
            error!("{}", error_message);
            return Err(GatewayError::Upstream(error_message));
        }
    };

    let status = response.status();
    let data = response.json::<Value>().await.map_err(|e| {
        let error_message = format!("failed to decode upstream response: {}", e);
        error!("{}", error_message);
        GatewayError::Upstream(error_message)
    })?;

    let body = serde_json::to_vec(&data).map_err(|e| {
        GatewayError::Internal(format!("failed to encode upstream response: {}", e))
    })?;

    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(Body::from(body))
        .unwrap())
}
