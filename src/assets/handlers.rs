use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{
        Method, StatusCode,
        header::{CONTENT_TYPE, ETAG},
    },
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::info;

use super::auth::require_bearer;
use crate::error::GatewayError;
use crate::service::app_state::SharedState;
use crate::service::storage::types::PutObjectOptions;

const FILE_NAME_HEADER: &str = "x-file-name";

/// Entry point for every asset request: bearer guard first, then method
/// dispatch. Anything outside upload/get/delete is a 405.
pub async fn handle_assets_request(
    state: SharedState,
    key: String,
    request: Request<Body>,
) -> Result<Response<Body>, GatewayError> {
    require_bearer(request.headers())?;

    match *request.method() {
        Method::POST => handle_upload(state, key, request).await,
        Method::GET => handle_get(state, key).await,
        Method::DELETE => handle_delete(state, key).await,
        _ => Err(GatewayError::MethodNotAllowed),
    }
}

// The storage key combines the request path with the file-name header. When
// the path already names the file, it is used as-is rather than doubled.
fn object_key(path: &str, file_name: &str) -> String {
    let path = path.trim_matches('/');
    if path.is_empty() {
        file_name.to_string()
    } else if path == file_name || path.ends_with(&format!("/{}", file_name)) {
        path.to_string()
    } else {
        format!("{}/{}", path, file_name)
    }
}

async fn handle_upload(
    state: SharedState,
    path: String,
    request: Request<Body>,
) -> Result<Response<Body>, GatewayError> {
    let file_name = match request
        .headers()
        .get(FILE_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Err(GatewayError::BadRequest(
                "X-File-Name header is required".to_string(),
            ));
        }
    };
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let data = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| GatewayError::BadRequest(format!("Failed to read body: {}", e)))?;

    let full_path = object_key(&path, &file_name);
    let size = data.len();

    state
        .storage
        .put_object(
            &full_path,
            data,
            PutObjectOptions {
                content_type: content_type.as_deref(),
            },
        )
        .await?;

    let url = format!(
        "{}/{}",
        state.config.assets.public_base_url.trim_end_matches('/'),
        full_path
    );
    info!("stored asset {} ({} bytes)", &full_path, size);

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "fileName": file_name,
            "path": full_path,
            "url": url,
            "size": size,
        })),
    )
        .into_response())
}

async fn handle_get(state: SharedState, key: String) -> Result<Response<Body>, GatewayError> {
    let key = key.trim_matches('/');
    if key.is_empty() {
        return Err(GatewayError::BadRequest("Path is required".to_string()));
    }

    let object = state.storage.get_object(key).await?;

    // The object's own metadata wins; CORS headers are merged on top by the
    // middleware, never the other way around.
    let mut builder = Response::builder().status(StatusCode::OK).header(
        CONTENT_TYPE,
        object
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream"),
    );
    if let Some(etag) = object.etag.as_deref() {
        builder = builder.header(ETAG, format!("\"{}\"", etag));
    }

    builder
        .body(Body::from(object.data))
        .map_err(|e| GatewayError::Internal(format!("failed to build response: {}", e)))
}

async fn handle_delete(state: SharedState, key: String) -> Result<Response<Body>, GatewayError> {
    let key = key.trim_matches('/');
    if key.is_empty() {
        return Err(GatewayError::BadRequest("Path is required".to_string()));
    }

    state.storage.delete_object(key).await?;
    info!("deleted asset {}", key);

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": format!("File {} successfully deleted", key),
        })),
    )
        .into_response())
}
