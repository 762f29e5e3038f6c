use axum::http::{HeaderMap, header::AUTHORIZATION};
use tracing::warn;

use crate::error::GatewayError;

const BEARER_PREFIX: &str = "Bearer ";

/// Requires an `Authorization: Bearer <token>` header on every asset request.
///
/// This is a shape check only: the token is never verified against the
/// identity provider here, which is a known weakness of this gateway rather
/// than a design feature. Real verification belongs to an injected verifier
/// in front of the storage operations.
pub fn require_bearer(headers: &HeaderMap) -> Result<(), GatewayError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|auth| auth.strip_prefix(BEARER_PREFIX));

    match token {
        Some(token) if !token.is_empty() => Ok(()),
        _ => {
            warn!("asset request rejected: missing or malformed bearer header");
            Err(GatewayError::Unauthorized)
        }
    }
}
