use axum::{
    extract::Request,
    http::{
        HeaderMap, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Per-gateway CORS policy. The two gateways advertise different allowed
/// methods and headers; both allow any origin.
#[derive(Debug, Clone, Copy)]
pub struct CorsPolicy {
    pub allow_methods: &'static str,
    pub allow_headers: &'static str,
}

pub const INFERENCE_CORS: CorsPolicy = CorsPolicy {
    allow_methods: "GET, POST, OPTIONS",
    allow_headers: "Content-Type, Authorization",
};

pub const ASSETS_CORS: CorsPolicy = CorsPolicy {
    allow_methods: "GET, POST, PUT, DELETE, OPTIONS",
    allow_headers: "Content-Type, Authorization, X-File-Name, X-File-Type",
};

/// Merges the policy's full header set into `headers`, overwriting any
/// previous values. Object metadata set by handlers is left untouched.
pub fn apply_cors(policy: &CorsPolicy, headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(policy.allow_methods),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(policy.allow_headers),
    );
}

pub async fn inference_cors(request: Request, next: Next) -> Response {
    handle_cors(&INFERENCE_CORS, request, next).await
}

pub async fn assets_cors(request: Request, next: Next) -> Response {
    handle_cors(&ASSETS_CORS, request, next).await
}

// Preflight short-circuits before routing and auth; every other response,
// success or error, gets the header set merged in on the way out.
async fn handle_cors(policy: &CorsPolicy, request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::OK.into_response();
        apply_cors(policy, response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors(policy, response.headers_mut());
    response
}
