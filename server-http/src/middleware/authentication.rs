use crate::api::responses::ErrorResponse;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};

/// Extract Basic Auth credentials from Authorization header
pub fn extract_basic_auth(auth_header: &str) -> Option<(String, String)> {
    // Authorization: Basic <base64>
    let parts: Vec<&str> = auth_header.split_whitespace().collect();

    if parts.len() != 2 || parts[0] != "Basic" {
        return None;
    }

    let decoded = STANDARD.decode(parts[1]).ok()?;
    let decoded_str = String::from_utf8(decoded).ok()?;

    // Split email:password
    let mut parts = decoded_str.splitn(2, ':');
    let email = parts.next()?.to_string();
    let password = parts.next()?.to_string();

    Some((email, password))
}

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    // Authorization: Bearer <token>
    let parts: Vec<&str> = auth_header.split_whitespace().collect();

    if parts.len() != 2 || parts[0] != "Bearer" {
        return None;
    }

    Some(parts[1].to_string())
}

/// Bearer token from the request headers, if any
pub fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
}

/// Client IP address as reported by a fronting proxy
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("X-Real-IP")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer realm=\"AZ Certificates\"")],
        Json(ErrorResponse::new(message)),
    )
        .into_response()
}

/// Session middleware for admin routes. Resolves the bearer token to a live
/// session and attaches it to the request.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = match bearer_from_headers(request.headers()) {
        Some(token) => token,
        None => return Err(unauthorized("Missing or invalid Authorization header")),
    };

    let session = match state.auth_service.authenticate(&token).await {
        Ok(session) => session,
        Err(_) => return Err(unauthorized("Session not found or expired")),
    };

    // Handlers take the session and admin as extensions
    request.extensions_mut().insert(session.admin.clone());
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
