use super::error::{api_error, auth_error, ApiError};
use crate::api::requests::LoginRequest;
use crate::api::responses::{LoginResponse, LogoutResponse, SessionResponse};
use crate::middleware::{bearer_from_headers, client_ip, extract_basic_auth};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use azcert::auth::Session;
use azcert::Credentials;
use tracing::info;

/// POST /auth/login
///
/// Accepts either:
/// 1. JSON body: {"email": "admin@az.example", "password": "..."}
/// 2. Basic Auth header: Authorization: Basic base64(email:password)
///
/// The credentials are checked by the remote account service. On success the
/// returned token is used as `Authorization: Bearer <token>` on admin routes.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Try to extract credentials from either JSON body or Basic Auth header
    let credentials = match body {
        Ok(Json(login_req)) => Credentials::new(login_req.email, login_req.password),
        Err(_) => {
            let auth_header = headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    api_error(
                        StatusCode::BAD_REQUEST,
                        "Missing credentials. Provide either JSON body or Basic Auth header",
                    )
                })?;
            let (email, password) = extract_basic_auth(auth_header).ok_or_else(|| {
                api_error(StatusCode::BAD_REQUEST, "Invalid Authorization header format")
            })?;
            Credentials::new(email, password)
        }
    };

    let session = state
        .auth_service
        .login(&credentials, client_ip(&headers))
        .await
        .map_err(auth_error)?;

    Ok(Json(LoginResponse {
        token: session.token,
        expires_in: state.auth_service.session_ttl().as_secs(),
        email: session.admin.email,
    }))
}

/// POST /auth/logout
///
/// Invalidate the session named by `Authorization: Bearer <token>`.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, ApiError> {
    let token = bearer_from_headers(&headers).ok_or_else(|| {
        api_error(
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header format. Expected: Bearer <token>",
        )
    })?;

    if !state.auth_service.logout(&token).await.map_err(auth_error)? {
        return Err(api_error(StatusCode::NOT_FOUND, "Session not found or already expired"));
    }

    info!("Admin logged out");
    Ok(Json(LogoutResponse {
        message: "Session logged out successfully".to_string(),
    }))
}

/// GET /auth/session
pub async fn current_session(Extension(session): Extension<Session>) -> Json<SessionResponse> {
    Json(SessionResponse {
        expires_in_ms: session.remaining_ttl_ms(),
        email: session.admin.email,
        created_at: session.created_at_utc,
        last_accessed: session.last_accessed_utc,
    })
}
