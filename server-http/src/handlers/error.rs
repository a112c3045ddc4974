use crate::api::responses::ErrorResponse;
use crate::validation::ValidationError;
use axum::{http::StatusCode, Json};
use azcert::auth::AuthError;
use azcert::VerifyError;
use tracing::warn;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

/// Map a failure talking to the remote API onto the portal's response
pub fn upstream_error(err: shared::Error) -> ApiError {
    let status = match &err {
        shared::Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
        shared::Error::NotFound | shared::Error::Status(404) => StatusCode::NOT_FOUND,
        shared::Error::Status(_) | shared::Error::Transport(_) | shared::Error::Decode(_) => {
            StatusCode::BAD_GATEWAY
        }
        shared::Error::Config(_) | shared::Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        warn!("Upstream failure: {}", err);
    }
    if status == StatusCode::NOT_FOUND {
        return api_error(status, "Certificate not found");
    }
    api_error(status, err.to_string())
}

pub fn validation_error(err: ValidationError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::for_field(err.to_string(), err.field())),
    )
}

pub fn verify_error(err: VerifyError) -> ApiError {
    match err {
        VerifyError::EmptyQuery => api_error(StatusCode::BAD_REQUEST, err.to_string()),
        VerifyError::Upstream(e) => upstream_error(e),
    }
}

pub fn auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::InvalidCredentials => api_error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
        AuthError::Unauthenticated => api_error(StatusCode::UNAUTHORIZED, err.to_string()),
        AuthError::Upstream(e) => upstream_error(e),
    }
}
