use super::error::{api_error, upstream_error, verify_error, ApiError};
use crate::api::requests::VerifyQuery;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use azcert::{CertificateId, SearchType, VerificationResult, VerifiedCertificate};
use tracing::info;

/// GET /certificates/verify?q=<value>&type=name|serial|all
pub async fn verify_certificate(
    State(state): State<AppState>,
    Query(params): Query<VerifyQuery>,
) -> Result<Json<VerificationResult>, ApiError> {
    let search_type = match params.search_type.as_deref() {
        Some(raw) => raw
            .parse::<SearchType>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?,
        None => SearchType::default(),
    };

    info!("VERIFY: type={}", search_type);

    state
        .verification
        .verify(&params.q, search_type)
        .await
        .map(Json)
        .map_err(verify_error)
}

/// GET /certificates/{id}
///
/// Accepts the display id (`CERT-7`) or the bare record id (`7`).
pub async fn lookup_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VerifiedCertificate>, ApiError> {
    let id: CertificateId = id
        .parse()
        .map_err(|_| api_error(StatusCode::NOT_FOUND, "Certificate not found or has been revoked"))?;

    match state.verification.lookup(id).await.map_err(verify_error)? {
        Some(certificate) => Ok(Json(certificate)),
        None => Err(upstream_error(shared::Error::NotFound)),
    }
}
