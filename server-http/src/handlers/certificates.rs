use super::error::{api_error, upstream_error, validation_error, ApiError};
use crate::api::requests::{CertificateRequest, ListQuery};
use crate::api::responses::{DeleteResponse, ListCertificatesResponse, WriteResponse};
use crate::state::AppState;
use crate::validation::CertificateFactory;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use azcert::auth::Admin;
use azcert::{Certificate, CertificateId, Records};
use tracing::{info, warn};

fn parse_id(raw: &str) -> Result<CertificateId, ApiError> {
    raw.parse()
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, format!("Invalid certificate id '{}'", raw)))
}

/// GET /admin/certificates?search=<term>
///
/// Without `search` lists everything. With it, searches by name and falls
/// back to serial number when the name search finds nothing. A search that
/// times out counts as no results and sets `timed_out`.
pub async fn list_certificates(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ListCertificatesResponse>, ApiError> {
    let term = params.search.as_deref().map(str::trim).unwrap_or_default();

    if term.is_empty() {
        let records = state.certificates.get_all().await.map_err(upstream_error)?;
        return Ok(Json(ListCertificatesResponse::new(records.to_vec(), false)));
    }

    let mut timed_out = false;
    let by_name = search_result(state.certificates.search_by_name(term).await, &mut timed_out)?;
    let records = if by_name.is_empty() {
        search_result(
            state.certificates.search_by_serial_number(term).await,
            &mut timed_out,
        )?
    } else {
        by_name
    };

    Ok(Json(ListCertificatesResponse::new(records.to_vec(), timed_out)))
}

fn search_result(result: shared::Result<Records>, timed_out: &mut bool) -> Result<Records, ApiError> {
    match result {
        Ok(records) => Ok(records),
        Err(err) if err.is_timeout() => {
            warn!("Admin search timed out, treating as no results");
            *timed_out = true;
            Ok(Records::default())
        }
        Err(err) => Err(upstream_error(err)),
    }
}

/// GET /admin/certificates/{id}
pub async fn get_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Certificate>, ApiError> {
    let id = parse_id(&id)?;

    match state.certificates.get_by_id(id).await.map_err(upstream_error)? {
        Some(certificate) => Ok(Json(certificate)),
        None => Err(upstream_error(shared::Error::NotFound)),
    }
}

/// POST /admin/certificates
pub async fn create_certificate(
    State(state): State<AppState>,
    Extension(admin): Extension<Admin>,
    Json(req): Json<CertificateRequest>,
) -> Result<(StatusCode, Json<WriteResponse>), ApiError> {
    let dto = CertificateFactory::from_request(req).map_err(validation_error)?;

    info!("CREATE: serial={}, by={}", dto.serial_number, admin.email);

    let certificate = state.certificates.create(&dto).await.map_err(upstream_error)?;

    Ok((
        StatusCode::CREATED,
        Json(WriteResponse {
            ok: true,
            certificate,
        }),
    ))
}

/// PUT /admin/certificates/{id}
pub async fn update_certificate(
    State(state): State<AppState>,
    Extension(admin): Extension<Admin>,
    Path(id): Path<String>,
    Json(req): Json<CertificateRequest>,
) -> Result<Json<WriteResponse>, ApiError> {
    let id = parse_id(&id)?;
    let dto = CertificateFactory::from_request(req).map_err(validation_error)?;

    info!("UPDATE: id={}, by={}", id, admin.email);

    let certificate = state.certificates.update(id, &dto).await.map_err(upstream_error)?;

    Ok(Json(WriteResponse {
        ok: true,
        certificate,
    }))
}

/// DELETE /admin/certificates/{id}
pub async fn delete_certificate(
    State(state): State<AppState>,
    Extension(admin): Extension<Admin>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&id)?;

    info!("DELETE: id={}, by={}", id, admin.email);

    state.certificates.delete(id).await.map_err(upstream_error)?;

    Ok(Json(DeleteResponse { deleted: true }))
}
