use azcert::Certificate;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub message: String,
}

/// Response body for login endpoint
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub email: String,
    pub created_at: String,
    pub last_accessed: String,
    pub expires_in_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ListCertificatesResponse {
    pub certificates: Vec<Certificate>,
    pub count: usize,
    /// A search timed out and was counted as finding nothing.
    pub timed_out: bool,
}

impl ListCertificatesResponse {
    pub fn new(certificates: Vec<Certificate>, timed_out: bool) -> Self {
        Self {
            count: certificates.len(),
            certificates,
            timed_out,
        }
    }
}

/// Write acknowledgement; `certificate` is present when the remote echoed the record.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: None,
        }
    }

    pub fn for_field(error: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: Some(field.into()),
        }
    }
}
