use serde::Deserialize;
use serde_json::Value;

/// Request body for login endpoint
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default, rename = "type")]
    pub search_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub street_address: Option<String>,
}

/// Create/update form as submitted by the admin pages. Fields stay loose here
/// and are checked in `validation`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "s_N")]
    pub serial_number: Option<String>,
    /// A number, numeric text, or a label such as "ISO 9001"
    #[serde(default)]
    pub method: Option<Value>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<LocationRequest>,
}
