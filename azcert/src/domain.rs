use crate::dates;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Remote-assigned certificate identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(pub i64);

impl CertificateId {
    const DISPLAY_PREFIX: &str = "CERT-";

    /// Public form shown on certificates and QR links, e.g. `CERT-7`.
    pub fn display_id(&self) -> String {
        format!("{}{}", Self::DISPLAY_PREFIX, self.0)
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid certificate id '{0}'")]
pub struct InvalidCertificateId(pub String);

impl FromStr for CertificateId {
    type Err = InvalidCertificateId;

    /// Accepts `7` or `CERT-7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(Self::DISPLAY_PREFIX)
            .or_else(|| trimmed.strip_prefix("cert-"))
            .unwrap_or(trimmed);
        digits
            .parse::<i64>()
            .map(CertificateId)
            .map_err(|_| InvalidCertificateId(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub street_address: String,
}

impl Location {
    pub fn head_office() -> Self {
        Self {
            country: "Egypt".to_string(),
            state: "Cairo".to_string(),
            street_address: "33 Gamal El-Deen Kassem St., Nasr City".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.country.is_empty() && self.state.is_empty() && self.street_address.is_empty()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [&self.country, &self.state, &self.street_address]
            .into_iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// A certificate ("Service") record as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: CertificateId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "s_N", default)]
    pub serial_number: String,
    #[serde(default, deserialize_with = "method_code")]
    pub method: i32,
    #[serde(default, with = "dates::lenient_option")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, with = "dates::lenient_option")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub location: Location,
}

impl Certificate {
    pub const ISO_METHOD: i32 = 1;

    pub fn title(&self) -> String {
        method_title(self.method)
    }

    /// A certificate is active strictly before its end date.
    pub fn is_active_at(&self, now: &NaiveDateTime) -> Option<bool> {
        self.end_date.as_ref().map(|end| end > now)
    }
}

pub fn method_title(method: i32) -> String {
    if method == Certificate::ISO_METHOD {
        "ISO Certificate".to_string()
    } else {
        format!("Certificate Type {}", method)
    }
}

/// Payload for create and update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDto {
    pub name: String,
    #[serde(rename = "s_N")]
    pub serial_number: String,
    pub method: i32,
    #[serde(with = "dates::lenient")]
    pub start_date: NaiveDateTime,
    #[serde(with = "dates::lenient")]
    pub end_date: NaiveDateTime,
    pub location: Location,
}

/// Admin login credentials forwarded to the account endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// The backend has sent `method` both as a number and as a numeric string.
fn method_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(n) => i32::try_from(n).unwrap_or_default(),
        Raw::Text(s) => s.trim().parse().unwrap_or_default(),
        Raw::Null(()) => 0,
    })
}
