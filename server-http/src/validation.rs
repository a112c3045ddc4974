use crate::api::requests::{CertificateRequest, LocationRequest};
use azcert::dates::{add_years, parse_lenient};
use azcert::{Certificate, CertificateDto, Location};
use chrono::NaiveDateTime;
use serde_json::Value;

/// Validity granted when the form leaves the expiry date out.
const DEFAULT_VALIDITY_YEARS: i32 = 2;

#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    MissingRequiredField { field: &'static str },
    InvalidDate { field: &'static str, value: String },
    EndsBeforeStart,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingRequiredField { field } => *field,
            ValidationError::InvalidDate { field, .. } => *field,
            ValidationError::EndsBeforeStart => "endDate",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingRequiredField { field } => {
                write!(f, "Missing required field '{}'", field)
            }
            ValidationError::InvalidDate { field, value } => {
                write!(f, "Field '{}' is not a valid date: '{}'", field, value)
            }
            ValidationError::EndsBeforeStart => {
                write!(f, "Expiry date cannot be earlier than the issue date")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub struct CertificateFactory;

impl CertificateFactory {
    /// Validates an admin form and returns the payload for the remote API
    pub fn from_request(req: CertificateRequest) -> Result<CertificateDto, ValidationError> {
        let name = required_text(req.name, "name")?;
        let serial_number = required_text(req.serial_number, "serialNumber")?;

        let start_date = match req.start_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_date(raw, "startDate")?,
            _ => return Err(ValidationError::MissingRequiredField { field: "startDate" }),
        };
        let end_date = match req.end_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_date(raw, "endDate")?,
            _ => add_years(start_date, DEFAULT_VALIDITY_YEARS).ok_or(ValidationError::InvalidDate {
                field: "endDate",
                value: String::new(),
            })?,
        };
        if end_date < start_date {
            return Err(ValidationError::EndsBeforeStart);
        }

        Ok(CertificateDto {
            name,
            serial_number,
            method: parse_method(req.method.as_ref()),
            start_date,
            end_date,
            location: Self::location(req.location),
        })
    }

    // Partial addresses are kept as given; only a wholly missing one falls back.
    fn location(req: Option<LocationRequest>) -> Location {
        let location = req
            .map(|l| Location {
                country: trimmed(l.country),
                state: trimmed(l.state),
                street_address: trimmed(l.street_address),
            })
            .unwrap_or_default();

        if location.is_empty() {
            Location::head_office()
        } else {
            location
        }
    }
}

/// Method codes arrive as numbers, numeric text, or labels. Anything that is
/// not a number is treated as the ISO method.
pub fn parse_method(raw: Option<&Value>) -> i32 {
    let text = match raw {
        Some(Value::Number(n)) => {
            return n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .unwrap_or(Certificate::ISO_METHOD);
        }
        Some(Value::String(s)) => s.trim(),
        _ => return Certificate::ISO_METHOD,
    };

    // Labels such as "ISO 9001" land on the ISO method, as does anything unrecognised
    text.parse::<i32>().unwrap_or(Certificate::ISO_METHOD)
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingRequiredField { field }),
    }
}

fn parse_date(raw: &str, field: &'static str) -> Result<NaiveDateTime, ValidationError> {
    parse_lenient(raw).ok_or_else(|| ValidationError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
