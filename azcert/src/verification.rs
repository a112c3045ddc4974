//! Public certificate verification.
//!
//! Looks a certificate up by serial number and/or holder name and renders the
//! hits in the shape shown to the public.

use crate::dates::{format_or, DateStyle};
use crate::domain::{Certificate, CertificateId};
use crate::ports::{CertificateApi, Records};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub const ISSUER: &str = "AZ INTERNATIONAL";
pub const CATEGORY: &str = "Quality Management";
const UNKNOWN_DATE: &str = "N/A";

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Please enter a search value")]
    EmptyQuery,

    #[error(transparent)]
    Upstream(#[from] shared::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Name,
    Serial,
    #[default]
    All,
}

impl SearchType {
    fn searches_serial(self) -> bool {
        matches!(self, SearchType::Serial | SearchType::All)
    }

    fn searches_name(self) -> bool {
        matches!(self, SearchType::Name | SearchType::All)
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchType::Name => "name",
            SearchType::Serial => "serial",
            SearchType::All => "all",
        })
    }
}

#[derive(Debug, Error)]
#[error("unknown search type '{0}', expected name, serial or all")]
pub struct InvalidSearchType(String);

impl FromStr for SearchType {
    type Err = InvalidSearchType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SearchType::Name),
            "serial" => Ok(SearchType::Serial),
            "all" | "" => Ok(SearchType::All),
            _ => Err(InvalidSearchType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Active,
    Expired,
    Unknown,
}

/// The public view of a certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCertificate {
    /// `CERT-<id>`
    pub id: String,
    pub record_id: CertificateId,
    pub name: String,
    pub title: String,
    pub serial_number: String,
    pub issue_date: String,
    pub expiry_date: String,
    pub issuer: String,
    pub category: String,
    pub status: CertificateStatus,
    pub location: String,
}

impl VerifiedCertificate {
    pub fn from_record(record: &Certificate, now: &NaiveDateTime) -> Self {
        let status = match record.is_active_at(now) {
            Some(true) => CertificateStatus::Active,
            Some(false) => CertificateStatus::Expired,
            None => CertificateStatus::Unknown,
        };

        Self {
            id: record.id.display_id(),
            record_id: record.id,
            name: record.name.clone(),
            title: record.title(),
            serial_number: record.serial_number.clone(),
            issue_date: format_or(record.start_date.as_ref(), DateStyle::Long, UNKNOWN_DATE),
            expiry_date: format_or(record.end_date.as_ref(), DateStyle::Long, UNKNOWN_DATE),
            issuer: ISSUER.to_string(),
            category: CATEGORY.to_string(),
            status,
            location: record.location.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub query: String,
    pub search_type: SearchType,
    pub certificates: Vec<VerifiedCertificate>,
    /// At least one search gave up waiting on the remote.
    pub timed_out: bool,
}

impl VerificationResult {
    pub fn found(&self) -> bool {
        !self.certificates.is_empty()
    }
}

pub struct VerificationService {
    api: Arc<dyn CertificateApi>,
}

impl VerificationService {
    pub fn new(api: Arc<dyn CertificateApi>) -> Self {
        Self { api }
    }

    /// Search by serial number and/or name. Serial hits win for `All`; the name
    /// search runs only when the serial search found nothing.
    pub async fn verify(&self, query: &str, search_type: SearchType) -> Result<VerificationResult, VerifyError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(VerifyError::EmptyQuery);
        }

        let mut timed_out = false;
        let mut hits: Option<Records> = None;

        if search_type.searches_serial() {
            hits = swallow_timeout(self.api.search_by_serial_number(query).await, &mut timed_out)?;
        }

        let serial_found = hits.as_ref().is_some_and(|records| !records.is_empty());
        if search_type.searches_name() && !serial_found {
            hits = swallow_timeout(self.api.search_by_name(query).await, &mut timed_out)?;
        }

        let now = Utc::now().naive_utc();
        let certificates: Vec<VerifiedCertificate> = hits
            .map(|records| {
                records
                    .iter()
                    .map(|record| VerifiedCertificate::from_record(record, &now))
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            "Verification of '{}' by {} found {} certificate(s)",
            query,
            search_type,
            certificates.len()
        );

        Ok(VerificationResult {
            query: query.to_string(),
            search_type,
            certificates,
            timed_out,
        })
    }

    /// The public view of one record, `None` when the remote has no such id.
    pub async fn lookup(&self, id: CertificateId) -> Result<Option<VerifiedCertificate>, VerifyError> {
        let now = Utc::now().naive_utc();
        let record = self.api.get_by_id(id).await?;
        Ok(record.map(|record| VerifiedCertificate::from_record(&record, &now)))
    }
}

fn swallow_timeout(result: shared::Result<Records>, timed_out: &mut bool) -> shared::Result<Option<Records>> {
    match result {
        Ok(records) => Ok(Some(records)),
        Err(err) if err.is_timeout() => {
            warn!("Certificate search timed out, treating as no results");
            *timed_out = true;
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
