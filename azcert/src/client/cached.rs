use super::{ClientConfig, RemoteClient};
use crate::cache::{Invalidate, ResponseCache};
use crate::clock::Clock;
use crate::domain::{Certificate, CertificateDto, CertificateId};
use crate::envelope;
use crate::ports::{CertificateApi, Records};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use shared::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cache key prefixes for the read operations.
pub mod keys {
    pub const GET_ALL: &str = "getAllServices";
    pub const SEARCH_BY_NAME: &str = "searchByName";
    pub const SEARCH_BY_SERIAL: &str = "searchBySerial";
    pub const GET_BY_ID: &str = "getById";

    /// Everything a successful write drops.
    pub const READ_PREFIXES: [&str; 4] = [GET_ALL, SEARCH_BY_NAME, SEARCH_BY_SERIAL, GET_BY_ID];

    pub fn with_term(prefix: &str, term: &str) -> String {
        format!("{}:{}", prefix, term)
    }
}

mod paths {
    pub const LIST: &str = "/Services";
    pub const SEARCH_BY_NAME: &str = "/Services/searchByName";
    pub const SEARCH_BY_SERIAL: &str = "/Services/searchByS_N";
    pub const GET_BY_ID: &str = "/Services/getById";
    pub const CREATE: &str = "/Services/create";

    pub fn update(id: super::CertificateId) -> String {
        format!("/Services/update/{}", id)
    }

    pub fn delete(id: super::CertificateId) -> String {
        format!("/Services/delete/{}", id)
    }
}

/// Certificate API client with a short-lived read cache.
///
/// Reads are served from the cache while their entry is younger than the TTL.
/// Any successful write discards every cached read, since there is no way to
/// tell which queries it affected. Failed writes leave the cache alone.
pub struct CachedCertificateClient {
    remote: RemoteClient,
    cache: ResponseCache<Records>,
}

impl CachedCertificateClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let remote = RemoteClient::new(config)?;
        Ok(Self::with_cache(remote, ResponseCache::new(config.cache_ttl)))
    }

    /// Same as `new`, reading cache time from `clock`.
    pub fn with_clock(config: &ClientConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let remote = RemoteClient::new(config)?;
        Ok(Self::with_cache(
            remote,
            ResponseCache::with_clock(config.cache_ttl, clock),
        ))
    }

    pub fn with_cache(remote: RemoteClient, cache: ResponseCache<Records>) -> Self {
        Self { remote, cache }
    }

    pub fn cache(&self) -> &ResponseCache<Records> {
        &self.cache
    }

    async fn cached_read(&self, key: String, path: &str, query: &[(&str, &str)]) -> Result<Records> {
        if let Some(hit) = self.cache.get(&key) {
            debug!("cache hit: {}", key);
            return Ok(hit);
        }
        debug!("cache miss: {}", key);

        let generation = self.cache.generation();
        let body = self.remote.get_json(path, query).await.inspect_err(|e| {
            warn!("Read {} failed: {}", key, e);
        })?;
        let records = Arc::new(envelope::decode_certificates(body));
        Ok(self.cache.set_if_current(key, records, generation))
    }

    fn invalidate_reads(&self) {
        self.cache
            .invalidate(Invalidate::Prefixes(&keys::READ_PREFIXES));
    }
}

fn echoed_record(body: Option<Value>) -> Option<Certificate> {
    envelope::normalize(body?)
        .into_iter()
        .find_map(|item| serde_json::from_value(item).ok())
}

#[async_trait]
impl CertificateApi for CachedCertificateClient {
    async fn get_all(&self) -> Result<Records> {
        self.cached_read(keys::GET_ALL.to_string(), paths::LIST, &[])
            .await
    }

    async fn search_by_name(&self, term: &str) -> Result<Records> {
        self.cached_read(
            keys::with_term(keys::SEARCH_BY_NAME, term),
            paths::SEARCH_BY_NAME,
            &[("search", term)],
        )
        .await
    }

    async fn search_by_serial_number(&self, term: &str) -> Result<Records> {
        self.cached_read(
            keys::with_term(keys::SEARCH_BY_SERIAL, term),
            paths::SEARCH_BY_SERIAL,
            &[("search", term)],
        )
        .await
    }

    async fn get_by_id(&self, id: CertificateId) -> Result<Option<Certificate>> {
        let id_param = id.to_string();
        let records = self
            .cached_read(
                keys::with_term(keys::GET_BY_ID, &id_param),
                paths::GET_BY_ID,
                &[("id", id_param.as_str())],
            )
            .await?;
        Ok(records.first().cloned())
    }

    async fn create(&self, dto: &CertificateDto) -> Result<Option<Certificate>> {
        let body = self
            .remote
            .send_json(Method::POST, paths::CREATE, dto)
            .await?;
        self.invalidate_reads();
        info!("Created certificate {}", dto.serial_number);
        Ok(echoed_record(body))
    }

    async fn update(&self, id: CertificateId, dto: &CertificateDto) -> Result<Option<Certificate>> {
        let body = self
            .remote
            .send_json(Method::PUT, &paths::update(id), dto)
            .await?;
        self.invalidate_reads();
        info!("Updated certificate {}", id);
        Ok(echoed_record(body))
    }

    async fn delete(&self, id: CertificateId) -> Result<()> {
        self.remote.delete(&paths::delete(id)).await?;
        self.invalidate_reads();
        info!("Deleted certificate {}", id);
        Ok(())
    }
}

impl std::fmt::Debug for CachedCertificateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedCertificateClient")
            .field("base_url", &self.remote.base_url())
            .field("cache", &self.cache)
            .finish()
    }
}
