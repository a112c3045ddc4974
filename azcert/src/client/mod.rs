pub mod cached;
pub mod remote;

#[cfg(test)]
mod tests;

pub use cached::CachedCertificateClient;
pub use remote::RemoteClient;

use crate::cache::DEFAULT_TTL;
use shared::config::Config;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub accept_invalid_certs: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_TTL,
            accept_invalid_certs: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

impl From<&Config> for ClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            timeout: config.request_timeout,
            cache_ttl: config.cache_ttl,
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }
}
