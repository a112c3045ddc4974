use azcert::auth::{AccountClient, AuthService};
use azcert::{AccountApi, CachedCertificateClient, CertificateApi, ClientConfig, VerificationService};
use shared::config::Config;
use std::sync::Arc;
use tracing::info;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub certificates: Arc<dyn CertificateApi>,
    pub verification: Arc<VerificationService>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(
        certificates: Arc<dyn CertificateApi>,
        account: Arc<dyn AccountApi>,
        config: &Config,
    ) -> Self {
        let verification = Arc::new(VerificationService::new(certificates.clone()));
        let auth_service = Arc::new(AuthService::in_memory(account, config.session_ttl));

        Self {
            certificates,
            verification,
            auth_service,
        }
    }

    /// Wire the cached certificate client and the account client against the
    /// configured remote API.
    pub fn from_config(config: &Config) -> shared::Result<Self> {
        let client_config = ClientConfig::from(config);

        let certificates = Arc::new(CachedCertificateClient::new(&client_config)?);
        let account = Arc::new(AccountClient::new(&client_config)?);

        info!(
            "Remote API at {} (timeout {:?}, cache TTL {:?})",
            client_config.base_url, client_config.timeout, client_config.cache_ttl
        );

        Ok(Self::new(certificates, account, config))
    }
}
