use crate::domain::{Certificate, CertificateDto, CertificateId, Credentials};
use async_trait::async_trait;
use shared::Result;
use std::sync::Arc;

// Ports are the seams between the portal and the remote backend

/// Shared, immutable result of a read; cache hits hand out the same allocation.
pub type Records = Arc<Vec<Certificate>>;

/// Port for the remote certificate ("Services") resource
#[async_trait]
pub trait CertificateApi: Send + Sync + 'static {
    async fn get_all(&self) -> Result<Records>;
    async fn search_by_name(&self, term: &str) -> Result<Records>;
    async fn search_by_serial_number(&self, term: &str) -> Result<Records>;
    async fn get_by_id(&self, id: CertificateId) -> Result<Option<Certificate>>;

    /// Returns the record echoed back by the remote, when it sends one.
    async fn create(&self, dto: &CertificateDto) -> Result<Option<Certificate>>;
    async fn update(&self, id: CertificateId, dto: &CertificateDto) -> Result<Option<Certificate>>;
    async fn delete(&self, id: CertificateId) -> Result<()>;
}

/// Port for the remote account endpoint
#[async_trait]
pub trait AccountApi: Send + Sync + 'static {
    /// `Ok(false)` means the remote rejected the credentials.
    async fn login(&self, credentials: &Credentials) -> Result<bool>;
}
