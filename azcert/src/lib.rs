pub mod auth;
pub mod cache;
pub mod client;
pub mod clock;
pub mod dates;
pub mod domain;
pub mod envelope;
pub mod ports;
pub mod verification;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use cache::{CacheEntry, Invalidate, ResponseCache};
pub use client::{CachedCertificateClient, ClientConfig, RemoteClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::{Certificate, CertificateDto, CertificateId, Credentials, Location};
pub use ports::{AccountApi, CertificateApi, Records};
pub use verification::{
    CertificateStatus, SearchType, VerificationResult, VerificationService, VerifiedCertificate, VerifyError,
};
