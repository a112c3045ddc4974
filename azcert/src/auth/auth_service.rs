use super::error::AuthError;
use super::models::Admin;
use super::moka_session_repository::MokaSessionRepository;
use super::session::{Session, SessionToken};
use super::session_store::SessionStore;
use crate::domain::Credentials;
use crate::ports::AccountApi;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Exchanges credentials accepted by the remote account service for a local,
/// expiring session.
pub struct AuthService {
    account: Arc<dyn AccountApi>,
    session_store: Arc<SessionStore<MokaSessionRepository>>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        account: Arc<dyn AccountApi>,
        session_store: Arc<SessionStore<MokaSessionRepository>>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            account,
            session_store,
            session_ttl,
        }
    }

    /// Build a service backed by an in-memory session repository whose entries
    /// live no longer than `session_ttl`.
    pub fn in_memory(account: Arc<dyn AccountApi>, session_ttl: Duration) -> Self {
        let repository = MokaSessionRepository::new(None, Some(session_ttl));
        let session_store = Arc::new(SessionStore::new(Arc::new(repository)));
        Self::new(account, session_store, session_ttl)
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn session_store(&self) -> &Arc<SessionStore<MokaSessionRepository>> {
        &self.session_store
    }

    /// Log in against the remote account service and open a session
    pub async fn login(
        &self,
        credentials: &Credentials,
        client_ip: Option<String>,
    ) -> Result<Session, AuthError> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        if !self.account.login(credentials).await? {
            warn!("Login rejected for {}", credentials.email);
            return Err(AuthError::InvalidCredentials);
        }

        let admin = Admin::new(credentials.email.trim());
        let ttl_ms = u64::try_from(self.session_ttl.as_millis()).unwrap_or(u64::MAX);
        let session = self.session_store.create_session(admin, ttl_ms, client_ip).await?;

        info!("Session opened for {}", session.admin.email);
        Ok(session)
    }

    /// Resolve a bearer token to its live session
    pub async fn authenticate(&self, token: &SessionToken) -> Result<Session, AuthError> {
        self.session_store
            .validate_session(token)
            .await
            .map_err(|_| AuthError::Unauthenticated)
    }

    /// Returns whether a session existed for `token`
    pub async fn logout(&self, token: &SessionToken) -> Result<bool, AuthError> {
        let removed = self.session_store.invalidate_session(token).await?;
        if removed {
            info!("Session closed");
        }
        Ok(removed)
    }
}
