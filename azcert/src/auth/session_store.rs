use super::models::Admin;
use super::session::{Session, SessionToken};
use async_trait::async_trait;
use shared::Result;
use std::sync::Arc;

/// Trait for session storage operations
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session for the given admin with specified TTL and optional client IP
    async fn create_session(&self, admin: Admin, ttl_ms: u64, client_ip: Option<String>) -> Result<Session>;

    /// Get a live session by token, refreshing its last_accessed timestamp
    async fn get_session(&self, token: &SessionToken) -> Result<Session>;

    /// Delete a session (logout)
    async fn delete_session(&self, token: &SessionToken) -> Result<bool>;

    /// Check if a session exists and has not expired
    async fn session_exists(&self, token: &SessionToken) -> Result<bool>;

    /// Get all active sessions for an admin
    async fn get_admin_sessions(&self, email: &str) -> Result<Vec<Session>>;

    /// Delete all sessions for an admin
    async fn delete_admin_sessions(&self, email: &str) -> Result<usize>;
}

/// Session store service
pub struct SessionStore<S: SessionRepository> {
    repository: Arc<S>,
}

impl<S: SessionRepository> SessionStore<S> {
    pub fn new(repository: Arc<S>) -> Self {
        Self { repository }
    }

    pub async fn create_session(&self, admin: Admin, ttl_ms: u64, client_ip: Option<String>) -> Result<Session> {
        self.repository.create_session(admin, ttl_ms, client_ip).await
    }

    /// Validate a session token and return the session
    pub async fn validate_session(&self, token: &SessionToken) -> Result<Session> {
        self.repository.get_session(token).await
    }

    /// Invalidate a session (logout)
    pub async fn invalidate_session(&self, token: &SessionToken) -> Result<bool> {
        self.repository.delete_session(token).await
    }

    pub async fn is_valid_session(&self, token: &SessionToken) -> Result<bool> {
        self.repository.session_exists(token).await
    }

    pub async fn get_admin_sessions(&self, email: &str) -> Result<Vec<Session>> {
        self.repository.get_admin_sessions(email).await
    }

    /// Invalidate all sessions for an admin (logout all devices)
    pub async fn invalidate_admin_sessions(&self, email: &str) -> Result<usize> {
        self.repository.delete_admin_sessions(email).await
    }
}
