use super::models::Admin;
use super::session::{generate_session_token, Session, SessionToken};
use super::session_store::SessionRepository;
use async_trait::async_trait;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use parking_lot::RwLock;
use shared::Result;
use std::sync::Arc;
use std::time::Duration;

/// Admin email, the secondary index key
pub type Email = String;

/// Moka-based in-memory session repository with dual-index support
pub struct MokaSessionRepository {
    // Primary index: token -> session
    sessions: Cache<SessionToken, Session>,
    // Secondary index: email -> list of session tokens, pruned on each login
    admin_sessions: Cache<Email, Arc<RwLock<Vec<SessionToken>>>>,
}

impl MokaSessionRepository {
    /// Create a new Moka session repository with specified capacity and default TTL
    pub fn new(max_sessions: Option<u64>, default_ttl: Option<Duration>) -> Self {
        let mut sessions_builder = Cache::builder();
        let mut admin_sessions_builder = Cache::builder();

        if let Some(capacity) = max_sessions {
            sessions_builder = sessions_builder.max_capacity(capacity);
            admin_sessions_builder = admin_sessions_builder.max_capacity(capacity);
        }

        // The index has no TTL of its own; it would drop tokens of later logins
        if let Some(ttl) = default_ttl {
            sessions_builder = sessions_builder.time_to_live(ttl);
        }

        Self {
            sessions: sessions_builder.build(),
            admin_sessions: admin_sessions_builder.build(),
        }
    }

    /// Create with default settings (unbounded, 1 hour TTL)
    pub fn with_defaults() -> Self {
        Self::new(None, Some(Duration::from_secs(3600)))
    }

    async fn tokens_for(&self, email: &str) -> Vec<SessionToken> {
        match self.admin_sessions.get(email).await {
            // Clone tokens to release lock before awaiting
            Some(tokens_lock) => tokens_lock.read().clone(),
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl SessionRepository for MokaSessionRepository {
    async fn create_session(&self, admin: Admin, ttl_ms: u64, client_ip: Option<String>) -> Result<Session> {
        let token = generate_session_token();
        let session = Session::new(token.clone(), admin, ttl_ms, client_ip);

        self.sessions.insert(token.clone(), session.clone()).await;

        let email = session.admin.email.clone();
        let tokens_lock = self
            .admin_sessions
            .get_with(email, async { Arc::new(RwLock::new(Vec::new())) })
            .await;

        let known_tokens = tokens_lock.read().clone();
        let mut dead = Vec::new();
        for known in known_tokens {
            let alive = self
                .sessions
                .get(&known)
                .await
                .is_some_and(|s| !s.is_expired());
            if !alive {
                dead.push(known);
            }
        }

        {
            let mut tokens = tokens_lock.write();
            tokens.retain(|t| !dead.contains(t));
            tokens.push(token);
        }

        Ok(session)
    }

    async fn get_session(&self, token: &SessionToken) -> Result<Session> {
        // Touch under the per-key lock so a concurrent delete cannot be undone
        let outcome = self
            .sessions
            .entry_by_ref(token)
            .and_compute_with(|entry| {
                let op = match entry.map(|e| e.into_value()) {
                    Some(mut session) if !session.is_expired() => {
                        session.update_last_accessed();
                        Op::Put(session)
                    }
                    Some(_) => Op::Remove,
                    None => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;

        match outcome {
            CompResult::ReplacedWith(entry) => Ok(entry.into_value()),
            _ => Err(shared::Error::NotFound),
        }
    }

    async fn delete_session(&self, token: &SessionToken) -> Result<bool> {
        let outcome = self
            .sessions
            .entry_by_ref(token)
            .and_compute_with(|entry| {
                std::future::ready(match entry {
                    Some(_) => Op::Remove,
                    None => Op::Nop,
                })
            })
            .await;

        let CompResult::Removed(removed) = outcome else {
            return Ok(false);
        };

        if let Some(tokens_lock) = self.admin_sessions.get(&removed.value().admin.email).await {
            tokens_lock.write().retain(|t| t != token);
        }

        Ok(true)
    }

    async fn session_exists(&self, token: &SessionToken) -> Result<bool> {
        Ok(self
            .sessions
            .get(token)
            .await
            .is_some_and(|session| !session.is_expired()))
    }

    async fn get_admin_sessions(&self, email: &str) -> Result<Vec<Session>> {
        let mut sessions = Vec::new();

        for token in self.tokens_for(email).await.iter() {
            if let Some(session) = self.sessions.get(token).await {
                if !session.is_expired() {
                    sessions.push(session);
                }
            }
        }

        Ok(sessions)
    }

    async fn delete_admin_sessions(&self, email: &str) -> Result<usize> {
        let mut count = 0;

        for token in self.tokens_for(email).await.iter() {
            if self.sessions.remove(token).await.is_some() {
                count += 1;
            }
        }
        self.admin_sessions.invalidate(email).await;

        Ok(count)
    }
}
