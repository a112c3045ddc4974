use super::models::Admin;
use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Session token type - a secure random string
pub type SessionToken = String;

/// Get current timestamp in milliseconds since Unix epoch
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Format a timestamp (ms since epoch) as ISO 8601 UTC string
pub fn format_utc_time(timestamp_ms: u64) -> String {
    let datetime = DateTime::from_timestamp_millis(timestamp_ms as i64).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Admin session with tracking metadata
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub admin: Admin,
    pub created_at: u64,           // UTC timestamp in milliseconds
    pub created_at_utc: String,    // Human-readable UTC time (ISO 8601)
    pub expires_at: u64,           // UTC timestamp in milliseconds
    pub last_accessed: u64,        // UTC timestamp in milliseconds
    pub last_accessed_utc: String, // Human-readable UTC time (ISO 8601)
    pub client_ip: Option<String>, // IP address of the client
}

impl Session {
    /// Create a new session with the given token, admin, TTL, and optional client IP
    pub fn new(token: SessionToken, admin: Admin, ttl_ms: u64, client_ip: Option<String>) -> Self {
        let now = current_timestamp_ms();
        let now_utc = format_utc_time(now);

        Self {
            token,
            admin,
            created_at: now,
            created_at_utc: now_utc.clone(),
            expires_at: now.saturating_add(ttl_ms),
            last_accessed: now,
            last_accessed_utc: now_utc,
            client_ip,
        }
    }

    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    pub fn update_last_accessed(&mut self) {
        let now = current_timestamp_ms();
        self.last_accessed = now;
        self.last_accessed_utc = format_utc_time(now);
    }

    /// Get remaining time to live in milliseconds
    pub fn remaining_ttl_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

/// Generate a cryptographically secure random session token
pub fn generate_session_token() -> SessionToken {
    use rand::Rng;

    // 32 random bytes as hex (64 characters)
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
