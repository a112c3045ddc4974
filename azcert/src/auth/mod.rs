// Public API
pub mod account;
pub mod auth_service;
pub mod error;
pub mod models;
pub mod moka_session_repository;
pub mod session;
pub mod session_store;

// Re-export commonly used types
pub use account::{login_accepted, AccountClient, LOGIN_SUCCESS_MARKER};
pub use auth_service::{AuthService, DEFAULT_SESSION_TTL};
pub use error::AuthError;
pub use models::Admin;
pub use moka_session_repository::MokaSessionRepository;
pub use session::{current_timestamp_ms, format_utc_time, generate_session_token, Session, SessionToken};
pub use session_store::{SessionRepository, SessionStore};
