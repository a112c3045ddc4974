pub mod auth;
pub mod certificates;
pub mod error;
pub mod health;
pub mod verify;

pub use auth::{current_session, login, logout};
pub use certificates::{
    create_certificate, delete_certificate, get_certificate, list_certificates, update_certificate,
};
pub use health::health_check;
pub use verify::{lookup_certificate, verify_certificate};
