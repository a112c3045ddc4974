pub mod authentication;

pub use authentication::{
    bearer_from_headers, client_ip, extract_basic_auth, extract_bearer_token, require_session,
};
