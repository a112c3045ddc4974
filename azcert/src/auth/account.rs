use crate::client::{ClientConfig, RemoteClient};
use crate::domain::Credentials;
use crate::ports::AccountApi;
use async_trait::async_trait;
use shared::Result;
use tracing::{debug, info};

/// Text the account endpoint answers with when it accepts a login.
pub const LOGIN_SUCCESS_MARKER: &str = "Login successful";

// The route name is misspelled on the remote side.
const LOGIN_PATH: &str = "/Acount/login";

/// The remote contract for an accepted login. The endpoint reports rejection
/// in the body rather than the status, so the status is not consulted.
pub fn login_accepted(body: &str) -> bool {
    body.contains(LOGIN_SUCCESS_MARKER)
}

/// Client for the remote account endpoint. Nothing here is cached.
#[derive(Clone, Debug)]
pub struct AccountClient {
    remote: RemoteClient,
}

impl AccountClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            remote: RemoteClient::new(config)?,
        })
    }
}

#[async_trait]
impl AccountApi for AccountClient {
    async fn login(&self, credentials: &Credentials) -> Result<bool> {
        let (status, body) = self.remote.post_for_text(LOGIN_PATH, credentials).await?;
        let accepted = login_accepted(&body);

        if accepted {
            info!("Account service accepted login for {}", credentials.email);
        } else {
            debug!(
                "Account service rejected login for {} (status {})",
                credentials.email, status
            );
        }
        Ok(accepted)
    }
}
