use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An administrator whose credentials the account service accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub email: String,
    pub authenticated_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            authenticated_at: Utc::now(),
        }
    }
}
