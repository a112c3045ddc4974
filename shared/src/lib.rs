// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not found")]
    NotFound,
    #[error("could not reach the certificate service: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("certificate service returned status {0}")]
    Status(u16),
    #[error("unreadable response: {0}")]
    Decode(String),
    #[error("configuration: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    /// HTTP status reported by the remote, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status(code) => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
