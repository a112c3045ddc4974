use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
    pub session_ttl: Duration,
    pub accept_invalid_certs: bool,
    pub allowed_origins: Vec<String>,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 8080;
    const DEFAULT_API_BASE_URL: &str = "https://localhost:7246/api";
    const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
    const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;
    const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

    pub fn from_env() -> Self {
        Self::from_source(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source; `from_env` passes the process environment.
    pub fn from_source<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("AZCERT_API_BASE_URL")
            .unwrap_or_else(|| Self::DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            host: lookup("AZCERT_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            http_port: parse_or(&lookup, "AZCERT_HTTP_PORT", Self::DEFAULT_HTTP_PORT),
            api_base_url,
            request_timeout: Duration::from_millis(parse_or(
                &lookup,
                "AZCERT_REQUEST_TIMEOUT_MS",
                Self::DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "AZCERT_CACHE_TTL_SECS",
                Self::DEFAULT_CACHE_TTL_SECS,
            )),
            session_ttl: Duration::from_secs(parse_or(
                &lookup,
                "AZCERT_SESSION_TTL_SECS",
                Self::DEFAULT_SESSION_TTL_SECS,
            )),
            accept_invalid_certs: parse_or(&lookup, "AZCERT_ACCEPT_INVALID_CERTS", false),
            allowed_origins: lookup("AZCERT_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_source(|_| None)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "https://localhost:7246/api");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(!config.accept_invalid_certs);
        assert!(config.allows_any_origin());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_source(source(&[
            ("AZCERT_API_BASE_URL", "http://api.internal:9000/api/"),
            ("AZCERT_HTTP_PORT", "9090"),
            ("AZCERT_REQUEST_TIMEOUT_MS", "250"),
            ("AZCERT_ACCEPT_INVALID_CERTS", "true"),
            ("AZCERT_ALLOWED_ORIGINS", "https://az.example, https://admin.az.example"),
        ]));

        assert_eq!(config.api_base_url, "http://api.internal:9000/api");
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert!(config.accept_invalid_certs);
        assert_eq!(
            config.allowed_origins,
            vec!["https://az.example", "https://admin.az.example"]
        );
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = Config::from_source(source(&[
            ("AZCERT_HTTP_PORT", "not-a-port"),
            ("AZCERT_CACHE_TTL_SECS", "-5"),
        ]));
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }
}
