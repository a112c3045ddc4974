use super::ClientConfig;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use shared::{Error, Result};
use tracing::{debug, warn};

/// Thin JSON-over-HTTP wrapper around the remote API.
///
/// Every request is bounded by the configured timeout. Transport failures,
/// timeouts and non-success statuses map onto distinct `shared::Error` variants.
#[derive(Clone, Debug)]
pub struct RemoteClient {
    client: Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and parse the body as JSON. An empty body reads as `null`.
    pub async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = self.url(path);
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(Method::GET, &url, response)?;

        let bytes = response.bytes().await.map_err(transport_error)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Send a JSON body. Returns the response body when it is JSON, `None` otherwise.
    pub async fn send_json<B>(&self, method: Method, path: &str, body: &B) -> Result<Option<Value>>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let response = self
            .client
            .request(method.clone(), &url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(method, &url, response)?;

        Ok(read_optional_json(response).await)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(Method::DELETE, &url, response)?;
        Ok(())
    }

    /// POST a JSON body and hand back the status and raw text, whatever the status.
    pub async fn post_for_text<B>(&self, path: &str, body: &B) -> Result<(StatusCode, String)>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        Ok((status, text))
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::Transport(err.to_string())
    }
}

fn ensure_success(method: Method, url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!("{} {} failed with status {}", method, url, status);
        Err(Error::Status(status.as_u16()))
    }
}

// The write has already succeeded by the time this runs, so a missing or
// non-JSON body is not an error.
async fn read_optional_json(response: Response) -> Option<Value> {
    match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).ok(),
        Err(e) => {
            warn!("Failed to read response body after successful write: {}", e);
            None
        }
    }
}
