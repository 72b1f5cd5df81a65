use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::future::Future;
use url::Url;

/// Raw HTTP outcome: status code plus undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

impl WireResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to encode request: {0}")]
    Encode(String),
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Issues one JSON POST against the analysis backend.
///
/// Implementations must not retry: a single call is a single request.
pub trait Transport {
    fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> impl Future<Output = Result<WireResponse, TransportError>> + Send;
}

impl<T: Transport + Sync> Transport for &T {
    fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> impl Future<Output = Result<WireResponse, TransportError>> + Send {
        (**self).post_json(path, body)
    }
}

pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: Url, user_agent: &str) -> Result<Self, reqwest::Error> {
        // No timeout: the transport defaults apply.
        let client = Client::builder().user_agent(user_agent).build()?;

        Ok(Self { client, base_url })
    }

    /// Use a preconfigured client, e.g. one with custom proxy settings.
    pub fn with_client(base_url: Url, client: Client) -> Self {
        Self { client, base_url }
    }

    /// Join an absolute API path onto the base URL, keeping any base path prefix.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Transport for HttpTransport {
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<WireResponse, TransportError> {
        let url = self.endpoint(path);
        let payload =
            serde_json::to_vec(body).map_err(|e| TransportError::Encode(e.to_string()))?;

        debug!("POST {} ({} bytes)", url, payload.len());

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        debug!("POST {} -> {} ({} bytes)", url, status, body.len());

        Ok(WireResponse { status, body })
    }
}
