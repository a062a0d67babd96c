//! HTTP transport used by [`ReductClient`](crate::ReductClient) and [`Bucket`](crate::Bucket)

use crate::{ClientError, Config, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Method, Response};
use std::sync::Arc;
use tracing::debug;

/// MIME type of JSON request bodies
pub const MIME_JSON: &str = "application/json";

/// MIME type of raw record payloads
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// HTTP capability bound to a server base URL.
///
/// `path` is relative to the base URL and may carry a query string.
/// Implementations map non-2xx responses to a [`ClientError`] whose code is
/// the HTTP status, and connection failures to code -1. Timeouts and any
/// retry policy belong to the implementation.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET and return the response body
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// HEAD, no body is transferred
    async fn head(&self, path: &str) -> Result<()>;

    /// POST a body with the given MIME type
    async fn post(&self, path: &str, body: Bytes, mime: &str) -> Result<()>;

    /// PUT a body with the given MIME type
    async fn put(&self, path: &str, body: Bytes, mime: &str) -> Result<()>;

    /// DELETE
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Build the default transport for a configuration
pub fn build(config: &Config) -> Result<Arc<dyn HttpTransport>> {
    Ok(Arc::new(ReqwestTransport::new(config)?))
}

/// [`HttpTransport`] backed by a `reqwest` connection pool
pub struct ReqwestTransport {
    base_url: String,
    api_token: Option<String>,
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport for the configured server
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.base_url()?;

        let mut headers = header::HeaderMap::new();
        let user_agent = header::HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ClientError::client(format!("Invalid user agent: {}", e)))?;
        headers.insert(header::USER_AGENT, user_agent);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            http,
        })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<(Bytes, &str)>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method.clone(), &url);

        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }

        if let Some((data, mime)) = body {
            req = req.header(header::CONTENT_TYPE, mime).body(data);
        }

        debug!("Sending {} request to {}", method, url);
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("{} {} failed with {}", method, url, status);
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &text));
        }

        Ok(response)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let response = self.request(Method::GET, path, None).await?;
        Ok(response.bytes().await?)
    }

    async fn head(&self, path: &str) -> Result<()> {
        self.request(Method::HEAD, path, None).await?;
        Ok(())
    }

    async fn post(&self, path: &str, body: Bytes, mime: &str) -> Result<()> {
        self.request(Method::POST, path, Some((body, mime))).await?;
        Ok(())
    }

    async fn put(&self, path: &str, body: Bytes, mime: &str) -> Result<()> {
        self.request(Method::PUT, path, Some((body, mime))).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.request(Method::DELETE, path, None).await?;
        Ok(())
    }
}
