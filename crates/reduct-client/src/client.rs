//! Main client implementation

use crate::{
    bucket::validate_name,
    transport::{self, HttpTransport, MIME_JSON},
    Bucket, ClientError, Config, Result, ServerInfo, Settings,
};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Reduct storage client
#[derive(Clone)]
pub struct ReductClient {
    base_url: String,
    http: Arc<dyn HttpTransport>,
}

impl fmt::Debug for ReductClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReductClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ReductClient {
    /// Create a new client with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let http = transport::build(&config)?;
        Ok(Self {
            base_url: config.url,
            http,
        })
    }

    /// Create with server URL and default settings
    pub fn with_url(url: &str) -> Result<Self> {
        Self::new(Config::new(url))
    }

    /// Create a client on top of a caller-supplied transport
    pub fn with_transport(url: impl Into<String>, http: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: url.into(),
            http,
        }
    }

    /// URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get information about the server
    #[instrument(skip(self))]
    pub async fn get_info(&self) -> Result<ServerInfo> {
        let body = self.http.get("/info").await?;
        ServerInfo::parse(&body)
    }

    /// Get a handle to an existing bucket.
    ///
    /// Only a HEAD probe is sent; a missing bucket yields a 404 error naming it.
    #[instrument(skip(self))]
    pub async fn get_bucket(&self, name: &str) -> Result<Bucket> {
        validate_name("Bucket", name)?;
        match self.http.head(&format!("/b/{}", name)).await {
            Ok(()) => Ok(self.bucket(name)),
            Err(err) if err.is_not_found() => {
                debug!("Bucket '{}' does not exist", name);
                Err(ClientError::new(err.code, format!("Bucket '{}' is not found", name)))
            }
            Err(err) => Err(err),
        }
    }

    /// Create a bucket with the given settings and return a handle to it
    #[instrument(skip(self))]
    pub async fn create_bucket(&self, name: &str, settings: Settings) -> Result<Bucket> {
        validate_name("Bucket", name)?;
        self.http
            .post(
                &format!("/b/{}", name),
                Bytes::from(settings.to_json_string()),
                MIME_JSON,
            )
            .await?;
        Ok(self.bucket(name))
    }

    fn bucket(&self, name: &str) -> Bucket {
        Bucket::new(&self.base_url, name, Arc::clone(&self.http))
    }
}
