//! Client configuration

use crate::{ClientError, Result};
use std::time::Duration;
use url::Url;

/// Default server address
pub const DEFAULT_URL: &str = "http://127.0.0.1:8383";

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Server URL
    pub url: String,
    /// API token sent as a bearer token
    pub api_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            api_token: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("reduct-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Create a new config with the given server URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Build a config from `REDUCT_URL`, `REDUCT_API_TOKEN` and `REDUCT_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup("REDUCT_URL") {
            Some(url) => Self::new(url),
            None => Self::default(),
        };

        if let Some(token) = lookup("REDUCT_API_TOKEN").filter(|t| !t.is_empty()) {
            config = config.with_token(token);
        }

        if let Some(secs) = lookup("REDUCT_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClientError::client(format!("REDUCT_TIMEOUT_SECS must be a number of seconds, got '{}'", secs))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Set the API token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Parse and validate the server URL
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ClientError::client(format!(
                "Unsupported URL scheme '{}' in {}",
                scheme, self.url
            ))),
        }
    }
}
