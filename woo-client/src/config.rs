//! Client configuration

use crate::{ClientError, ClientResult};

/// REST API prefix appended to the site URL
pub const API_PREFIX: &str = "wp-json/wc/v3";

/// Connection settings for the remote commerce platform.
///
/// Every field may be absent: the application keeps working offline and
/// only the outbound call fails with [`ClientError::NotConfigured`].
#[derive(Clone, Default)]
pub struct WooConfig {
    /// Site URL (e.g., "https://shop.example.com")
    pub base_url: Option<String>,

    /// OAuth consumer key
    pub consumer_key: Option<String>,

    /// OAuth consumer secret
    pub consumer_secret: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl std::fmt::Debug for WooConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooConfig")
            .field("base_url", &self.base_url)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &self.consumer_secret.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Resolved credentials for one outbound call
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub base_url: &'a str,
    pub consumer_key: &'a str,
    pub consumer_secret: &'a str,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl WooConfig {
    /// Create a configuration for a site URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            consumer_key: None,
            consumer_secret: None,
            timeout: 30,
        }
    }

    /// Set the OAuth consumer key and secret
    pub fn with_credentials(
        mut self,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        self.consumer_key = Some(consumer_key.into());
        self.consumer_secret = Some(consumer_secret.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// All three settings are present
    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    /// Resolve credentials, failing with the first missing setting
    pub fn credentials(&self) -> ClientResult<Credentials<'_>> {
        let base_url = present(&self.base_url).ok_or(ClientError::NotConfigured("base URL"))?;
        let consumer_key =
            present(&self.consumer_key).ok_or(ClientError::NotConfigured("consumer key"))?;
        let consumer_secret =
            present(&self.consumer_secret).ok_or(ClientError::NotConfigured("consumer secret"))?;
        Ok(Credentials {
            base_url,
            consumer_key,
            consumer_secret,
        })
    }

    /// Create an HTTP client from this configuration
    pub fn build_client(&self) -> ClientResult<super::WooClient> {
        super::WooClient::new(self)
    }
}
