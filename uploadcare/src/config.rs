//! Client configuration and credentials

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::{UploadcareError, UploadcareResult};

/// Default Upload API base URL
pub const DEFAULT_API_URL: &str = "https://upload.uploadcare.com";

/// Default CDN base URL used to build result URLs
pub const DEFAULT_CDN_URL: &str = "https://ucarecdn.com";

/// Default timeout for Upload API requests
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Delay between two `from_url/status/` polls
const DEFAULT_POLL_INTERVAL_MILLIS: u64 = 500;

/// Upper bound on `from_url/status/` polls for one upload
const DEFAULT_MAX_STATUS_POLLS: u32 = 240;

/// Public/secret key pair identifying an Uploadcare project
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    public_key: String,
    secret_key: Option<String>,
}

impl Credentials {
    /// Creates credentials for unsigned (public-key-only) uploads
    #[must_use]
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: None,
        }
    }

    /// Creates credentials that sign secure uploads
    #[must_use]
    pub fn with_secret(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: Some(secret_key.into()),
        }
    }

    /// The project public key
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// The project secret key, if secure uploads are enabled
    #[must_use]
    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref()
    }
}

// Keeps the secret key out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Upload API client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project credentials
    pub credentials: Credentials,
    /// Upload API base URL, without trailing slash
    pub api_url: String,
    /// CDN base URL, without trailing slash
    pub cdn_url: String,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Delay between two upload status polls
    pub poll_interval: Duration,
    /// Maximum number of upload status polls before giving up
    pub max_status_polls: u32,
}

impl ClientConfig {
    /// Creates a configuration with default endpoints
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            api_url: DEFAULT_API_URL.to_string(),
            cdn_url: DEFAULT_CDN_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MILLIS),
            max_status_polls: DEFAULT_MAX_STATUS_POLLS,
        }
    }

    /// Creates a configuration from `UPLOADCARE_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `UploadcareError::Config` if `UPLOADCARE_PUBLIC_KEY` is not set
    pub fn from_env() -> UploadcareResult<Self> {
        let public_key = env::var("UPLOADCARE_PUBLIC_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                UploadcareError::Config(
                    "UPLOADCARE_PUBLIC_KEY environment variable is not set".to_string(),
                )
            })?;

        let credentials = match env::var("UPLOADCARE_SECRET_KEY") {
            Ok(secret) if !secret.trim().is_empty() => Credentials::with_secret(public_key, secret),
            _ => Credentials::new(public_key),
        };

        let mut config = Self::new(credentials);
        if let Ok(api_url) = env::var("UPLOADCARE_API_URL") {
            config = config.with_api_url(api_url);
        }
        if let Ok(cdn_url) = env::var("UPLOADCARE_CDN_URL") {
            config = config.with_cdn_url(cdn_url);
        }
        if let Some(secs) = env::var("UPLOADCARE_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Overrides the Upload API base URL
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the CDN base URL
    #[must_use]
    pub fn with_cdn_url(mut self, cdn_url: impl Into<String>) -> Self {
        self.cdn_url = cdn_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the upload status polling cadence
    #[must_use]
    pub const fn with_polling(mut self, poll_interval: Duration, max_status_polls: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_status_polls = max_status_polls;
        self
    }

    /// Joins an endpoint path onto the API base URL
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "UPLOADCARE_PUBLIC_KEY",
            "UPLOADCARE_SECRET_KEY",
            "UPLOADCARE_API_URL",
            "UPLOADCARE_CDN_URL",
            "UPLOADCARE_TIMEOUT_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_config_from_env_requires_public_key() {
        clear_env();
        let result = ClientConfig::from_env();
        assert!(matches!(result, Err(UploadcareError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env();
        env::set_var("UPLOADCARE_PUBLIC_KEY", "demopublickey");

        let config = ClientConfig::from_env().expect("config should load");
        assert_eq!(config.credentials.public_key(), "demopublickey");
        assert_eq!(config.credentials.secret_key(), None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.cdn_url, DEFAULT_CDN_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_from_env_overrides() {
        clear_env();
        env::set_var("UPLOADCARE_PUBLIC_KEY", "demopublickey");
        env::set_var("UPLOADCARE_SECRET_KEY", "demosecretkey");
        env::set_var("UPLOADCARE_API_URL", "http://localhost:8080/");
        env::set_var("UPLOADCARE_TIMEOUT_SECS", "5");

        let config = ClientConfig::from_env().expect("config should load");
        assert_eq!(config.credentials.secret_key(), Some("demosecretkey"));
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        // Invalid timeout falls back to the default
        env::set_var("UPLOADCARE_TIMEOUT_SECS", "soon");
        let config = ClientConfig::from_env().expect("config should load");
        assert_eq!(config.request_timeout, Duration::from_secs(30));

        clear_env();
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ClientConfig::new(Credentials::new("key")).with_api_url("http://api.test/");
        assert_eq!(config.endpoint("/base/"), "http://api.test/base/");
        assert_eq!(config.endpoint("info/"), "http://api.test/info/");
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = Credentials::with_secret("public", "very-secret");
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
