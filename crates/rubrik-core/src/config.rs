//! Configuration structures for Rubrik clients.
//!
//! This module provides the connection configuration for a Rubrik cluster:
//! where it lives, how to authenticate, and how to treat its TLS certificate.

use crate::client::RUBRIK_DEFAULT_TIMEOUT;
use crate::Error;
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Environment variable holding the cluster node IP or hostname.
pub const ENV_NODE_IP: &str = "rubrik_cdm_node_ip";
/// Environment variable holding the username.
pub const ENV_USERNAME: &str = "rubrik_cdm_username";
/// Environment variable holding the password.
pub const ENV_PASSWORD: &str = "rubrik_cdm_password";
/// Environment variable holding an API token.
pub const ENV_TOKEN: &str = "rubrik_cdm_token";

/// Configuration for a Rubrik client instance.
///
/// Credentials are optional: a freshly installed node accepts bootstrap
/// requests without authentication, and authenticated calls fail with
/// [`Error::ConfigError`] when nothing is configured.
#[derive(Debug, Clone, Validate)]
pub struct RubrikClientConfig {
    /// Node IP, hostname, or full base URL of the cluster
    #[validate(length(min = 1))]
    pub node_ip: String,

    /// Username for HTTP basic authentication
    #[validate(length(min = 1))]
    pub username: Option<String>,

    /// Password for HTTP basic authentication
    pub password: Option<SecretString>,

    /// API token, preferred over username/password when present
    pub api_token: Option<SecretString>,

    /// Whether to verify TLS certificates
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    pub tls_ca_cert: Option<PathBuf>,

    /// Default request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,
}

impl RubrikClientConfig {
    /// Create a new client configuration for the given node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node address is empty or cannot form a URL.
    pub fn new(node_ip: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            node_ip: node_ip.into(),
            username: None,
            password: None,
            api_token: None,
            tls_verify: false,
            tls_ca_cert: None,
            request_timeout_secs: RUBRIK_DEFAULT_TIMEOUT,
        };

        config.validate_config()?;
        Ok(config)
    }

    /// Build a configuration from the `rubrik_cdm_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `rubrik_cdm_node_ip` is unset or invalid.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let node_ip = lookup(ENV_NODE_IP).ok_or_else(|| {
            Error::ConfigError(format!("the `{ENV_NODE_IP}` environment variable is not set"))
        })?;

        let mut config = Self::new(node_ip)?;

        if let Some(token) = lookup(ENV_TOKEN) {
            config = config.with_api_token(token);
        }

        if let (Some(username), Some(password)) = (lookup(ENV_USERNAME), lookup(ENV_PASSWORD)) {
            config = config.with_credentials(username, password);
        }

        config.validate_config()?;
        Ok(config)
    }

    /// Set username/password credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the API token.
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns true if any credentials are configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.api_token.is_some() || (self.username.is_some() && self.password.is_some())
    }

    /// Base URL of the cluster, always ending in `/`.
    ///
    /// A bare IP or hostname is reached over HTTPS; a value with a scheme is
    /// used as given.
    ///
    /// # Errors
    ///
    /// Returns an error if the node address cannot be parsed as a URL.
    pub fn base_url(&self) -> Result<Url, Error> {
        let raw = if self.node_ip.contains("://") {
            self.node_ip.clone()
        } else {
            format!("https://{}", self.node_ip)
        };

        let mut url = Url::parse(&raw)
            .map_err(|e| Error::ConfigError(format!("Invalid node address `{}`: {e}", self.node_ip)))?;

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }

    /// Run field validation and confirm the base URL can be formed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first invalid field.
    pub fn validate_config(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;
        self.base_url().map(|_| ())
    }
}
