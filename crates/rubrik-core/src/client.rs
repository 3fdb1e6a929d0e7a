//! HTTP client settings.
//!
//! This module provides the HTTP-level configuration used when building the
//! reqwest client behind [`crate::HttpTransport`].

use std::time::Duration;

/// Default timeout for a single Rubrik API call, in seconds.
pub const RUBRIK_DEFAULT_TIMEOUT: u64 = 15;

/// Default timeout for establishing a TCP/TLS connection, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// HTTP client configuration.
///
/// Configures HTTP client behavior: the default request timeout, the
/// connection timeout and response compression.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout applied when a call does not provide its own
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(RUBRIK_DEFAULT_TIMEOUT),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
