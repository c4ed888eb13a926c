//! Client construction options.

use std::time::Duration;

use polar_core::{DEFAULT_TIMEOUT_SECS, Settings};

/// Options shared by every node client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Upper bound on a single request, connect through body.
    pub timeout: Duration,
    /// Accept any server certificate when a node has no certificate configured.
    ///
    /// Only meant for local regtest networks with self-signed certificates.
    pub insecure_tls: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            insecure_tls: false,
        }
    }
}

impl ClientOptions {
    /// Options for a local simulated network: insecure TLS allowed.
    pub fn regtest() -> Self {
        Self {
            insecure_tls: true,
            ..Self::default()
        }
    }

    /// Options derived from persisted settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs.max(1)),
            insecure_tls: !settings.strict_tls,
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Allow or forbid insecure TLS.
    #[must_use]
    pub const fn with_insecure_tls(mut self, insecure: bool) -> Self {
        self.insecure_tls = insecure;
        self
    }

    pub(crate) fn http_builder(&self) -> reqwest::ClientBuilder {
        reqwest::Client::builder().timeout(self.timeout)
    }
}
