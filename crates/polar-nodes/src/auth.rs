//! Credential loading.
//!
//! Credentials are read once, when a client is built. A credential that is
//! not configured or not on disk degrades the client (it proceeds without
//! it); a credential that exists but cannot be used is reported as invalid.
//! Neither aborts construction: the outcome is kept in an [`AuthReport`].

use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::header::HeaderValue;
use reqwest::Identity;
use serde::Serialize;
use tracing::{debug, warn};

/// What a credential is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CredentialRole {
    /// Core Lightning rune, sent as the `Rune` header.
    Rune,
    /// Core Lightning client certificate and key.
    ClientIdentity,
    /// Core Lightning CA certificate.
    CaCertificate,
    /// LND macaroon, sent hex-encoded as `Grpc-Metadata-macaroon`.
    Macaroon,
    /// LND TLS certificate.
    TlsCertificate,
}

impl fmt::Display for CredentialRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rune => write!(f, "rune"),
            Self::ClientIdentity => write!(f, "client certificate"),
            Self::CaCertificate => write!(f, "CA certificate"),
            Self::Macaroon => write!(f, "macaroon"),
            Self::TlsCertificate => write!(f, "TLS certificate"),
        }
    }
}

/// Load outcome of one credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Credential {
    /// Read and in use.
    Loaded(PathBuf),
    /// No path configured.
    NotConfigured,
    /// Path configured but nothing there.
    Missing(PathBuf),
    /// Present but unreadable or malformed.
    Invalid {
        /// Offending file.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },
}

impl Credential {
    /// Whether the credential is in use.
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(path) => write!(f, "loaded from {}", path.display()),
            Self::NotConfigured => write!(f, "not configured"),
            Self::Missing(path) => write!(f, "missing at {}", path.display()),
            Self::Invalid { path, reason } => write!(f, "invalid at {}: {reason}", path.display()),
        }
    }
}

/// Overall authentication state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthStatus {
    /// Every credential loaded.
    Complete,
    /// Some credentials absent; requests go out with reduced or no auth.
    Degraded,
    /// At least one credential exists but could not be used.
    Failed,
}

/// Credentials a client was built with.
#[derive(Debug, Clone, Serialize)]
pub struct AuthReport {
    node: String,
    credentials: Vec<(CredentialRole, Credential)>,
    insecure_tls: bool,
}

impl AuthReport {
    pub(crate) fn new(node: &str) -> Self {
        Self {
            node: node.to_string(),
            credentials: Vec::new(),
            insecure_tls: false,
        }
    }

    pub(crate) fn record(&mut self, role: CredentialRole, credential: Credential) {
        match &credential {
            Credential::Loaded(path) => {
                debug!(node = %self.node, %role, path = %path.display(), "credential loaded");
            }
            Credential::NotConfigured => {
                debug!(node = %self.node, %role, "credential not configured");
            }
            Credential::Missing(path) => {
                warn!(
                    node = %self.node,
                    %role,
                    path = %path.display(),
                    "credential file not found, continuing without it"
                );
            }
            Credential::Invalid { path, reason } => {
                warn!(
                    node = %self.node,
                    %role,
                    path = %path.display(),
                    %reason,
                    "credential could not be used, continuing without it"
                );
            }
        }
        self.credentials.push((role, credential));
    }

    pub(crate) fn mark_insecure(&mut self) {
        warn!(node = %self.node, "TLS certificate verification disabled");
        self.insecure_tls = true;
    }

    /// Outcome for `role`, if the client uses that credential.
    pub fn credential(&self, role: CredentialRole) -> Option<&Credential> {
        self.credentials
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, credential)| credential)
    }

    /// All credentials, in load order.
    pub fn credentials(&self) -> impl Iterator<Item = &(CredentialRole, Credential)> {
        self.credentials.iter()
    }

    /// Whether server certificates go unverified.
    pub const fn insecure_tls(&self) -> bool {
        self.insecure_tls
    }

    /// Overall status.
    pub fn status(&self) -> AuthStatus {
        if self
            .credentials
            .iter()
            .any(|(_, c)| matches!(c, Credential::Invalid { .. }))
        {
            AuthStatus::Failed
        } else if self.credentials.iter().all(|(_, c)| c.is_loaded()) {
            AuthStatus::Complete
        } else {
            AuthStatus::Degraded
        }
    }
}

/// Read the file at `path` and convert it with `parse`.
pub(crate) fn load_with<T, F>(path: Option<&Path>, parse: F) -> (Option<T>, Credential)
where
    F: FnOnce(Vec<u8>) -> Result<T, String>,
{
    let Some(path) = path else {
        return (None, Credential::NotConfigured);
    };
    if !path.exists() {
        return (None, Credential::Missing(path.to_path_buf()));
    }

    let parsed = std::fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(parse);
    match parsed {
        Ok(value) => (Some(value), Credential::Loaded(path.to_path_buf())),
        Err(reason) => (
            None,
            Credential::Invalid {
                path: path.to_path_buf(),
                reason,
            },
        ),
    }
}

/// A text token (rune) usable as a header value.
pub(crate) fn text_header(bytes: Vec<u8>) -> Result<HeaderValue, String> {
    let text = String::from_utf8(bytes).map_err(|_| "not valid UTF-8".to_string())?;
    let token = text.trim();
    if token.is_empty() {
        return Err("file is empty".to_string());
    }
    let mut value =
        HeaderValue::from_str(token).map_err(|_| "contains characters not allowed in a header".to_string())?;
    value.set_sensitive(true);
    Ok(value)
}

/// A binary token (macaroon), hex-encoded into a header value.
pub(crate) fn hex_header(bytes: Vec<u8>) -> Result<HeaderValue, String> {
    if bytes.is_empty() {
        return Err("file is empty".to_string());
    }
    let mut value = HeaderValue::from_str(&hex::encode(bytes)).map_err(|e| e.to_string())?;
    value.set_sensitive(true);
    Ok(value)
}

/// A client identity from a certificate and key pair.
pub(crate) fn identity(
    cert_path: Option<&Path>,
    key_path: Option<&Path>,
) -> (Option<Identity>, Credential) {
    match (cert_path, key_path) {
        (None, None) => (None, Credential::NotConfigured),
        (Some(path), None) | (None, Some(path)) => (
            None,
            Credential::Invalid {
                path: path.to_path_buf(),
                reason: "client certificate and key must both be configured".to_string(),
            },
        ),
        (Some(cert), Some(key)) => {
            if !key.exists() {
                return (None, Credential::Missing(key.to_path_buf()));
            }
            load_with(Some(cert), |mut pem| {
                let key_pem = std::fs::read(key).map_err(|e| e.to_string())?;
                pem.push(b'\n');
                pem.extend_from_slice(&key_pem);
                Identity::from_pem(&pem).map_err(|e| e.to_string())
            })
        }
    }
}
