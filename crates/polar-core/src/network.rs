//! Network and node configuration types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{Error, Result};

/// Default REST port for an LND node when none is configured.
pub const LND_DEFAULT_REST_PORT: u16 = 8080;

/// A set of Lightning nodes reachable from this machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolarConfig {
    /// Nodes keyed by name.
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeConfig>,
    /// Polar home directory the nodes were discovered under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polar_home: Option<PathBuf>,
    /// Name of the simulated network, if discovered from disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,
}

impl PolarConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, replacing any node with the same name.
    pub fn add_node(&mut self, node: NodeConfig) {
        self.nodes.insert(node.name.clone(), node);
    }

    /// Look up a node by name.
    pub fn node(&self, name: &str) -> Result<&NodeConfig> {
        self.nodes
            .get(name)
            .ok_or_else(|| Error::NodeNotFound(name.to_string()))
    }

    /// Look up a node by name and require it to run `implementation`.
    pub fn node_of(&self, name: &str, implementation: LightningImpl) -> Result<&NodeConfig> {
        let node = self.node(name)?;
        if node.implementation != implementation {
            return Err(Error::WrongImplementation {
                node: name.to_string(),
                expected: implementation,
                actual: node.implementation,
            });
        }
        Ok(node)
    }

    /// Check if no nodes are configured.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Connection settings for a single node.
///
/// Which credential fields are meaningful depends on `implementation`:
/// LND uses `macaroon_path` and `cert_path`, Core Lightning uses
/// `rune_path` and the three PEM paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name.
    pub name: String,
    /// Node implementation.
    pub implementation: LightningImpl,
    /// Host the node's APIs listen on.
    #[serde(default = "default_host")]
    pub rpc_host: String,
    /// gRPC (LND) or RPC port; 0 when unused.
    #[serde(default)]
    pub rpc_port: u16,
    /// REST API port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_port: Option<u16>,
    /// URL scheme override for the REST API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,

    /// LND macaroon file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macaroon_path: Option<PathBuf>,
    /// LND TLS certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<PathBuf>,

    /// Core Lightning rune file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rune_path: Option<PathBuf>,
    /// Core Lightning client certificate (mTLS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_cert_path: Option<PathBuf>,
    /// Core Lightning client key (mTLS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key_path: Option<PathBuf>,
    /// Core Lightning CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<PathBuf>,
    /// Core Lightning unix socket (informational, not used by the REST client).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl NodeConfig {
    /// Create a node with no ports or credentials.
    pub fn new(name: impl Into<String>, implementation: LightningImpl) -> Self {
        Self {
            name: name.into(),
            implementation,
            rpc_host: default_host(),
            rpc_port: 0,
            rest_port: None,
            scheme: None,
            macaroon_path: None,
            cert_path: None,
            rune_path: None,
            client_cert_path: None,
            client_key_path: None,
            ca_cert_path: None,
            socket_path: None,
        }
    }

    /// Set the REST host and port.
    #[must_use]
    pub fn with_rest(mut self, host: impl Into<String>, port: u16) -> Self {
        self.rpc_host = host.into();
        self.rest_port = Some(port);
        self
    }

    /// Set the URL scheme explicitly.
    #[must_use]
    pub const fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Scheme used for the REST API.
    ///
    /// LND always serves TLS. Core Lightning is assumed to serve TLS only
    /// when some TLS material is configured for it.
    pub fn effective_scheme(&self) -> Scheme {
        if let Some(scheme) = self.scheme {
            return scheme;
        }
        match self.implementation {
            LightningImpl::Lnd => Scheme::Https,
            LightningImpl::CoreLightning => {
                if self.ca_cert_path.is_some() || self.client_cert_path.is_some() {
                    Scheme::Https
                } else {
                    Scheme::Http
                }
            }
        }
    }

    /// REST host:port, for display.
    pub fn rest_host(&self) -> Option<String> {
        self.rest_port.map(|port| format!("{}:{}", self.rpc_host, port))
    }
}

/// URL scheme of a REST endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Scheme as used in a URL.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(Error::Config(format!("unknown URL scheme: {other}"))),
        }
    }
}

/// Lightning implementation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightningImpl {
    /// LND (Lightning Network Daemon).
    #[serde(rename = "LND")]
    Lnd,
    /// Core Lightning.
    #[serde(rename = "CLN")]
    CoreLightning,
}

impl LightningImpl {
    /// Get all available Lightning implementations.
    pub fn all() -> &'static [Self] {
        &[Self::Lnd, Self::CoreLightning]
    }

    /// Get the short name for this implementation.
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::Lnd => "lnd",
            Self::CoreLightning => "cln",
        }
    }
}

impl std::fmt::Display for LightningImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lnd => write!(f, "LND"),
            Self::CoreLightning => write!(f, "Core Lightning"),
        }
    }
}

impl FromStr for LightningImpl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lnd" => Ok(Self::Lnd),
            "cln" | "c-lightning" | "core-lightning" | "corelightning" => Ok(Self::CoreLightning),
            other => Err(Error::Config(format!(
                "unknown lightning implementation: {other}"
            ))),
        }
    }
}
