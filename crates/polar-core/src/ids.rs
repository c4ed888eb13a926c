//! Channel and peer identifiers parsed from user input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A funding outpoint, written `txid:output_index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelPoint {
    /// Funding transaction id (hex, display byte order).
    pub txid: String,
    /// Funding output index.
    pub output_index: u32,
}

impl FromStr for ChannelPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (txid, index) = s.trim().split_once(':').ok_or_else(|| {
            Error::InvalidInput(format!(
                "channel point '{s}' must be formatted as txid:output_index"
            ))
        })?;

        if txid.len() != 64 || !txid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidInput(format!(
                "channel point '{s}' has an invalid txid (expected 64 hex characters)"
            )));
        }

        let output_index = index.parse::<u32>().map_err(|_| {
            Error::InvalidInput(format!(
                "channel point '{s}' has an invalid output index '{index}'"
            ))
        })?;

        Ok(Self {
            txid: txid.to_ascii_lowercase(),
            output_index,
        })
    }
}

impl fmt::Display for ChannelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.output_index)
    }
}

/// A peer to connect to: `pubkey` or `pubkey@host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAddress {
    /// Peer identity public key (hex).
    pub pubkey: String,
    /// Network address, `host:port`.
    pub host: Option<String>,
}

impl PeerAddress {
    /// Build an address from a pubkey and an optional host and port.
    pub fn new(pubkey: impl Into<String>, host: Option<&str>, port: Option<u16>) -> Self {
        let host = match (host, port) {
            (Some(host), Some(port)) => Some(format!("{host}:{port}")),
            (Some(host), None) => Some(host.to_string()),
            _ => None,
        };
        Self {
            pubkey: pubkey.into(),
            host,
        }
    }
}

impl FromStr for PeerAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (pubkey, host) = match s.split_once('@') {
            Some((pubkey, host)) if !host.is_empty() => (pubkey, Some(host.to_string())),
            Some(_) => {
                return Err(Error::InvalidInput(format!("peer address '{s}' has an empty host")));
            }
            None => (s, None),
        };

        if pubkey.is_empty() {
            return Err(Error::InvalidInput(format!(
                "peer address '{s}' has an empty public key"
            )));
        }

        Ok(Self {
            pubkey: pubkey.to_string(),
            host,
        })
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Some(host) => write!(f, "{}@{}", self.pubkey, host),
            None => write!(f, "{}", self.pubkey),
        }
    }
}
