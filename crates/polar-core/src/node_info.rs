//! Node information structures.

use serde::{Deserialize, Serialize};

use crate::LightningImpl;

/// Identity and sync state of a node, independent of implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Implementation that produced this record.
    pub implementation: LightningImpl,
    /// Public key / identity pubkey.
    pub identity_pubkey: String,
    /// Node alias.
    pub alias: String,
    /// Node color, `#rrggbb`.
    pub color: Option<String>,
    /// Node version.
    pub version: String,
    /// Number of peers.
    pub num_peers: u32,
    /// Number of pending channels.
    pub num_pending_channels: u32,
    /// Number of active channels.
    pub num_active_channels: u32,
    /// Number of inactive channels.
    pub num_inactive_channels: u32,
    /// Block height.
    pub block_height: u32,
    /// Chain network (e.g., "regtest").
    pub network: Option<String>,
    /// Is synced to chain.
    pub synced_to_chain: bool,
    /// Is synced to graph, when the implementation reports it.
    pub synced_to_graph: Option<bool>,
}

/// On-chain wallet balance (satoshis).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Confirmed balance.
    pub confirmed_balance: u64,
    /// Unconfirmed balance.
    pub unconfirmed_balance: u64,
    /// Total balance.
    pub total_balance: u64,
}

/// Lightning channel balance (satoshis).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBalance {
    /// Spendable balance in open channels.
    pub balance: u64,
    /// Balance in channels still being opened.
    pub pending_open_balance: u64,
}

impl WalletBalance {
    /// Confirmed on-chain funds plus `channels`, excluding unconfirmed funds.
    pub const fn spendable_with(&self, channels: &ChannelBalance) -> u64 {
        self.confirmed_balance.saturating_add(channels.balance)
    }
}
