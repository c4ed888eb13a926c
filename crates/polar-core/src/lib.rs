//! Core types and configuration for Polar Lightning node clients.
//!
//! This crate provides node configuration and discovery, the normalized
//! records returned by every node client, amount conversions and the error
//! types used across the workspace.

pub mod amount;
mod config;
pub mod discovery;
mod error;
mod ids;
mod network;
mod node_info;
mod records;

pub use config::{DEFAULT_TIMEOUT_SECS, Settings};
pub use discovery::load_config;
pub use error::{Error, ErrorKind, Result};
pub use ids::{ChannelPoint, PeerAddress};
pub use network::{LND_DEFAULT_REST_PORT, LightningImpl, NodeConfig, PolarConfig, Scheme};
pub use node_info::{ChannelBalance, NodeInfo, WalletBalance};
pub use records::{
    Channel, ClosedChannel, CreatedInvoice, DecodedInvoice, Invoice, InvoiceStatus, OpenedChannel,
    Payment, PaymentResult, PaymentStatus, Peer, Route, RouteHop,
};
