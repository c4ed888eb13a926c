//! Normalized request results shared by all node clients.
//!
//! Listing records keep the backend's own JSON in `raw`, since the two
//! implementations expose different detail for the same concept.

use serde::{Deserialize, Serialize};
use serde_json::Value;


/// A connected (or known) peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// Peer identity public key.
    pub pubkey: String,
    /// Network address of the connection.
    pub address: Option<String>,
    /// Whether a connection is currently up.
    pub connected: bool,
    /// Backend JSON for this peer.
    pub raw: Value,
}

/// A payment channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Short channel id (CLN) or numeric channel id (LND).
    pub channel_id: Option<String>,
    /// Funding outpoint, `txid:index`, when known.
    pub channel_point: Option<String>,
    /// Remote node public key.
    pub peer_pubkey: Option<String>,
    /// Whether the channel is usable.
    pub active: bool,
    /// Backend state name, when reported.
    pub state: Option<String>,
    /// Channel capacity (satoshis).
    pub capacity_sat: Option<u64>,
    /// Local balance (satoshis).
    pub local_balance_sat: Option<u64>,
    /// Remote balance (satoshis).
    pub remote_balance_sat: Option<u64>,
    /// Backend JSON for this channel.
    pub raw: Value,
}

/// Lifecycle of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Waiting for payment.
    Open,
    /// HTLCs accepted but not yet settled (hold invoices).
    Accepted,
    /// Paid.
    Settled,
    /// Expired or canceled.
    Canceled,
    /// A state this crate does not know about.
    Unknown(String),
}

impl InvoiceStatus {
    /// Map a backend state name (`unpaid`, `paid`, `OPEN`, `SETTLED`, ...).
    pub fn from_backend(state: &str) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "unpaid" | "open" => Self::Open,
            "accepted" => Self::Accepted,
            "paid" | "settled" => Self::Settled,
            "expired" | "canceled" | "cancelled" => Self::Canceled,
            _ => Self::Unknown(state.to_string()),
        }
    }

    /// Whether the invoice can still be paid.
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Open | Self::Accepted)
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Accepted => write!(f, "accepted"),
            Self::Settled => write!(f, "settled"),
            Self::Canceled => write!(f, "canceled"),
            Self::Unknown(state) => write!(f, "{state}"),
        }
    }
}

/// An invoice issued by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Payment hash (hex).
    pub payment_hash: Option<String>,
    /// Label, CLN only.
    pub label: Option<String>,
    /// BOLT11 payment request.
    pub payment_request: Option<String>,
    /// Requested amount in whole satoshis; `None` for any-amount invoices.
    pub amount_sat: Option<u64>,
    /// Description / memo.
    pub description: Option<String>,
    /// Invoice state.
    pub status: InvoiceStatus,
    /// Creation time (unix seconds), when reported.
    pub created_at: Option<u64>,
    /// Expiry time (unix seconds), when reported.
    pub expires_at: Option<u64>,
    /// Backend JSON for this invoice.
    pub raw: Value,
}

/// Result of creating an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedInvoice {
    /// Payment hash (hex).
    pub payment_hash: String,
    /// BOLT11 payment request.
    pub payment_request: String,
    /// Expiry time (unix seconds), CLN only.
    pub expires_at: Option<u64>,
    /// Invoice add index, LND only.
    pub add_index: Option<u64>,
}

/// Outcome of an outgoing payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Completed successfully.
    Complete,
    /// Still in flight.
    Pending,
    /// Failed.
    Failed,
    /// A status this crate does not know about.
    Unknown(String),
}

impl PaymentStatus {
    /// Map a backend status name (`complete`, `SUCCEEDED`, `IN_FLIGHT`, ...).
    pub fn from_backend(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "complete" | "succeeded" => Self::Complete,
            "pending" | "in_flight" | "initiated" => Self::Pending,
            "failed" => Self::Failed,
            _ => Self::Unknown(status.to_string()),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Pending => write!(f, "pending"),
            Self::Failed => write!(f, "failed"),
            Self::Unknown(status) => write!(f, "{status}"),
        }
    }
}

/// An outgoing payment from the node's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment hash (hex).
    pub payment_hash: Option<String>,
    /// Destination node, when reported.
    pub destination: Option<String>,
    /// Amount sent including fees, in whole satoshis.
    pub amount_sent_sat: Option<u64>,
    /// Fees paid in whole satoshis, when reported.
    pub fee_sat: Option<u64>,
    /// Payment status.
    pub status: PaymentStatus,
    /// Creation time (unix seconds).
    pub created_at: Option<u64>,
    /// Backend JSON for this payment.
    pub raw: Value,
}

/// Result of paying an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    /// Payment hash (hex).
    pub payment_hash: String,
    /// Payment preimage (hex).
    pub payment_preimage: String,
    /// Amount sent including fees, in whole satoshis.
    pub amount_sent_sat: Option<u64>,
    /// Fees paid in whole satoshis, when reported.
    pub fee_sat: Option<u64>,
    /// Payment status.
    pub status: PaymentStatus,
}

/// Result of opening a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedChannel {
    /// Funding transaction id.
    pub funding_txid: String,
    /// Funding output index, when reported.
    pub output_index: Option<u32>,
    /// Channel id, CLN only.
    pub channel_id: Option<String>,
}

/// Result of closing a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedChannel {
    /// Closing transaction id, when already known.
    pub closing_txid: Option<String>,
    /// Close type (`mutual`, `unilateral`), CLN only.
    pub close_type: Option<String>,
}

/// A decoded BOLT11 payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedInvoice {
    /// Payment hash (hex).
    pub payment_hash: String,
    /// Payee public key.
    pub destination: String,
    /// Requested amount in whole satoshis; `None` for any-amount invoices.
    pub amount_sat: Option<u64>,
    /// Creation time (unix seconds).
    pub timestamp: u64,
    /// Expiry in seconds from `timestamp`.
    pub expiry: u64,
    /// Description, if not hashed.
    pub description: Option<String>,
}

/// One hop of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHop {
    /// Node this hop forwards to.
    pub pubkey: String,
    /// Channel used for this hop.
    pub channel: String,
    /// Amount delivered to this hop (millisatoshis).
    pub amount_msat: u64,
    /// CLTV expiry / delay at this hop.
    pub expiry: u32,
}

/// A route to a destination. Amounts stay in millisatoshis, the precision
/// fees are charged at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Hops in order from the first peer to the destination.
    pub hops: Vec<RouteHop>,
    /// Amount leaving this node including fees (millisatoshis).
    pub total_amt_msat: u64,
    /// Total fees (millisatoshis).
    pub total_fees_msat: u64,
    /// Absolute CLTV of the first hop.
    pub total_time_lock: u32,
}
