//! LND REST response shapes.
//!
//! The REST gateway encodes 64-bit integers as strings and byte fields as
//! base64, so most numeric fields accept either form.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use polar_core::{Route, RouteHop};
use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

#[derive(Debug, Deserialize)]
pub struct GetInfo {
    pub identity_pubkey: String,
    #[serde(default)]
    pub alias: String,
    pub color: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub num_peers: u32,
    #[serde(default)]
    pub num_pending_channels: u32,
    #[serde(default)]
    pub num_active_channels: u32,
    #[serde(default)]
    pub num_inactive_channels: u32,
    #[serde(default)]
    pub block_height: u32,
    #[serde(default)]
    pub synced_to_chain: bool,
    #[serde(default)]
    pub synced_to_graph: bool,
    #[serde(default)]
    pub chains: Vec<Chain>,
}

#[derive(Debug, Deserialize)]
pub struct Chain {
    pub network: String,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct WalletBalance {
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub confirmed_balance: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub unconfirmed_balance: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub total_balance: u64,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct ChannelBalance {
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub balance: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub pending_open_balance: u64,
}

#[derive(Debug, Deserialize)]
pub struct PeerEntry {
    pub pub_key: String,
    pub address: Option<String>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct ChannelEntry {
    #[serde(default)]
    pub active: bool,
    pub remote_pubkey: Option<String>,
    pub channel_point: Option<String>,
    pub chan_id: Option<String>,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub capacity: Option<u64>,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub local_balance: Option<u64>,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub remote_balance: Option<u64>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct AddInvoice {
    pub r_hash: String,
    pub payment_request: String,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub add_index: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub payment_error: String,
    #[serde(default)]
    pub payment_preimage: String,
    #[serde(default)]
    pub payment_hash: String,
    pub payment_route: Option<PaymentRoute>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct PaymentRoute {
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub total_amt_msat: Option<u64>,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub total_fees_msat: Option<u64>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct InvoiceEntry {
    pub memo: Option<String>,
    pub r_hash: Option<String>,
    pub payment_request: Option<String>,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub value_msat: Option<u64>,
    #[serde(default)]
    pub state: String,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub creation_date: Option<u64>,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub expiry: Option<u64>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct PaymentEntry {
    pub payment_hash: Option<String>,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub value_msat: Option<u64>,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub fee_msat: Option<u64>,
    #[serde(default)]
    pub status: String,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub creation_date: Option<u64>,
    #[serde(default)]
    pub htlcs: Vec<PaymentHtlc>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentHtlc {
    pub route: Option<HtlcRoute>,
}

#[derive(Debug, Deserialize)]
pub struct HtlcRoute {
    #[serde(default)]
    pub hops: Vec<HtlcHop>,
}

#[derive(Debug, Deserialize)]
pub struct HtlcHop {
    pub pub_key: Option<String>,
}

impl PaymentEntry {
    /// Final hop of the first attempt, the only place LND names the destination.
    pub fn destination(&self) -> Option<String> {
        self.htlcs
            .iter()
            .find_map(|htlc| htlc.route.as_ref()?.hops.last()?.pub_key.clone())
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct ChannelPoint {
    pub funding_txid_str: Option<String>,
    pub funding_txid_bytes: Option<String>,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub output_index: Option<u32>,
}

impl ChannelPoint {
    /// Funding txid in display order.
    pub fn txid(&self) -> Option<String> {
        self.funding_txid_str
            .clone()
            .or_else(|| self.funding_txid_bytes.as_deref().map(txid_from_bytes))
    }
}

/// One line of the close-channel update stream.
#[derive(Debug, Deserialize)]
pub struct CloseUpdateLine {
    pub result: Option<CloseUpdate>,
    pub error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
pub struct CloseUpdate {
    pub close_pending: Option<PendingUpdate>,
    pub chan_close: Option<ChannelCloseUpdate>,
}

#[derive(Debug, Deserialize)]
pub struct PendingUpdate {
    pub txid: String,
}

#[derive(Debug, Deserialize)]
pub struct ChannelCloseUpdate {
    pub closing_txid: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamError {
    #[serde(default)]
    pub message: String,
}

impl CloseUpdate {
    /// Closing txid in display order, when the update carries one.
    pub fn closing_txid(&self) -> Option<String> {
        self.close_pending
            .as_ref()
            .map(|pending| pending.txid.as_str())
            .or_else(|| self.chan_close.as_ref().map(|c| c.closing_txid.as_str()))
            .map(txid_from_bytes)
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct PayReq {
    pub destination: String,
    pub payment_hash: String,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub num_satoshis: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub num_msat: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub timestamp: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub expiry: u64,
    pub description: Option<String>,
}

impl PayReq {
    /// Requested amount, `None` for any-amount requests.
    pub fn amount_msat(&self) -> Option<u64> {
        let msat = if self.num_msat > 0 {
            self.num_msat
        } else {
            self.num_satoshis.saturating_mul(1000)
        };
        (msat > 0).then_some(msat)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryRoutes {
    #[serde(default)]
    pub routes: Vec<LndRoute>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct LndRoute {
    #[serde(default)]
    pub total_time_lock: u32,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub total_fees_msat: u64,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub total_amt_msat: u64,
    #[serde(default)]
    pub hops: Vec<LndHop>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct LndHop {
    #[serde(default)]
    pub chan_id: String,
    #[serde(default)]
    pub expiry: u32,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub amt_to_forward_msat: u64,
    #[serde(default)]
    pub pub_key: String,
}

impl From<LndRoute> for Route {
    fn from(route: LndRoute) -> Self {
        Self {
            hops: route
                .hops
                .into_iter()
                .map(|hop| RouteHop {
                    pubkey: hop.pub_key,
                    channel: hop.chan_id,
                    amount_msat: hop.amt_to_forward_msat,
                    expiry: hop.expiry,
                })
                .collect(),
            total_amt_msat: route.total_amt_msat,
            total_fees_msat: route.total_fees_msat,
            total_time_lock: route.total_time_lock,
        }
    }
}

fn decode_base64(value: &str) -> Option<Vec<u8>> {
    STANDARD
        .decode(value)
        .or_else(|_| URL_SAFE.decode(value))
        .ok()
}

fn is_hex_hash(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// A hash field as lowercase hex; LND sends either hex or base64.
pub fn hash_to_hex(value: &str) -> String {
    if is_hex_hash(value) {
        return value.to_ascii_lowercase();
    }
    decode_base64(value).map_or_else(|| value.to_string(), hex::encode)
}

/// A txid in display order; byte fields hold it reversed.
pub fn txid_from_bytes(value: &str) -> String {
    if is_hex_hash(value) {
        return value.to_ascii_lowercase();
    }
    decode_base64(value).map_or_else(
        || value.to_string(),
        |mut bytes| {
            bytes.reverse();
            hex::encode(bytes)
        },
    )
}
