//! Core Lightning REST response shapes.

use polar_core::amount::msat_to_sat;
use polar_core::{Route, RouteHop};
use serde::{Deserialize, Deserializer};

/// A millisatoshi amount, sent either as a number or as `"<n>msat"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Msat(pub u64);

impl<'de> Deserialize<'de> for Msat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(msat) => Ok(Self(msat)),
            Raw::Text(text) => text
                .trim_end_matches("msat")
                .parse()
                .map(Self)
                .map_err(|_| serde::de::Error::custom(format!("invalid msat amount '{text}'"))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GetInfo {
    pub id: String,
    #[serde(default)]
    pub alias: String,
    pub color: Option<String>,
    #[serde(default)]
    pub num_peers: u32,
    #[serde(default)]
    pub num_pending_channels: u32,
    #[serde(default)]
    pub num_active_channels: u32,
    #[serde(default)]
    pub num_inactive_channels: u32,
    #[serde(default)]
    pub blockheight: u32,
    pub network: Option<String>,
    #[serde(default)]
    pub version: String,
    pub warning_bitcoind_sync: Option<String>,
    pub warning_lightningd_sync: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListFunds {
    #[serde(default)]
    pub outputs: Vec<FundOutput>,
    #[serde(default)]
    pub channels: Vec<FundChannel>,
}

#[derive(Debug, Deserialize)]
pub struct FundOutput {
    pub amount_msat: Msat,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct FundChannel {
    pub our_amount_msat: Msat,
}

impl ListFunds {
    /// Confirmed outputs plus our side of every channel, floored to sats.
    pub fn spendable_sat(&self) -> u64 {
        let outputs = self
            .outputs
            .iter()
            .filter(|output| output.status == "confirmed")
            .map(|output| output.amount_msat.0);
        let channels = self.channels.iter().map(|channel| channel.our_amount_msat.0);
        msat_to_sat(outputs.chain(channels).fold(0, u64::saturating_add))
    }
}

#[derive(Debug, Deserialize)]
pub struct PeerEntry {
    pub id: String,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub netaddr: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelEntry {
    pub short_channel_id: Option<String>,
    pub destination: Option<String>,
    #[serde(default)]
    pub active: bool,
    pub amount_msat: Option<Msat>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceEntry {
    pub label: Option<String>,
    pub bolt11: Option<String>,
    pub payment_hash: Option<String>,
    pub amount_msat: Option<Msat>,
    #[serde(default)]
    pub status: String,
    pub description: Option<String>,
    pub expires_at: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PayEntry {
    pub payment_hash: Option<String>,
    pub destination: Option<String>,
    pub amount_sent_msat: Option<Msat>,
    pub amount_msat: Option<Msat>,
    #[serde(default)]
    pub status: String,
    pub created_at: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedInvoice {
    pub payment_hash: String,
    pub bolt11: String,
    pub expires_at: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Pay {
    pub payment_hash: String,
    pub payment_preimage: String,
    pub amount_msat: Option<Msat>,
    pub amount_sent_msat: Option<Msat>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct FundChannelResult {
    pub txid: String,
    pub outnum: Option<u32>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloseResult {
    pub txid: Option<String>,
    #[serde(rename = "type")]
    pub close_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Decode {
    #[serde(default = "valid_default")]
    pub valid: bool,
    pub payee: Option<String>,
    pub payment_hash: Option<String>,
    pub amount_msat: Option<Msat>,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub expiry: u64,
    pub description: Option<String>,
}

const fn valid_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct GetRoute {
    #[serde(default)]
    pub route: Vec<GetRouteHop>,
}

#[derive(Debug, Deserialize)]
pub struct GetRouteHop {
    pub id: String,
    pub channel: String,
    pub amount_msat: Msat,
    #[serde(default)]
    pub delay: u32,
}

impl GetRoute {
    /// The route as a single normalized [`Route`], if any hops were returned.
    pub fn into_route(self) -> Option<Route> {
        let first = self.route.first()?;
        let last = self.route.last()?;
        let total_amt_msat = first.amount_msat.0;
        let total_fees_msat = total_amt_msat.saturating_sub(last.amount_msat.0);
        let total_time_lock = first.delay;

        let hops = self
            .route
            .into_iter()
            .map(|hop| RouteHop {
                pubkey: hop.id,
                channel: hop.channel,
                amount_msat: hop.amount_msat.0,
                expiry: hop.delay,
            })
            .collect();

        Some(Route {
            hops,
            total_amt_msat,
            total_fees_msat,
            total_time_lock,
        })
    }
}
