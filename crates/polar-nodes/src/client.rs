//! The operation set shared by both node clients.

use async_trait::async_trait;
use polar_core::{
    Channel, ClosedChannel, CreatedInvoice, DecodedInvoice, Invoice, LightningImpl, NodeInfo,
    OpenedChannel, Payment, PaymentResult, Peer, PeerAddress, PolarConfig, Result, Route,
};

use crate::{AuthReport, ClientOptions, CoreLightningClient, LndClient};

/// Parameters for a new invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceRequest {
    /// Amount in satoshis; 0 asks for an any-amount invoice.
    pub amount_sat: u64,
    /// Unique label. Required by Core Lightning, unused by LND.
    pub label: Option<String>,
    /// Description (CLN) or memo (LND).
    pub description: Option<String>,
    /// Expiry in seconds.
    pub expiry_secs: Option<u64>,
}

impl InvoiceRequest {
    /// Invoice for `amount_sat` satoshis.
    pub fn new(amount_sat: u64) -> Self {
        Self {
            amount_sat,
            ..Self::default()
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the description / memo.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the expiry.
    #[must_use]
    pub const fn with_expiry(mut self, secs: u64) -> Self {
        self.expiry_secs = Some(secs);
        self
    }
}

/// A client for one Lightning node.
///
/// Every operation issues a single HTTP request. Amounts at this interface
/// are whole satoshis unless a field says otherwise. Failures are wrapped in
/// [`polar_core::Error::Operation`] naming the node and operation.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Name of the node this client talks to.
    fn node_name(&self) -> &str;

    /// Implementation this client speaks.
    fn implementation(&self) -> LightningImpl;

    /// Credentials the client was built with.
    fn auth(&self) -> &AuthReport;

    /// Node identity and sync state.
    async fn get_info(&self) -> Result<NodeInfo>;

    /// Spendable balance: confirmed on-chain funds plus channel funds.
    async fn get_balance(&self) -> Result<u64>;

    /// Peers.
    async fn list_peers(&self) -> Result<Vec<Peer>>;

    /// Channels.
    async fn list_channels(&self) -> Result<Vec<Channel>>;

    /// Create an invoice.
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<CreatedInvoice>;

    /// Pay a BOLT11 invoice, with `amount_sat` for any-amount invoices.
    async fn pay_invoice(&self, payment_request: &str, amount_sat: Option<u64>)
    -> Result<PaymentResult>;

    /// Invoices, optionally only those still payable.
    async fn list_invoices(&self, pending_only: bool) -> Result<Vec<Invoice>>;

    /// Outgoing payments.
    async fn list_payments(&self) -> Result<Vec<Payment>>;

    /// Connect to a peer.
    async fn connect_peer(&self, peer: &PeerAddress) -> Result<()>;

    /// Open a channel to `pubkey`, pushing `push_sat` to the remote side.
    async fn open_channel(&self, pubkey: &str, amount_sat: u64, push_sat: u64)
    -> Result<OpenedChannel>;

    /// Close a channel. LND expects a `txid:index` channel point.
    async fn close_channel(&self, channel_id: &str, force: bool) -> Result<ClosedChannel>;

    /// Decode a BOLT11 payment request.
    async fn decode_invoice(&self, payment_request: &str) -> Result<DecodedInvoice>;

    /// Routes to `destination` for `amount_sat`.
    async fn get_route(&self, destination: &str, amount_sat: u64) -> Result<Vec<Route>>;
}

/// Build the client matching the configured implementation of `name`.
pub fn client_for(
    config: &PolarConfig,
    name: &str,
    options: &ClientOptions,
) -> Result<Box<dyn NodeClient>> {
    let node = config.node(name)?;
    Ok(match node.implementation {
        LightningImpl::CoreLightning => Box::new(CoreLightningClient::from_node(node, options)?),
        LightningImpl::Lnd => Box::new(LndClient::from_node(node, options)?),
    })
}
