//! LND REST client.
//!
//! Resource paths under `/v1`, authenticated by the hex-encoded macaroon in
//! the `Grpc-Metadata-macaroon` header, over TLS pinned to the node's
//! certificate.

mod types;

use async_trait::async_trait;
use polar_core::amount::msat_to_sat;
use polar_core::{
    Channel, ChannelBalance, ChannelPoint, ClosedChannel, CreatedInvoice, DecodedInvoice, Error,
    Invoice, InvoiceStatus, LND_DEFAULT_REST_PORT, LightningImpl, NodeConfig, NodeInfo,
    OpenedChannel, Payment, PaymentResult, PaymentStatus, Peer, PeerAddress, PolarConfig, Result,
    Route, Scheme, WalletBalance,
};
use reqwest::header::{HeaderMap, HeaderName};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::auth::{self, AuthReport, CredentialRole};
use crate::tls;
use crate::transport::Transport;
use crate::{ClientOptions, InvoiceRequest, NodeClient};

/// Invoice expiry used when the request does not set one.
pub const DEFAULT_INVOICE_EXPIRY_SECS: u64 = 3600;

/// Client for an LND node's REST API.
#[derive(Debug, Clone)]
pub struct LndClient {
    transport: Transport,
    auth: AuthReport,
}

impl LndClient {
    /// Create a client for the LND node `name` in `config`.
    pub fn new(config: &PolarConfig, name: &str, options: &ClientOptions) -> Result<Self> {
        let node = config.node_of(name, LightningImpl::Lnd)?;
        Self::from_node(node, options)
    }

    /// Create a client from a single node's configuration.
    ///
    /// The REST port defaults to 8080. A missing macaroon leaves requests
    /// unauthenticated; see [`Self::auth`].
    pub fn from_node(node: &NodeConfig, options: &ClientOptions) -> Result<Self> {
        if node.implementation != LightningImpl::Lnd {
            return Err(Error::WrongImplementation {
                node: node.name.clone(),
                expected: LightningImpl::Lnd,
                actual: node.implementation,
            });
        }
        let port = node.rest_port.unwrap_or(LND_DEFAULT_REST_PORT);

        let mut report = AuthReport::new(&node.name);
        let mut headers = HeaderMap::new();

        let (macaroon, state) = auth::load_with(node.macaroon_path.as_deref(), auth::hex_header);
        report.record(CredentialRole::Macaroon, state);
        if let Some(macaroon) = macaroon {
            headers.insert(HeaderName::from_static("grpc-metadata-macaroon"), macaroon);
        }

        let (cert, state) = auth::load_with(node.cert_path.as_deref(), tls::pinned);
        report.record(CredentialRole::TlsCertificate, state);
        let builder = tls::configure_tls(
            options.http_builder().default_headers(headers),
            cert,
            node.effective_scheme() == Scheme::Https,
            options.insecure_tls,
            &mut report,
        )
        .map_err(|e| Error::Config(format!("invalid TLS setup for node '{}': {e}", node.name)))?;

        let http = builder.build().map_err(|e| {
            Error::Config(format!("failed to build HTTP client for node '{}': {e}", node.name))
        })?;
        let transport = Transport::new(node, port, http)?;
        debug!(
            node = %node.name,
            url = %transport.base_url(),
            auth = ?report.status(),
            "LND client ready"
        );

        Ok(Self {
            transport,
            auth: report,
        })
    }

    /// Issue `method` (GET, POST or DELETE) against `segments` under the base
    /// URL and return the JSON body.
    pub async fn request(
        &self,
        method: &str,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<Value> {
        let operation = format!("{} /{}", method.to_ascii_uppercase(), segments.join("/"));
        self.transport
            .scoped(&operation, async {
                let method = parse_method(method)?;
                let url = self.transport.endpoint(segments)?;
                self.fetch(method, &url, body).await
            })
            .await
    }

    /// On-chain wallet balance.
    pub async fn get_wallet_balance(&self) -> Result<WalletBalance> {
        self.transport
            .scoped("get_wallet_balance", self.wallet_balance())
            .await
    }

    /// Lightning channel balance.
    pub async fn get_channel_balance(&self) -> Result<ChannelBalance> {
        self.transport
            .scoped("get_channel_balance", self.channel_balance())
            .await
    }

    async fn wallet_balance(&self) -> Result<WalletBalance> {
        let balance: types::WalletBalance = self.get(&["v1", "balance", "blockchain"]).await?;
        Ok(WalletBalance {
            confirmed_balance: balance.confirmed_balance,
            unconfirmed_balance: balance.unconfirmed_balance,
            total_balance: balance.total_balance,
        })
    }

    async fn channel_balance(&self) -> Result<ChannelBalance> {
        let balance: types::ChannelBalance = self.get(&["v1", "balance", "channels"]).await?;
        Ok(ChannelBalance {
            balance: balance.balance,
            pending_open_balance: balance.pending_open_balance,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<T> {
        let text = self.transport.send(method, url, body).await?;
        self.transport.decode(url, &text)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.transport.endpoint(segments)?;
        self.fetch(Method::GET, &url, None).await
    }

    async fn post<T: DeserializeOwned>(&self, segments: &[&str], body: &Value) -> Result<T> {
        let url = self.transport.endpoint(segments)?;
        self.fetch(Method::POST, &url, Some(body)).await
    }

    async fn list<T: DeserializeOwned>(&self, url: &Url, key: &str) -> Result<Vec<(T, Value)>> {
        let value: Value = self.fetch(Method::GET, url, None).await?;
        let items = self.transport.take_items(url, value, key)?;
        self.transport.decode_items(url, items)
    }
}

fn parse_method(name: &str) -> Result<Method> {
    match name.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "DELETE" => Ok(Method::DELETE),
        other => Err(Error::Config(format!("unsupported HTTP method: {other}"))),
    }
}

#[async_trait]
impl NodeClient for LndClient {
    fn node_name(&self) -> &str {
        self.transport.node()
    }

    fn implementation(&self) -> LightningImpl {
        LightningImpl::Lnd
    }

    fn auth(&self) -> &AuthReport {
        &self.auth
    }

    async fn get_info(&self) -> Result<NodeInfo> {
        self.transport
            .scoped("get_info", async {
                let info: types::GetInfo = self.get(&["v1", "getinfo"]).await?;
                Ok(NodeInfo {
                    implementation: LightningImpl::Lnd,
                    identity_pubkey: info.identity_pubkey,
                    alias: info.alias,
                    color: info.color,
                    version: info.version,
                    num_peers: info.num_peers,
                    num_pending_channels: info.num_pending_channels,
                    num_active_channels: info.num_active_channels,
                    num_inactive_channels: info.num_inactive_channels,
                    block_height: info.block_height,
                    network: info.chains.into_iter().next().map(|chain| chain.network),
                    synced_to_chain: info.synced_to_chain,
                    synced_to_graph: Some(info.synced_to_graph),
                })
            })
            .await
    }

    async fn get_balance(&self) -> Result<u64> {
        self.transport
            .scoped("get_balance", async {
                let wallet = self.wallet_balance().await?;
                let channels = self.channel_balance().await?;
                Ok(wallet.spendable_with(&channels))
            })
            .await
    }

    async fn list_peers(&self) -> Result<Vec<Peer>> {
        self.transport
            .scoped("list_peers", async {
                let url = self.transport.endpoint(&["v1", "peers"])?;
                let peers = self.list::<types::PeerEntry>(&url, "peers").await?;
                Ok(peers
                    .into_iter()
                    .map(|(peer, raw)| Peer {
                        pubkey: peer.pub_key,
                        address: peer.address,
                        connected: true,
                        raw,
                    })
                    .collect())
            })
            .await
    }

    async fn list_channels(&self) -> Result<Vec<Channel>> {
        self.transport
            .scoped("list_channels", async {
                let url = self.transport.endpoint(&["v1", "channels"])?;
                let channels = self.list::<types::ChannelEntry>(&url, "channels").await?;
                Ok(channels
                    .into_iter()
                    .map(|(channel, raw)| Channel {
                        channel_id: channel.chan_id,
                        channel_point: channel.channel_point,
                        peer_pubkey: channel.remote_pubkey,
                        active: channel.active,
                        state: None,
                        capacity_sat: channel.capacity,
                        local_balance_sat: channel.local_balance,
                        remote_balance_sat: channel.remote_balance,
                        raw,
                    })
                    .collect())
            })
            .await
    }

    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<CreatedInvoice> {
        self.transport
            .scoped("create_invoice", async {
                let memo = request
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Invoice for {} sats", request.amount_sat));
                let expiry = request.expiry_secs.unwrap_or(DEFAULT_INVOICE_EXPIRY_SECS);
                let body = json!({
                    "value": request.amount_sat.to_string(),
                    "memo": memo,
                    "expiry": expiry.to_string(),
                });

                let invoice: types::AddInvoice = self.post(&["v1", "invoices"], &body).await?;
                Ok(CreatedInvoice {
                    payment_hash: types::hash_to_hex(&invoice.r_hash),
                    payment_request: invoice.payment_request,
                    expires_at: None,
                    add_index: invoice.add_index,
                })
            })
            .await
    }

    async fn pay_invoice(
        &self,
        payment_request: &str,
        amount_sat: Option<u64>,
    ) -> Result<PaymentResult> {
        self.transport
            .scoped("pay_invoice", async {
                let mut body = json!({ "payment_request": payment_request });
                if let Some(amount) = amount_sat.filter(|amount| *amount > 0) {
                    body["amt"] = json!(amount.to_string());
                }

                let sent: types::SendResponse =
                    self.post(&["v1", "channels", "transactions"], &body).await?;
                if !sent.payment_error.is_empty() {
                    return Err(self.transport.backend(sent.payment_error));
                }
                let route = sent.payment_route.as_ref();
                Ok(PaymentResult {
                    payment_hash: types::hash_to_hex(&sent.payment_hash),
                    payment_preimage: types::hash_to_hex(&sent.payment_preimage),
                    amount_sent_sat: route.and_then(|r| r.total_amt_msat).map(msat_to_sat),
                    fee_sat: route.and_then(|r| r.total_fees_msat).map(msat_to_sat),
                    status: PaymentStatus::Complete,
                })
            })
            .await
    }

    async fn list_invoices(&self, pending_only: bool) -> Result<Vec<Invoice>> {
        self.transport
            .scoped("list_invoices", async {
                let mut url = self.transport.endpoint(&["v1", "invoices"])?;
                if pending_only {
                    url.query_pairs_mut().append_pair("pending_only", "true");
                }
                let invoices = self.list::<types::InvoiceEntry>(&url, "invoices").await?;
                Ok(invoices
                    .into_iter()
                    .map(|(invoice, raw)| Invoice {
                        payment_hash: invoice.r_hash.as_deref().map(types::hash_to_hex),
                        label: None,
                        payment_request: invoice.payment_request,
                        amount_sat: invoice
                            .value_msat
                            .filter(|msat| *msat > 0)
                            .map(msat_to_sat),
                        description: invoice.memo,
                        status: InvoiceStatus::from_backend(&invoice.state),
                        created_at: invoice.creation_date,
                        expires_at: invoice
                            .creation_date
                            .zip(invoice.expiry)
                            .map(|(created, expiry)| created.saturating_add(expiry)),
                        raw,
                    })
                    .collect())
            })
            .await
    }

    async fn list_payments(&self) -> Result<Vec<Payment>> {
        self.transport
            .scoped("list_payments", async {
                let url = self.transport.endpoint(&["v1", "payments"])?;
                let payments = self.list::<types::PaymentEntry>(&url, "payments").await?;
                Ok(payments
                    .into_iter()
                    .map(|(payment, raw)| Payment {
                        destination: payment.destination(),
                        payment_hash: payment.payment_hash.as_deref().map(types::hash_to_hex),
                        amount_sent_sat: payment.value_msat.map(|value| {
                            msat_to_sat(value.saturating_add(payment.fee_msat.unwrap_or(0)))
                        }),
                        fee_sat: payment.fee_msat.map(msat_to_sat),
                        status: PaymentStatus::from_backend(&payment.status),
                        created_at: payment.creation_date,
                        raw,
                    })
                    .collect())
            })
            .await
    }

    async fn connect_peer(&self, peer: &PeerAddress) -> Result<()> {
        self.transport
            .scoped("connect_peer", async {
                let host = peer.host.as_deref().ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "LND needs a host to connect to peer {}; use pubkey@host:port",
                        peer.pubkey
                    ))
                })?;
                let body = json!({ "addr": { "pubkey": peer.pubkey, "host": host } });
                let _: Value = self.post(&["v1", "peers"], &body).await?;
                Ok(())
            })
            .await
    }

    async fn open_channel(
        &self,
        pubkey: &str,
        amount_sat: u64,
        push_sat: u64,
    ) -> Result<OpenedChannel> {
        self.transport
            .scoped("open_channel", async {
                let body = json!({
                    "node_pubkey_string": pubkey,
                    "local_funding_amount": amount_sat.to_string(),
                    "push_sat": push_sat.to_string(),
                });
                let point: types::ChannelPoint = self.post(&["v1", "channels"], &body).await?;
                let funding_txid = point
                    .txid()
                    .ok_or_else(|| self.transport.backend("no funding txid in response"))?;
                Ok(OpenedChannel {
                    funding_txid,
                    output_index: point.output_index,
                    channel_id: None,
                })
            })
            .await
    }

    async fn close_channel(&self, channel_id: &str, force: bool) -> Result<ClosedChannel> {
        self.transport
            .scoped("close_channel", async {
                let point: ChannelPoint = channel_id.parse()?;
                let index = point.output_index.to_string();
                let mut url = self
                    .transport
                    .endpoint(&["v1", "channels", &point.txid, &index])?;
                if force {
                    url.query_pairs_mut().append_pair("force", "true");
                }

                let line = self
                    .transport
                    .send_first_line(Method::DELETE, &url, None)
                    .await?;
                if line.trim().is_empty() {
                    return Ok(ClosedChannel {
                        closing_txid: None,
                        close_type: None,
                    });
                }
                let update: types::CloseUpdateLine = self.transport.decode(&url, &line)?;
                if let Some(error) = update.error {
                    return Err(self.transport.backend(error.message));
                }
                Ok(ClosedChannel {
                    closing_txid: update.result.and_then(|result| result.closing_txid()),
                    close_type: None,
                })
            })
            .await
    }

    async fn decode_invoice(&self, payment_request: &str) -> Result<DecodedInvoice> {
        self.transport
            .scoped("decode_invoice", async {
                let decoded: types::PayReq = self.get(&["v1", "payreq", payment_request]).await?;
                Ok(DecodedInvoice {
                    amount_sat: decoded.amount_msat().map(msat_to_sat),
                    payment_hash: types::hash_to_hex(&decoded.payment_hash),
                    destination: decoded.destination,
                    timestamp: decoded.timestamp,
                    expiry: decoded.expiry,
                    description: decoded.description.filter(|d| !d.is_empty()),
                })
            })
            .await
    }

    async fn get_route(&self, destination: &str, amount_sat: u64) -> Result<Vec<Route>> {
        self.transport
            .scoped("get_route", async {
                let body = json!({ "pub_key": destination, "amt": amount_sat.to_string() });
                let routes: types::QueryRoutes = self.post(&["v1", "graph", "routes"], &body).await?;
                Ok(routes.routes.into_iter().map(Route::from).collect())
            })
            .await
    }
}
