//! Core Lightning REST client.
//!
//! Every RPC method is `POST /v1/<method>` with the parameters as a JSON
//! object, authenticated by a `Rune` header and, when configured, mutual TLS.

mod types;

use async_trait::async_trait;
use polar_core::amount::{msat_to_sat, sat_to_msat};
use polar_core::{
    Channel, ClosedChannel, CreatedInvoice, DecodedInvoice, Error, Invoice, InvoiceStatus,
    LightningImpl, NodeConfig, NodeInfo, OpenedChannel, Payment, PaymentResult, PaymentStatus,
    Peer, PeerAddress, PolarConfig, Result, Route, Scheme,
};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::auth::{self, AuthReport, CredentialRole};
use crate::tls;
use crate::transport::Transport;
use crate::{ClientOptions, InvoiceRequest, NodeClient};

/// Client for a Core Lightning node's REST gateway.
#[derive(Debug, Clone)]
pub struct CoreLightningClient {
    transport: Transport,
    auth: AuthReport,
}

impl CoreLightningClient {
    /// Create a client for the Core Lightning node `name` in `config`.
    pub fn new(config: &PolarConfig, name: &str, options: &ClientOptions) -> Result<Self> {
        let node = config.node_of(name, LightningImpl::CoreLightning)?;
        Self::from_node(node, options)
    }

    /// Create a client from a single node's configuration.
    ///
    /// Credentials are loaded here and never again. Absent or unusable
    /// credentials are recorded in [`Self::auth`] instead of failing.
    pub fn from_node(node: &NodeConfig, options: &ClientOptions) -> Result<Self> {
        if node.implementation != LightningImpl::CoreLightning {
            return Err(Error::WrongImplementation {
                node: node.name.clone(),
                expected: LightningImpl::CoreLightning,
                actual: node.implementation,
            });
        }
        let port = node.rest_port.ok_or_else(|| {
            Error::Config(format!("REST port not configured for node '{}'", node.name))
        })?;

        let mut report = AuthReport::new(&node.name);
        let mut headers = HeaderMap::new();

        let (rune, state) = auth::load_with(node.rune_path.as_deref(), auth::text_header);
        report.record(CredentialRole::Rune, state);
        if let Some(rune) = rune {
            headers.insert(HeaderName::from_static("rune"), rune);
        }

        let mut builder = options.http_builder().default_headers(headers);

        let (identity, state) = auth::identity(
            node.client_cert_path.as_deref(),
            node.client_key_path.as_deref(),
        );
        report.record(CredentialRole::ClientIdentity, state);
        if let Some(identity) = identity {
            builder = builder.identity(identity);
        }

        let (ca, state) = auth::load_with(node.ca_cert_path.as_deref(), tls::authority);
        report.record(CredentialRole::CaCertificate, state);
        builder = tls::configure_tls(
            builder,
            ca,
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
            "Core Lightning client ready"
        );

        Ok(Self {
            transport,
            auth: report,
        })
    }

    /// Call `method` with `params` and return the raw JSON result.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.transport
            .scoped(method, self.post(method, &params))
            .await
    }

    async fn post<T: DeserializeOwned>(&self, method: &str, params: &Value) -> Result<T> {
        let url = self.transport.endpoint(&["v1", method])?;
        let body = self.transport.send(Method::POST, &url, Some(params)).await?;
        self.transport.decode(&url, &body)
    }

    async fn list<T: DeserializeOwned>(&self, method: &str, key: &str) -> Result<Vec<(T, Value)>> {
        let url = self.transport.endpoint(&["v1", method])?;
        let body = self
            .transport
            .send(Method::POST, &url, Some(&json!({})))
            .await?;
        let value: Value = self.transport.decode(&url, &body)?;
        let items = self.transport.take_items(&url, value, key)?;
        self.transport.decode_items(&url, items)
    }
}

#[async_trait]
impl NodeClient for CoreLightningClient {
    fn node_name(&self) -> &str {
        self.transport.node()
    }

    fn implementation(&self) -> LightningImpl {
        LightningImpl::CoreLightning
    }

    fn auth(&self) -> &AuthReport {
        &self.auth
    }

    async fn get_info(&self) -> Result<NodeInfo> {
        self.transport
            .scoped("getinfo", async {
                let info: types::GetInfo = self.post("getinfo", &json!({})).await?;
                let synced =
                    info.warning_bitcoind_sync.is_none() && info.warning_lightningd_sync.is_none();
                Ok(NodeInfo {
                    implementation: LightningImpl::CoreLightning,
                    identity_pubkey: info.id,
                    alias: info.alias,
                    color: info.color.map(|color| {
                        if color.starts_with('#') {
                            color
                        } else {
                            format!("#{color}")
                        }
                    }),
                    version: info.version,
                    num_peers: info.num_peers,
                    num_pending_channels: info.num_pending_channels,
                    num_active_channels: info.num_active_channels,
                    num_inactive_channels: info.num_inactive_channels,
                    block_height: info.blockheight,
                    network: info.network,
                    synced_to_chain: synced,
                    synced_to_graph: None,
                })
            })
            .await
    }

    async fn get_balance(&self) -> Result<u64> {
        self.transport
            .scoped("listfunds", async {
                let funds: types::ListFunds = self.post("listfunds", &json!({})).await?;
                Ok(funds.spendable_sat())
            })
            .await
    }

    async fn list_peers(&self) -> Result<Vec<Peer>> {
        self.transport
            .scoped("listpeers", async {
                let peers = self.list::<types::PeerEntry>("listpeers", "peers").await?;
                Ok(peers
                    .into_iter()
                    .map(|(peer, raw)| Peer {
                        pubkey: peer.id,
                        address: peer.netaddr.into_iter().next(),
                        connected: peer.connected,
                        raw,
                    })
                    .collect())
            })
            .await
    }

    async fn list_channels(&self) -> Result<Vec<Channel>> {
        self.transport
            .scoped("listchannels", async {
                let channels = self
                    .list::<types::ChannelEntry>("listchannels", "channels")
                    .await?;
                Ok(channels
                    .into_iter()
                    .map(|(channel, raw)| Channel {
                        channel_id: channel.short_channel_id,
                        channel_point: None,
                        peer_pubkey: channel.destination,
                        active: channel.active,
                        state: None,
                        capacity_sat: channel.amount_msat.map(|msat| msat_to_sat(msat.0)),
                        local_balance_sat: None,
                        remote_balance_sat: None,
                        raw,
                    })
                    .collect())
            })
            .await
    }

    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<CreatedInvoice> {
        self.transport
            .scoped("invoice", async {
                let label = request.label.as_deref().ok_or_else(|| {
                    Error::InvalidInput("Core Lightning invoices require a label".to_string())
                })?;
                let amount_msat = if request.amount_sat == 0 {
                    json!("any")
                } else {
                    json!(sat_to_msat(request.amount_sat)?)
                };

                let mut params = Map::new();
                params.insert("amount_msat".into(), amount_msat);
                params.insert("label".into(), json!(label));
                params.insert(
                    "description".into(),
                    json!(request.description.as_deref().unwrap_or(label)),
                );
                if let Some(expiry) = request.expiry_secs {
                    params.insert("expiry".into(), json!(expiry));
                }

                let invoice: types::CreatedInvoice =
                    self.post("invoice", &Value::Object(params)).await?;
                Ok(CreatedInvoice {
                    payment_hash: invoice.payment_hash,
                    payment_request: invoice.bolt11,
                    expires_at: invoice.expires_at,
                    add_index: None,
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
            .scoped("pay", async {
                let mut params = json!({ "bolt11": payment_request });
                if let Some(amount) = amount_sat.filter(|amount| *amount > 0) {
                    params["amount_msat"] = json!(sat_to_msat(amount)?);
                }

                let pay: types::Pay = self.post("pay", &params).await?;
                let sent = pay.amount_sent_msat.map(|msat| msat.0);
                let fee = sent
                    .zip(pay.amount_msat)
                    .map(|(sent, amount)| sent.saturating_sub(amount.0));
                Ok(PaymentResult {
                    payment_hash: pay.payment_hash,
                    payment_preimage: pay.payment_preimage,
                    amount_sent_sat: sent.map(msat_to_sat),
                    fee_sat: fee.map(msat_to_sat),
                    status: PaymentStatus::from_backend(&pay.status),
                })
            })
            .await
    }

    async fn list_invoices(&self, pending_only: bool) -> Result<Vec<Invoice>> {
        self.transport
            .scoped("listinvoices", async {
                let invoices = self
                    .list::<types::InvoiceEntry>("listinvoices", "invoices")
                    .await?;
                Ok(invoices
                    .into_iter()
                    .map(|(invoice, raw)| Invoice {
                        payment_hash: invoice.payment_hash,
                        label: invoice.label,
                        payment_request: invoice.bolt11,
                        amount_sat: invoice.amount_msat.map(|msat| msat_to_sat(msat.0)),
                        description: invoice.description,
                        status: InvoiceStatus::from_backend(&invoice.status),
                        created_at: None,
                        expires_at: invoice.expires_at,
                        raw,
                    })
                    .filter(|invoice| !pending_only || invoice.status.is_pending())
                    .collect())
            })
            .await
    }

    async fn list_payments(&self) -> Result<Vec<Payment>> {
        self.transport
            .scoped("listpays", async {
                let pays = self.list::<types::PayEntry>("listpays", "pays").await?;
                Ok(pays
                    .into_iter()
                    .map(|(pay, raw)| {
                        let sent = pay.amount_sent_msat.map(|msat| msat.0);
                        Payment {
                            payment_hash: pay.payment_hash,
                            destination: pay.destination,
                            amount_sent_sat: sent.map(msat_to_sat),
                            fee_sat: sent
                                .zip(pay.amount_msat)
                                .map(|(sent, amount)| msat_to_sat(sent.saturating_sub(amount.0))),
                            status: PaymentStatus::from_backend(&pay.status),
                            created_at: pay.created_at,
                            raw,
                        }
                    })
                    .collect())
            })
            .await
    }

    async fn connect_peer(&self, peer: &PeerAddress) -> Result<()> {
        self.transport
            .scoped("connect", async {
                let _: Value = self.post("connect", &json!({ "id": peer.to_string() })).await?;
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
            .scoped("fundchannel", async {
                let mut params = json!({ "id": pubkey, "amount": amount_sat });
                if push_sat > 0 {
                    params["push_msat"] = json!(sat_to_msat(push_sat)?);
                }

                let funded: types::FundChannelResult = self.post("fundchannel", &params).await?;
                Ok(OpenedChannel {
                    funding_txid: funded.txid,
                    output_index: funded.outnum,
                    channel_id: funded.channel_id,
                })
            })
            .await
    }

    async fn close_channel(&self, channel_id: &str, force: bool) -> Result<ClosedChannel> {
        self.transport
            .scoped("close", async {
                if channel_id.trim().is_empty() {
                    return Err(Error::InvalidInput("channel id is empty".to_string()));
                }
                let mut params = json!({ "id": channel_id });
                if force {
                    params["unilateraltimeout"] = json!(1);
                }

                let closed: types::CloseResult = self.post("close", &params).await?;
                Ok(ClosedChannel {
                    closing_txid: closed.txid,
                    close_type: closed.close_type,
                })
            })
            .await
    }

    async fn decode_invoice(&self, payment_request: &str) -> Result<DecodedInvoice> {
        self.transport
            .scoped("decode", async {
                let decoded: types::Decode =
                    self.post("decode", &json!({ "string": payment_request })).await?;
                if !decoded.valid {
                    return Err(self.transport.backend("payment request is not valid"));
                }
                let (Some(payment_hash), Some(destination)) = (decoded.payment_hash, decoded.payee)
                else {
                    return Err(self.transport.backend("not a BOLT11 invoice"));
                };
                Ok(DecodedInvoice {
                    payment_hash,
                    destination,
                    amount_sat: decoded.amount_msat.map(|msat| msat_to_sat(msat.0)),
                    timestamp: decoded.created_at,
                    expiry: decoded.expiry,
                    description: decoded.description,
                })
            })
            .await
    }

    async fn get_route(&self, destination: &str, amount_sat: u64) -> Result<Vec<Route>> {
        self.transport
            .scoped("getroute", async {
                let params = json!({
                    "id": destination,
                    "amount_msat": sat_to_msat(amount_sat)?,
                    "riskfactor": 1.0,
                });
                let route: types::GetRoute = self.post("getroute", &params).await?;
                Ok(route.into_route().into_iter().collect())
            })
            .await
    }
}
