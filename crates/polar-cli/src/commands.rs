//! Command handlers.

use std::fmt::Display;

use anyhow::Result;
use colored::Colorize;
use polar_core::{NodeInfo, PolarConfig, Settings, discovery};
use polar_nodes::{AuthStatus, ClientOptions, InvoiceRequest, LndClient, NodeClient, client_for};
use serde::Serialize;
use serde_json::json;

use crate::cli::{ConfigAction, LndAction, NodeAction};
use crate::table::{Table, or_na, sats, short};

/// Where results go: JSON on stdout or human-readable tables.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as JSON, or hand it to `human`.
    pub fn emit<T: Serialize>(self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}

fn field(label: &str, value: impl Display) {
    println!("{} {value}", format!("{label}:").cyan());
}

fn success(message: &str) {
    println!("{}", format!("✓ {message}").green());
}

pub fn status_label(status: AuthStatus) -> String {
    match status {
        AuthStatus::Complete => "complete".green().to_string(),
        AuthStatus::Degraded => "degraded".yellow().to_string(),
        AuthStatus::Failed => "failed".red().to_string(),
    }
}

/// List configured nodes with their REST endpoint and credential state.
pub fn nodes(config: &PolarConfig, options: &ClientOptions, out: Output) -> Result<()> {
    let entries: Vec<_> = config
        .nodes
        .values()
        .map(|node| {
            let client = client_for(config, &node.name, options);
            json!({
                "name": node.name,
                "implementation": node.implementation,
                "rest": node.rest_host(),
                "scheme": node.effective_scheme(),
                "auth": client.as_ref().ok().map(|c| c.auth()),
                "error": client.as_ref().err().map(ToString::to_string),
            })
        })
        .collect();

    out.emit(&entries, |_| {
        let title = config
            .network_name
            .as_ref()
            .map_or_else(|| "Nodes".to_string(), |network| format!("Nodes - {network}"));
        let mut table = Table::new(title, &["Name", "Implementation", "REST", "Auth"]);
        for node in config.nodes.values() {
            let auth = match client_for(config, &node.name, options) {
                Ok(client) => status_label(client.auth().status()),
                Err(e) => e.to_string().red().to_string(),
            };
            let rest = node.rest_host().map_or_else(
                || "not configured".to_string(),
                |host| format!("{}://{host}", node.effective_scheme().as_str()),
            );
            table.row(vec![
                node.name.clone(),
                node.implementation.to_string(),
                rest,
                auth,
            ]);
        }
        table.print();
    })
}

/// List Polar networks under the configured home.
pub fn networks(settings: &Settings, out: Output) -> Result<()> {
    let home = discovery::home_for(settings);
    let networks = discovery::find_networks(&home)?;
    let report = json!({ "home": home, "networks": networks });

    out.emit(&report, |_| {
        let mut table = Table::new(format!("Networks - {}", home.display()), &["Name", ""]);
        for name in &networks {
            let selected = if settings.network.as_deref() == Some(name.as_str()) {
                "selected".green().to_string()
            } else {
                String::new()
            };
            table.row(vec![name.clone(), selected]);
        }
        table.print();
    })
}

pub fn config(action: &ConfigAction, settings: &Settings, out: Output) -> Result<()> {
    let path = Settings::config_path()?;
    match action {
        ConfigAction::Show => out.emit(settings, |settings| {
            field("Settings file", path.display());
            field("Polar home", discovery::home_for(settings).display());
            field("Network", or_na(settings.network.as_deref()));
            field("Timeout", format!("{}s", settings.timeout_secs));
            field("Strict TLS", settings.strict_tls);
        }),
        ConfigAction::Save => {
            settings.save_to(&path)?;
            out.emit(&json!({ "saved": path }), |_| {
                success(&format!("Settings saved to {}", path.display()));
            })
        }
    }
}

fn info_table(node: &str, info: &NodeInfo) -> Table {
    let mut table = Table::new(
        format!("{} Node Info - {node}", info.implementation),
        &["Property", "Value"],
    );
    let rows = [
        ("Public Key", info.identity_pubkey.clone()),
        ("Alias", info.alias.clone()),
        ("Color", or_na(info.color.as_deref())),
        ("Version", info.version.clone()),
        ("Network", or_na(info.network.as_deref())),
        ("Block Height", info.block_height.to_string()),
        ("Peers", info.num_peers.to_string()),
        ("Active Channels", info.num_active_channels.to_string()),
        ("Pending Channels", info.num_pending_channels.to_string()),
        ("Inactive Channels", info.num_inactive_channels.to_string()),
        ("Synced to Chain", info.synced_to_chain.to_string()),
        ("Synced to Graph", or_na(info.synced_to_graph)),
    ];
    for (label, value) in rows {
        table.row(vec![label.to_string(), value]);
    }
    table
}

/// Run an operation both implementations support.
#[allow(clippy::too_many_lines)]
pub async fn node_action(client: &dyn NodeClient, action: NodeAction, out: Output) -> Result<()> {
    let node = client.node_name().to_string();
    let kind = client.implementation();

    match action {
        NodeAction::Info => {
            let info = client.get_info().await?;
            out.emit(&info, |info| info_table(&node, info).print())
        }
        NodeAction::Balance => {
            let balance = client.get_balance().await?;
            out.emit(&json!({ "node": &node, "balance_sat": balance }), |_| {
                println!("{}", format!("Node {node} balance: {} sats", sats(balance)).green());
            })
        }
        NodeAction::Channels => {
            let channels = client.list_channels().await?;
            out.emit(&channels, |channels| {
                let mut table = Table::new(format!("{kind} Channels - {node}"), &[
                    "Channel ID",
                    "Peer",
                    "State",
                    "Capacity",
                    "Local Balance",
                ])
                .limited("channels");
                for channel in channels {
                    let state = channel.state.clone().unwrap_or_else(|| {
                        String::from(if channel.active { "active" } else { "inactive" })
                    });
                    table.row(vec![
                        or_na(channel.channel_id.as_deref()),
                        channel
                            .peer_pubkey
                            .as_deref()
                            .map_or_else(|| "N/A".to_string(), |pk| short(pk, 20)),
                        state,
                        or_na(channel.capacity_sat.map(sats)),
                        or_na(channel.local_balance_sat.map(sats)),
                    ]);
                }
                table.print();
            })
        }
        NodeAction::Peers => {
            let peers = client.list_peers().await?;
            out.emit(&peers, |peers| {
                let mut table = Table::new(format!("{kind} Peers - {node}"), &[
                    "Public Key",
                    "Address",
                    "Connected",
                ])
                .limited("peers");
                for peer in peers {
                    table.row(vec![
                        short(&peer.pubkey, 20),
                        or_na(peer.address.as_deref()),
                        peer.connected.to_string(),
                    ]);
                }
                table.print();
            })
        }
        NodeAction::CreateInvoice {
            amount,
            label,
            description,
            expiry,
        } => {
            let request = InvoiceRequest {
                amount_sat: amount,
                label,
                description,
                expiry_secs: expiry,
            };
            let invoice = client.create_invoice(&request).await?;
            out.emit(&invoice, |invoice| {
                success("Invoice created");
                field("Payment Hash", &invoice.payment_hash);
                field("Payment Request", invoice.payment_request.yellow());
                if let Some(expires_at) = invoice.expires_at {
                    field("Expires At", expires_at);
                }
                if let Some(add_index) = invoice.add_index {
                    field("Add Index", add_index);
                }
            })
        }
        NodeAction::PayInvoice {
            payment_request,
            amount,
        } => {
            let result = client.pay_invoice(&payment_request, amount).await?;
            out.emit(&result, |result| {
                success("Payment sent");
                field("Payment Hash", &result.payment_hash);
                field("Payment Preimage", &result.payment_preimage);
                field(
                    "Amount Sent",
                    or_na(result.amount_sent_sat.map(|amount| format!("{} sats", sats(amount)))),
                );
                field(
                    "Fees",
                    or_na(result.fee_sat.map(|amount| format!("{} sats", sats(amount)))),
                );
                field("Status", &result.status);
            })
        }
        NodeAction::ListInvoices { pending_only } => {
            let invoices = client.list_invoices(pending_only).await?;
            out.emit(&invoices, |invoices| {
                let mut table = Table::new(format!("{kind} Invoices - {node}"), &[
                    "Label",
                    "Amount (sats)",
                    "Description",
                    "Status",
                    "Expires At",
                ])
                .limited("invoices");
                for invoice in invoices {
                    table.row(vec![
                        or_na(invoice.label.as_deref()),
                        invoice
                            .amount_sat
                            .map_or_else(|| "any".to_string(), sats),
                        invoice
                            .description
                            .as_deref()
                            .map_or_else(|| "N/A".to_string(), |d| short(d, 30)),
                        invoice.status.to_string(),
                        or_na(invoice.expires_at),
                    ]);
                }
                table.print();
            })
        }
        NodeAction::ListPayments => {
            let payments = client.list_payments().await?;
            out.emit(&payments, |payments| {
                let mut table = Table::new(format!("{kind} Payments - {node}"), &[
                    "Payment Hash",
                    "Amount (sats)",
                    "Destination",
                    "Status",
                    "Created At",
                ])
                .limited("payments");
                for payment in payments {
                    table.row(vec![
                        payment
                            .payment_hash
                            .as_deref()
                            .map_or_else(|| "N/A".to_string(), |h| short(h, 20)),
                        or_na(payment.amount_sent_sat.map(sats)),
                        payment
                            .destination
                            .as_deref()
                            .map_or_else(|| "N/A".to_string(), |d| short(d, 20)),
                        payment.status.to_string(),
                        or_na(payment.created_at),
                    ]);
                }
                table.print();
            })
        }
        NodeAction::Connect { peer } => {
            client.connect_peer(&peer).await?;
            out.emit(&json!({ "connected": peer.to_string() }), |_| {
                success(&format!("Connected to {peer}"));
            })
        }
        NodeAction::OpenChannel {
            pubkey,
            amount,
            push,
        } => {
            let opened = client.open_channel(&pubkey, amount, push).await?;
            out.emit(&opened, |opened| {
                success("Channel opening");
                field("Funding Txid", &opened.funding_txid);
                field("Output Index", or_na(opened.output_index));
                if let Some(channel_id) = &opened.channel_id {
                    field("Channel ID", channel_id);
                }
            })
        }
        NodeAction::CloseChannel { channel_id, force } => {
            let closed = client.close_channel(&channel_id, force).await?;
            out.emit(&closed, |closed| {
                success(&format!("Closing channel {channel_id}"));
                field("Closing Txid", or_na(closed.closing_txid.as_deref()));
                if let Some(close_type) = &closed.close_type {
                    field("Type", close_type);
                }
            })
        }
        NodeAction::Decode { payment_request } => {
            let decoded = client.decode_invoice(&payment_request).await?;
            out.emit(&decoded, |decoded| {
                field("Payment Hash", &decoded.payment_hash);
                field("Destination", &decoded.destination);
                field(
                    "Amount",
                    decoded
                        .amount_sat
                        .map_or_else(|| "any".to_string(), |amount| format!("{} sats", sats(amount))),
                );
                field("Timestamp", decoded.timestamp);
                field("Expiry", format!("{}s", decoded.expiry));
                field("Description", or_na(decoded.description.as_deref()));
            })
        }
        NodeAction::Route {
            destination,
            amount,
        } => {
            let routes = client.get_route(&destination, amount).await?;
            out.emit(&routes, |routes| {
                if routes.is_empty() {
                    println!("{}", format!("No route to {destination}").yellow());
                }
                for (i, route) in routes.iter().enumerate() {
                    let mut table = Table::new(
                        format!(
                            "Route {} - {} msat, fees {} msat, time lock {}",
                            i + 1,
                            route.total_amt_msat,
                            route.total_fees_msat,
                            route.total_time_lock
                        ),
                        &["Hop", "Node", "Channel", "Amount (msat)", "Expiry"],
                    );
                    for (n, hop) in route.hops.iter().enumerate() {
                        table.row(vec![
                            (n + 1).to_string(),
                            short(&hop.pubkey, 20),
                            hop.channel.clone(),
                            hop.amount_msat.to_string(),
                            hop.expiry.to_string(),
                        ]);
                    }
                    table.print();
                }
            })
        }
    }
}

/// Run an LND command, including the balance breakdowns only LND offers.
pub async fn lnd_action(client: &LndClient, action: LndAction, out: Output) -> Result<()> {
    let node = client.node_name().to_string();
    match action {
        LndAction::WalletBalance => {
            let balance = client.get_wallet_balance().await?;
            out.emit(&balance, |balance| {
                let mut table =
                    Table::new(format!("LND Wallet Balance - {node}"), &["Type", "Amount (sats)"]);
                table.row(vec!["Confirmed".into(), sats(balance.confirmed_balance)]);
                table.row(vec!["Unconfirmed".into(), sats(balance.unconfirmed_balance)]);
                table.row(vec!["Total".into(), sats(balance.total_balance)]);
                table.print();
            })
        }
        LndAction::ChannelBalance => {
            let balance = client.get_channel_balance().await?;
            out.emit(&balance, |balance| {
                let mut table =
                    Table::new(format!("LND Channel Balance - {node}"), &["Type", "Amount (sats)"]);
                table.row(vec!["Available".into(), sats(balance.balance)]);
                table.row(vec!["Pending Open".into(), sats(balance.pending_open_balance)]);
                table.print();
            })
        }
        LndAction::Node(action) => node_action(client, action, out).await,
    }
}
