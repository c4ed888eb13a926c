//! Cross-node status report.
//!
//! Every configured node is queried concurrently. Each check fails on its
//! own; one unreachable node or endpoint does not hide the others.

use anyhow::{Result, bail};
use colored::Colorize;
use futures::future::join_all;
use polar_core::{LightningImpl, PolarConfig};
use polar_nodes::{AuthStatus, ClientOptions, NodeClient, client_for};
use serde::Serialize;

use crate::commands::{Output, status_label};
use crate::table::sats;

#[derive(Debug, Serialize)]
pub struct Check {
    name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Check {
    fn from_result(name: &'static str, result: polar_core::Result<String>) -> Self {
        match result {
            Ok(detail) => Self {
                name,
                detail: Some(detail),
                error: None,
            },
            Err(e) => Self {
                name,
                detail: None,
                error: Some(e.to_string()),
            },
        }
    }

    const fn passed(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct NodeReport {
    node: String,
    implementation: Option<LightningImpl>,
    auth: Option<AuthStatus>,
    checks: Vec<Check>,
}

impl NodeReport {
    fn passed(&self) -> bool {
        self.checks.iter().all(Check::passed)
    }
}

pub async fn run(config: &PolarConfig, options: &ClientOptions, out: Output) -> Result<()> {
    if config.is_empty() {
        bail!("no nodes configured; set CLN_*/LND_* variables or start a Polar network");
    }

    let reports = join_all(
        config
            .nodes
            .keys()
            .map(|name| check_node(config, name, options)),
    )
    .await;

    out.emit(&reports, |reports| {
        for report in reports {
            print_report(report);
        }
        let failed = reports.iter().filter(|r| !r.passed()).count();
        println!();
        if failed == 0 {
            println!("{}", format!("All {} nodes responded", reports.len()).green().bold());
        } else {
            println!(
                "{}",
                format!("{failed} of {} nodes reported failures", reports.len()).yellow().bold()
            );
        }
    })
}

async fn check_node(config: &PolarConfig, name: &str, options: &ClientOptions) -> NodeReport {
    let client = match client_for(config, name, options) {
        Ok(client) => client,
        Err(e) => {
            return NodeReport {
                node: name.to_string(),
                implementation: config.node(name).ok().map(|node| node.implementation),
                auth: None,
                checks: vec![Check::from_result("client", Err(e))],
            };
        }
    };

    let checks = run_checks(client.as_ref()).await;
    NodeReport {
        node: name.to_string(),
        implementation: Some(client.implementation()),
        auth: Some(client.auth().status()),
        checks,
    }
}

async fn run_checks(client: &dyn NodeClient) -> Vec<Check> {
    let (info, balance, peers, invoices) = tokio::join!(
        client.get_info(),
        client.get_balance(),
        client.list_peers(),
        client.list_invoices(false),
    );

    vec![
        Check::from_result(
            "info",
            info.map(|info| {
                format!(
                    "{} {} - {} active channels",
                    info.alias, info.version, info.num_active_channels
                )
            }),
        ),
        Check::from_result("balance", balance.map(|b| format!("{} sats", sats(b)))),
        Check::from_result("peers", peers.map(|p| format!("{} connected", p.len()))),
        Check::from_result("invoices", invoices.map(|i| format!("{} total", i.len()))),
    ]
}

fn print_report(report: &NodeReport) {
    let kind = report
        .implementation
        .map_or_else(|| "unknown".to_string(), |kind| kind.to_string());
    println!();
    println!("{}", format!("{} ({kind})", report.node).blue().bold());
    if let Some(auth) = report.auth {
        println!("  {} auth: {}", "•".cyan(), status_label(auth));
    }
    for check in &report.checks {
        match (&check.detail, &check.error) {
            (_, Some(error)) => println!("  {} {}: {}", "✗".red(), check.name, error.red()),
            (Some(detail), None) => println!("  {} {}: {detail}", "✓".green(), check.name),
            (None, None) => println!("  {} {}", "✓".green(), check.name),
        }
    }
}
