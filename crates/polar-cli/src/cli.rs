//! Command-line surface.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use polar_core::PeerAddress;

#[derive(Parser, Debug)]
#[command(name = "lnpolar")]
#[command(
    author,
    version,
    about = "Query and operate Core Lightning and LND nodes in a Polar network"
)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Polar network to use when several exist
    #[arg(long, global = true)]
    pub network: Option<String>,

    /// Polar home directory (default: $POLAR_HOME or ~/.polar)
    #[arg(long, global = true)]
    pub polar_home: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Verify TLS certificates even for nodes without a configured certificate
    #[arg(long, global = true)]
    pub strict_tls: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured nodes and their credentials
    Nodes,
    /// List Polar networks
    Networks,
    /// Query every configured node
    Status,
    /// Core Lightning commands
    Cln {
        /// Node name in Polar
        #[arg(long, default_value = "bob", global = true)]
        node: String,

        #[command(subcommand)]
        action: NodeAction,
    },
    /// LND commands
    Lnd {
        /// Node name in Polar
        #[arg(long, default_value = "alice", global = true)]
        node: String,

        #[command(subcommand)]
        action: LndAction,
    },
    /// Show or save persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Operations both implementations support.
#[derive(Subcommand, Debug)]
pub enum NodeAction {
    /// Node identity and sync state
    Info,
    /// Spendable balance (confirmed on-chain plus channels)
    Balance,
    /// List channels
    Channels,
    /// List peers
    Peers,
    /// Create an invoice
    CreateInvoice {
        /// Amount in satoshis (0 for any amount)
        #[arg(long)]
        amount: u64,

        /// Unique label (required by Core Lightning)
        #[arg(long)]
        label: Option<String>,

        /// Description or memo
        #[arg(long, visible_alias = "memo")]
        description: Option<String>,

        /// Expiry in seconds
        #[arg(long)]
        expiry: Option<u64>,
    },
    /// Pay a BOLT11 invoice
    PayInvoice {
        /// Invoice to pay
        #[arg(long)]
        payment_request: String,

        /// Amount in satoshis, for any-amount invoices
        #[arg(long)]
        amount: Option<u64>,
    },
    /// List invoices
    ListInvoices {
        /// Only invoices that can still be paid
        #[arg(long)]
        pending_only: bool,
    },
    /// List outgoing payments
    ListPayments,
    /// Connect to a peer (pubkey or pubkey@host:port)
    Connect {
        /// Peer address
        peer: PeerAddress,
    },
    /// Open a channel
    OpenChannel {
        /// Remote node public key
        #[arg(long)]
        pubkey: String,

        /// Channel size in satoshis
        #[arg(long)]
        amount: u64,

        /// Satoshis to push to the remote side
        #[arg(long, default_value_t = 0)]
        push: u64,
    },
    /// Close a channel (LND: txid:output_index)
    CloseChannel {
        /// Channel id or channel point
        channel_id: String,

        /// Close unilaterally
        #[arg(long)]
        force: bool,
    },
    /// Decode a BOLT11 invoice
    Decode {
        /// Invoice to decode
        payment_request: String,
    },
    /// Find a route to a node
    Route {
        /// Destination public key
        #[arg(long)]
        destination: String,

        /// Amount in satoshis
        #[arg(long)]
        amount: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum LndAction {
    /// On-chain wallet balance
    WalletBalance,
    /// Lightning channel balance
    ChannelBalance,
    #[command(flatten)]
    Node(NodeAction),
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective settings and where they are stored
    Show,
    /// Persist the effective settings, including flags given on this run
    Save,
}
