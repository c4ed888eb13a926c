//! REST clients for Core Lightning and LND nodes.
//!
//! Both clients implement [`NodeClient`], so callers can pick one by node
//! name with [`client_for`] and use the same operations on either backend.

mod auth;
mod client;
mod cln;
mod lnd;
mod options;
mod tls;
mod transport;

pub use auth::{AuthReport, AuthStatus, Credential, CredentialRole};
pub use client::{InvoiceRequest, NodeClient, client_for};
pub use cln::CoreLightningClient;
pub use lnd::{DEFAULT_INVOICE_EXPIRY_SECS, LndClient};
pub use options::ClientOptions;
