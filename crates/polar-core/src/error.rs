//! Error types for Polar node clients.

use thiserror::Error;

use crate::LightningImpl;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or talking to a node.
#[derive(Debug, Error)]
pub enum Error {
    /// Network not found.
    #[error("network not found: {0}")]
    NetworkNotFound(String),

    /// Node not found.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// A client was requested for a node of another implementation.
    #[error("node '{node}' is configured as {actual}, not {expected}")]
    WrongImplementation {
        /// Node name.
        node: String,
        /// Implementation the client speaks.
        expected: LightningImpl,
        /// Implementation the node is configured as.
        actual: LightningImpl,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Caller supplied a malformed argument.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backend could not be reached (DNS, TCP, TLS, timeout).
    #[error("failed to connect to node '{node}' at {url}: {message}")]
    Connection {
        /// Node name.
        node: String,
        /// Request URL.
        url: String,
        /// Transport error text.
        message: String,
    },

    /// The backend answered with a non-success status.
    #[error("HTTP {status} from node '{node}' at {url}: {body}")]
    Http {
        /// Node name.
        node: String,
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The backend answered with a body that does not match the expected shape.
    #[error("invalid JSON from node '{node}' at {url}: {message}")]
    Parse {
        /// Node name.
        node: String,
        /// Request URL.
        url: String,
        /// Decoder error text.
        message: String,
    },

    /// The backend accepted the request but reported a failure in its body.
    #[error("node '{node}' reported an error: {message}")]
    Backend {
        /// Node name.
        node: String,
        /// Backend error text.
        message: String,
    },

    /// A named operation against a node failed.
    #[error("{operation} failed on node '{node}': {source}")]
    Operation {
        /// Node name.
        node: String,
        /// Operation (RPC method) name.
        operation: String,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown node, wrong implementation, missing port and similar.
    Configuration,
    /// Malformed caller input.
    InvalidInput,
    /// The node could not be reached.
    Connectivity,
    /// Non-success status or malformed body.
    Protocol,
    /// The node reported a failure in a successful response.
    Backend,
    /// Local IO or serialization.
    Io,
}

impl Error {
    /// Category of this error, looking through [`Error::Operation`] wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkNotFound(_)
            | Self::NodeNotFound(_)
            | Self::WrongImplementation { .. }
            | Self::Config(_) => ErrorKind::Configuration,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Connection { .. } => ErrorKind::Connectivity,
            Self::Http { .. } | Self::Parse { .. } => ErrorKind::Protocol,
            Self::Backend { .. } => ErrorKind::Backend,
            Self::Operation { source, .. } => source.kind(),
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Io,
        }
    }

    /// Wrap this error as a failure of `operation` on `node`.
    #[must_use]
    pub fn in_operation(self, node: &str, operation: &str) -> Self {
        Self::Operation {
            node: node.to_string(),
            operation: operation.to_string(),
            source: Box::new(self),
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Operation { source, .. } => source.status(),
            _ => None,
        }
    }
}
