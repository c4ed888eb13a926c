//! Locating nodes and their credentials.
//!
//! Nodes come either from environment variables or from a simulated network
//! directory written by Polar (`~/.polar/networks/<name>/`).

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::{debug, info};

use crate::{Error, LightningImpl, NodeConfig, PolarConfig, Result, Scheme, Settings};

/// REST port Polar exposes for Core Lightning nodes.
pub const CLN_DEFAULT_REST_PORT: u16 = 8182;
/// REST port Polar exposes for LND nodes.
pub const LND_POLAR_REST_PORT: u16 = 8081;
/// gRPC port Polar exposes for LND nodes.
pub const LND_POLAR_GRPC_PORT: u16 = 11002;

const POLAR_HOST: &str = "127.0.0.1";

/// Resolve the Polar home directory from `POLAR_HOME`, defaulting to `~/.polar`.
pub fn polar_home() -> PathBuf {
    let raw = std::env::var("POLAR_HOME").unwrap_or_else(|_| "~/.polar".to_string());
    expand_home(&raw)
}

fn expand_home(path: &str) -> PathBuf {
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    match (path.strip_prefix("~"), home) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}

/// List simulated networks under `home`, sorted by name.
///
/// A network is a directory under `networks/` containing a `docker-compose.yml`.
pub fn find_networks(home: &Path) -> Result<Vec<String>> {
    let networks_dir = home.join("networks");
    if !networks_dir.exists() {
        return Ok(Vec::new());
    }

    let mut networks = Vec::new();
    for entry in std::fs::read_dir(&networks_dir)? {
        let path = entry?.path();
        if path.is_dir() && path.join("docker-compose.yml").exists() {
            if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                networks.push(name.to_string());
            }
        }
    }
    networks.sort();
    Ok(networks)
}

/// Build a configuration from a simulated network directory.
///
/// With no `network` given, the first network found is used.
pub fn load_network(home: &Path, network: Option<&str>) -> Result<PolarConfig> {
    let network_name = match network {
        Some(name) => name.to_string(),
        None => find_networks(home)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Config(format!("no Polar networks found in {}", home.display())))?,
    };

    let network_dir = home.join("networks").join(&network_name);
    if !network_dir.is_dir() {
        return Err(Error::NetworkNotFound(network_name));
    }

    let mut config = PolarConfig {
        polar_home: Some(home.to_path_buf()),
        network_name: Some(network_name.clone()),
        ..PolarConfig::default()
    };

    let volumes = network_dir.join("volumes");

    for (name, dir) in node_dirs(&volumes.join("c-lightning"))? {
        let lightningd = dir.join("lightningd");
        if !lightningd.is_dir() {
            continue;
        }
        let regtest = lightningd.join("regtest");
        let mut node = NodeConfig::new(name, LightningImpl::CoreLightning)
            .with_rest(POLAR_HOST, CLN_DEFAULT_REST_PORT);
        node.rune_path = Some(lightningd.join("admin.rune"));
        node.ca_cert_path = Some(regtest.join("ca.pem"));
        node.client_cert_path = Some(regtest.join("client.pem"));
        node.client_key_path = Some(regtest.join("client-key.pem"));
        config.add_node(node);
    }

    for (name, dir) in node_dirs(&volumes.join("lnd"))? {
        let mut node =
            NodeConfig::new(name, LightningImpl::Lnd).with_rest(POLAR_HOST, LND_POLAR_REST_PORT);
        node.rpc_port = LND_POLAR_GRPC_PORT;
        node.macaroon_path = Some(
            dir.join("data")
                .join("chain")
                .join("bitcoin")
                .join("regtest")
                .join("admin.macaroon"),
        );
        node.cert_path = Some(dir.join("tls.cert"));
        config.add_node(node);
    }

    debug!(
        network = %network_name,
        nodes = config.nodes.len(),
        "discovered Polar network"
    );
    Ok(config)
}

fn node_dirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
            dirs.push((name.to_string(), path.clone()));
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Build a configuration from process environment variables.
pub fn from_env() -> Result<PolarConfig> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a configuration from an arbitrary variable lookup.
///
/// A Core Lightning node is configured when `CLN_SOCKET_PATH` or
/// `CLN_REST_PORT` is set; an LND node when `LND_PORT` or `LND_REST_PORT`
/// is set.
pub fn from_lookup<F>(lookup: F) -> Result<PolarConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    let port = |key: &str| -> Result<Option<u16>> {
        var(key)
            .map(|value| {
                value
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| Error::Config(format!("{key} is not a valid port: {value}")))
            })
            .transpose()
    };
    let scheme = |key: &str| -> Result<Option<Scheme>> {
        var(key).map(|value| value.parse::<Scheme>()).transpose()
    };

    let mut config = PolarConfig::new();

    let cln_socket = var("CLN_SOCKET_PATH");
    let cln_rest_port = port("CLN_REST_PORT")?;
    if cln_socket.is_some() || cln_rest_port.is_some() {
        let name = var("CLN_NODE_NAME").unwrap_or_else(|| "bob".to_string());
        let mut node = NodeConfig::new(name, LightningImpl::CoreLightning);
        node.rpc_host = var("CLN_HOST").unwrap_or_else(|| "localhost".to_string());
        node.rpc_port = if cln_socket.is_some() {
            0
        } else {
            cln_rest_port.unwrap_or_default()
        };
        node.rest_port = cln_rest_port;
        node.scheme = scheme("CLN_SCHEME")?;
        node.socket_path = cln_socket.map(PathBuf::from);
        node.rune_path = var("CLN_RUNE_PATH").map(PathBuf::from);
        node.ca_cert_path = var("CLN_CA_CERT_PATH").map(PathBuf::from);
        node.client_cert_path = var("CLN_CLIENT_CERT_PATH").map(PathBuf::from);
        node.client_key_path = var("CLN_CLIENT_KEY_PATH").map(PathBuf::from);
        config.add_node(node);
    }

    let lnd_port = port("LND_PORT")?;
    let lnd_rest_port = port("LND_REST_PORT")?;
    if lnd_port.is_some() || lnd_rest_port.is_some() {
        let name = var("LND_NODE_NAME").unwrap_or_else(|| "alice".to_string());
        let mut node = NodeConfig::new(name, LightningImpl::Lnd);
        node.rpc_host = var("LND_HOST").unwrap_or_else(|| "localhost".to_string());
        node.rpc_port = lnd_port.unwrap_or(10001);
        node.rest_port = lnd_rest_port;
        node.scheme = scheme("LND_SCHEME")?;
        node.macaroon_path = var("LND_MACAROON_PATH").map(PathBuf::from);
        node.cert_path = var("LND_CERT_PATH").map(PathBuf::from);
        config.add_node(node);
    }

    Ok(config)
}

/// Polar home for `settings`: the override when set, otherwise [`polar_home`].
pub fn home_for(settings: &Settings) -> PathBuf {
    settings
        .polar_home
        .as_ref()
        .map_or_else(polar_home, |path| expand_home(&path.to_string_lossy()))
}

/// Load node configuration: environment first, then the Polar network directory.
pub fn load_config(settings: &Settings) -> Result<PolarConfig> {
    let env_config = from_env()?;
    if !env_config.is_empty() {
        info!(nodes = env_config.nodes.len(), "using nodes from environment");
        return Ok(env_config);
    }

    let home = home_for(settings);
    info!(home = %home.display(), "discovering Polar network");
    load_network(&home, settings.network.as_deref())
}
