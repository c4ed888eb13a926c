//! Client construction from configuration and discovered networks.

use std::fs;
use std::path::Path;

use anyhow::Result;
use polar_core::discovery::load_network;
use polar_core::{Error, ErrorKind, LightningImpl, NodeConfig, Scheme};
use polar_nodes::{ClientOptions, CoreLightningClient, LndClient, NodeClient, client_for};
use polar_tests::{MockNode, config_with};
use serde_json::json;

fn polar_network(home: &Path, network: &str) -> Result<()> {
    let root = home.join("networks").join(network);
    fs::create_dir_all(&root)?;
    fs::write(root.join("docker-compose.yml"), "services: {}\n")?;

    let lightningd = root.join("volumes/c-lightning/bob/lightningd");
    fs::create_dir_all(lightningd.join("regtest"))?;
    fs::write(lightningd.join("admin.rune"), "bob-rune\n")?;

    let lnd = root.join("volumes/lnd/alice");
    fs::create_dir_all(lnd.join("data/chain/bitcoin/regtest"))?;
    fs::write(lnd.join("data/chain/bitcoin/regtest/admin.macaroon"), b"\x02\x01")?;
    Ok(())
}

#[test]
fn test_unknown_node_is_configuration_error() {
    let config = config_with([NodeConfig::new("alice", LightningImpl::Lnd)]);

    let err = client_for(&config, "carol", &ClientOptions::default())
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(matches!(err, Error::NodeNotFound(ref name) if name == "carol"));
}

#[test]
fn test_wrong_implementation_is_rejected() {
    let config = config_with([
        NodeConfig::new("alice", LightningImpl::Lnd),
        NodeConfig::new("bob", LightningImpl::CoreLightning).with_rest("127.0.0.1", 8182),
    ]);
    let options = ClientOptions::default();

    let err = CoreLightningClient::new(&config, "alice", &options).unwrap_err();
    assert!(matches!(
        err,
        Error::WrongImplementation {
            expected: LightningImpl::CoreLightning,
            actual: LightningImpl::Lnd,
            ..
        }
    ));

    let err = LndClient::new(&config, "bob", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_cln_requires_rest_port() {
    let mut node = NodeConfig::new("bob", LightningImpl::CoreLightning);
    node.socket_path = Some("/tmp/lightning-rpc".into());
    let config = config_with([node]);

    let err = client_for(&config, "bob", &ClientOptions::default())
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("REST port"));
}

#[tokio::test]
async fn test_discovered_network_reaches_nodes() -> Result<()> {
    let home = tempfile::tempdir()?;
    polar_network(home.path(), "regtest-1")?;

    let mut config = load_network(home.path(), None)?;
    assert_eq!(config.network_name.as_deref(), Some("regtest-1"));
    assert_eq!(config.nodes.len(), 2);

    let mock = MockNode::start().await?;
    mock.on("POST", "/v1/getinfo", 200, &json!({"id": "02bb", "alias": "bob"}));
    mock.on("GET", "/v1/getinfo", 200, &json!({"identity_pubkey": "03aa", "alias": "alice"}));

    for node in config.nodes.values_mut() {
        node.rest_port = Some(mock.port());
        node.scheme = Some(Scheme::Http);
    }
    let options = ClientOptions::regtest();

    let bob = client_for(&config, "bob", &options)?;
    assert_eq!(bob.implementation(), LightningImpl::CoreLightning);
    assert_eq!(bob.get_info().await?.alias, "bob");
    assert_eq!(mock.last_request().unwrap().header("rune"), Some("bob-rune"));

    let alice = client_for(&config, "alice", &options)?;
    assert_eq!(alice.get_info().await?.identity_pubkey, "03aa");
    assert_eq!(
        mock.last_request().unwrap().header("grpc-metadata-macaroon"),
        Some("0201")
    );
    Ok(())
}

#[test]
fn test_unknown_network() -> Result<()> {
    let home = tempfile::tempdir()?;
    polar_network(home.path(), "regtest-1")?;

    let err = load_network(home.path(), Some("mainnet")).unwrap_err();
    assert!(matches!(err, Error::NetworkNotFound(ref name) if name == "mainnet"));
    Ok(())
}
