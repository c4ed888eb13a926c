//! Credentials on the wire and how their absence is reported.

use std::fs;

use anyhow::Result;
use polar_nodes::{
    AuthStatus, ClientOptions, CoreLightningClient, Credential, CredentialRole, LndClient,
    NodeClient,
};
use polar_tests::MockNode;
use serde_json::json;

#[tokio::test]
async fn test_rune_sent_as_header() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let rune = dir.path().join("admin.rune");
    fs::write(&rune, "tU-RLjMiDpY2U0o3W1oFowar36RFGpWloPbW9-RuZdo9MyZpZD0w\n")?;

    let mock = MockNode::start().await?;
    mock.on("POST", "/v1/listpeers", 200, &json!({"peers": []}));

    let mut node = mock.cln_node("bob");
    node.rune_path = Some(rune);
    let client = CoreLightningClient::from_node(&node, &ClientOptions::default())?;
    assert!(client.auth().credential(CredentialRole::Rune).unwrap().is_loaded());

    assert!(client.list_peers().await?.is_empty());
    let request = mock.last_request().unwrap();
    assert_eq!(
        request.header("rune"),
        Some("tU-RLjMiDpY2U0o3W1oFowar36RFGpWloPbW9-RuZdo9MyZpZD0w")
    );
    assert_eq!(request.header("content-type"), Some("application/json"));
    Ok(())
}

#[tokio::test]
async fn test_macaroon_sent_hex_encoded() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let macaroon = dir.path().join("admin.macaroon");
    fs::write(&macaroon, b"\x02\x01\x03lnd")?;

    let mock = MockNode::start().await?;
    mock.on("GET", "/v1/peers", 200, &json!({"peers": []}));

    let mut node = mock.lnd_node("alice");
    node.macaroon_path = Some(macaroon);
    let client = LndClient::from_node(&node, &ClientOptions::default())?;

    client.list_peers().await?;
    assert_eq!(
        mock.last_request().unwrap().header("grpc-metadata-macaroon"),
        Some("0201036c6e64")
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_credentials_degrade() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mock = MockNode::start().await?;
    mock.on("POST", "/v1/listpeers", 200, &json!({"peers": []}));
    mock.on("GET", "/v1/peers", 200, &json!({"peers": []}));

    let mut bob = mock.cln_node("bob");
    bob.rune_path = Some(dir.path().join("admin.rune"));
    let cln = CoreLightningClient::from_node(&bob, &ClientOptions::default())?;
    assert_eq!(cln.auth().status(), AuthStatus::Degraded);
    assert!(matches!(
        cln.auth().credential(CredentialRole::Rune),
        Some(Credential::Missing(_))
    ));
    cln.list_peers().await?;
    assert_eq!(mock.last_request().unwrap().header("rune"), None);

    let mut alice = mock.lnd_node("alice");
    alice.macaroon_path = Some(dir.path().join("admin.macaroon"));
    let lnd = LndClient::from_node(&alice, &ClientOptions::default())?;
    assert_eq!(lnd.auth().status(), AuthStatus::Degraded);
    lnd.list_peers().await?;
    assert_eq!(
        mock.last_request().unwrap().header("grpc-metadata-macaroon"),
        None
    );
    Ok(())
}

#[tokio::test]
async fn test_invalid_credentials_fail_but_build() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let rune = dir.path().join("admin.rune");
    fs::write(&rune, "\n")?;
    let ca = dir.path().join("ca.pem");
    fs::write(&ca, "not a certificate")?;

    let mock = MockNode::start().await?;
    let mut node = mock.cln_node("bob");
    node.rune_path = Some(rune);
    node.ca_cert_path = Some(ca);

    let client = CoreLightningClient::from_node(&node, &ClientOptions::default())?;
    let auth = client.auth();
    assert_eq!(auth.status(), AuthStatus::Failed);
    assert!(matches!(
        auth.credential(CredentialRole::Rune),
        Some(Credential::Invalid { reason, .. }) if reason == "file is empty"
    ));
    assert!(matches!(
        auth.credential(CredentialRole::CaCertificate),
        Some(Credential::Invalid { .. })
    ));
    assert_eq!(
        auth.credential(CredentialRole::ClientIdentity),
        Some(&Credential::NotConfigured)
    );
    Ok(())
}

#[tokio::test]
async fn test_insecure_tls_only_when_allowed() -> Result<()> {
    let node = polar_core::NodeConfig::new("alice", polar_core::LightningImpl::Lnd)
        .with_rest("127.0.0.1", 8081);

    let strict = LndClient::from_node(&node, &ClientOptions::default())?;
    assert!(!strict.auth().insecure_tls());

    let relaxed = LndClient::from_node(&node, &ClientOptions::regtest())?;
    assert!(relaxed.auth().insecure_tls());
    Ok(())
}
