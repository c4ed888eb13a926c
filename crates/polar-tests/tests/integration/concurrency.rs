//! One client shared by concurrent requests.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use polar_nodes::{ClientOptions, LndClient, NodeClient};
use polar_tests::MockNode;
use serde_json::json;

#[tokio::test]
async fn test_concurrent_requests_share_client() -> Result<()> {
    let mock = MockNode::start().await?;
    mock.on("GET", "/v1/getinfo", 200, &json!({"identity_pubkey": "03aa", "alias": "alice"}));
    mock.on("GET", "/v1/peers", 200, &json!({"peers": []}));

    let client = LndClient::from_node(&mock.lnd_node("alice"), &ClientOptions::default())?;

    let infos = join_all((0..8).map(|_| client.get_info())).await;
    for info in infos {
        assert_eq!(info?.alias, "alice");
    }
    assert_eq!(mock.requests().len(), 8);
    Ok(())
}

#[tokio::test]
async fn test_boxed_client_across_tasks() -> Result<()> {
    let mock = MockNode::start().await?;
    mock.on("GET", "/v1/getinfo", 200, &json!({"identity_pubkey": "03aa", "alias": "alice"}));

    let client: Arc<dyn NodeClient> = Arc::new(LndClient::from_node(
        &mock.lnd_node("alice"),
        &ClientOptions::default(),
    )?);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.get_info().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await??.identity_pubkey, "03aa");
    }
    assert_eq!(mock.requests().len(), 4);
    Ok(())
}
