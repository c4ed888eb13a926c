//! Core Lightning client against a scripted gateway.

use anyhow::Result;
use polar_core::{Error, ErrorKind, InvoiceStatus, PaymentStatus, PeerAddress};
use polar_nodes::{ClientOptions, CoreLightningClient, InvoiceRequest, NodeClient};
use polar_tests::{MockNode, closed_port};
use serde_json::json;

async fn setup() -> Result<(MockNode, CoreLightningClient)> {
    let mock = MockNode::start().await?;
    let client = CoreLightningClient::from_node(&mock.cln_node("bob"), &ClientOptions::default())?;
    Ok((mock, client))
}

#[tokio::test]
async fn test_get_info_normalizes_fields() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "POST",
        "/v1/getinfo",
        200,
        &json!({
            "id": "035d2b1192dfba134e10e540875d366ebc8bc353d5aa766b80c090b39c3a5d885d",
            "alias": "bob",
            "color": "035d2b",
            "num_peers": 1,
            "num_pending_channels": 0,
            "num_active_channels": 2,
            "num_inactive_channels": 0,
            "blockheight": 412,
            "network": "regtest",
            "version": "v24.02.2"
        }),
    );

    let info = client.get_info().await?;
    assert_eq!(
        info.identity_pubkey,
        "035d2b1192dfba134e10e540875d366ebc8bc353d5aa766b80c090b39c3a5d885d"
    );
    assert_eq!(info.alias, "bob");
    assert_eq!(info.color.as_deref(), Some("#035d2b"));
    assert_eq!(info.version, "v24.02.2");
    assert_eq!(info.num_peers, 1);
    assert_eq!(info.num_active_channels, 2);
    assert_eq!(info.block_height, 412);
    assert_eq!(info.network.as_deref(), Some("regtest"));
    assert!(info.synced_to_chain);

    let request = mock.last_request().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path(), "/v1/getinfo");
    assert_eq!(request.json(), json!({}));
    Ok(())
}

#[tokio::test]
async fn test_balance_floors_msat() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "POST",
        "/v1/listfunds",
        200,
        &json!({
            "outputs": [
                {"txid": "aa", "output": 0, "amount_msat": 100_000_999, "status": "confirmed"},
                {"txid": "bb", "output": 1, "amount_msat": 50_000_000, "status": "unconfirmed"}
            ],
            "channels": [
                {"peer_id": "02aa", "our_amount_msat": 20_000_500, "amount_msat": 30_000_000},
                {"peer_id": "03bb", "our_amount_msat": 499, "amount_msat": 10_000_000}
            ]
        }),
    );

    // (100_000_999 + 20_000_500 + 499) / 1000, unconfirmed excluded
    assert_eq!(client.get_balance().await?, 120_001);
    Ok(())
}

#[tokio::test]
async fn test_create_invoice_sends_msat() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "POST",
        "/v1/invoice",
        200,
        &json!({
            "payment_hash": "f".repeat(64),
            "bolt11": "lnbcrt10u1pjtest",
            "expires_at": 1_700_003_600_u64,
            "payment_secret": "00"
        }),
    );

    let invoice = client
        .create_invoice(&InvoiceRequest::new(1000).with_label("coffee"))
        .await?;
    assert_eq!(invoice.payment_request, "lnbcrt10u1pjtest");
    assert_eq!(invoice.expires_at, Some(1_700_003_600));

    let body = mock.last_request().unwrap().json();
    assert_eq!(body["amount_msat"], 1_000_000);
    assert_eq!(body["label"], "coffee");
    assert_eq!(body["description"], "coffee");
    assert!(body.get("expiry").is_none());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_label_fails() -> Result<()> {
    let (mock, client) = setup().await?;
    let request = InvoiceRequest::new(10).with_label("dup");
    mock.on(
        "POST",
        "/v1/invoice",
        200,
        &json!({"payment_hash": "ab".repeat(32), "bolt11": "lnbcrt100n1p", "expires_at": 1}),
    );
    client.create_invoice(&request).await?;

    mock.on(
        "POST",
        "/v1/invoice",
        500,
        &json!({"code": 900, "message": "Duplicate label 'dup'"}),
    );
    let err = client.create_invoice(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("Duplicate label"));
    Ok(())
}

#[tokio::test]
async fn test_invoice_without_label_is_rejected_locally() -> Result<()> {
    let (mock, client) = setup().await?;

    let err = client
        .create_invoice(&InvoiceRequest::new(10))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(mock.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_pay_invoice_with_amount_override() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "POST",
        "/v1/pay",
        200,
        &json!({
            "payment_hash": "cd".repeat(32),
            "payment_preimage": "ef".repeat(32),
            "amount_msat": 5_000_000,
            "amount_sent_msat": 5_002_999,
            "status": "complete"
        }),
    );

    let paid = client.pay_invoice("lnbcrt1pjany", Some(5)).await?;
    assert_eq!(paid.status, PaymentStatus::Complete);
    assert_eq!(paid.amount_sent_sat, Some(5002));
    // 2999 msat of fees floors to 2 sats.
    assert_eq!(paid.fee_sat, Some(2));

    let body = mock.last_request().unwrap().json();
    assert_eq!(body, json!({"bolt11": "lnbcrt1pjany", "amount_msat": 5000}));

    client.pay_invoice("lnbcrt1pjfixed", None).await?;
    let body = mock.last_request().unwrap().json();
    assert_eq!(body, json!({"bolt11": "lnbcrt1pjfixed"}));
    Ok(())
}

#[tokio::test]
async fn test_listing_http_500_names_node_and_method() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on_raw("POST", "/v1/listpeers", 500, "internal error");

    let err = client.list_peers().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(matches!(
        &err,
        Error::Operation { node, operation, .. } if node == "bob" && operation == "listpeers"
    ));
    let message = err.to_string();
    assert!(message.contains("bob"));
    assert!(message.contains("listpeers"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_protocol_error() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on_raw("POST", "/v1/listchannels", 200, "<html>gateway</html>");

    let err = client.list_channels().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(err.status(), None);
    Ok(())
}

#[tokio::test]
async fn test_connection_refused_is_connectivity_error() -> Result<()> {
    let port = closed_port().await?;
    let node = polar_core::NodeConfig::new("bob", polar_core::LightningImpl::CoreLightning)
        .with_rest("127.0.0.1", port);
    let client = CoreLightningClient::from_node(&node, &ClientOptions::default())?;

    let err = client.get_info().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connectivity);
    assert!(err.to_string().contains("getinfo"));
    Ok(())
}

#[tokio::test]
async fn test_listings_keep_raw_json() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "POST",
        "/v1/listpeers",
        200,
        &json!({"peers": [{
            "id": "02aa",
            "connected": true,
            "netaddr": ["172.18.0.3:9735"],
            "num_channels": 1,
            "features": "08a0000a69a2"
        }]}),
    );

    let peers = client.list_peers().await?;
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].pubkey, "02aa");
    assert_eq!(peers[0].address.as_deref(), Some("172.18.0.3:9735"));
    assert!(peers[0].connected);
    assert_eq!(peers[0].raw["features"], "08a0000a69a2");
    Ok(())
}

#[tokio::test]
async fn test_pending_invoices_filtered_locally() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "POST",
        "/v1/listinvoices",
        200,
        &json!({"invoices": [
            {"label": "a", "bolt11": "lnbcrt1a", "payment_hash": "01", "amount_msat": 1000, "status": "paid", "expires_at": 10},
            {"label": "b", "bolt11": "lnbcrt1b", "payment_hash": "02", "amount_msat": "2000msat", "status": "unpaid", "expires_at": 20},
            {"label": "c", "payment_hash": "03", "status": "expired", "expires_at": 30}
        ]}),
    );

    let all = client.list_invoices(false).await?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].status, InvoiceStatus::Canceled);

    let pending = client.list_invoices(true).await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].label.as_deref(), Some("b"));
    assert_eq!(pending[0].amount_sat, Some(2));
    Ok(())
}

#[tokio::test]
async fn test_channel_lifecycle_params() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on("POST", "/v1/connect", 200, &json!({"id": "02aa", "features": "", "direction": "out"}));
    mock.on(
        "POST",
        "/v1/fundchannel",
        200,
        &json!({"tx": "0200", "txid": "ab".repeat(32), "outnum": 1, "channel_id": "cd".repeat(32)}),
    );
    mock.on(
        "POST",
        "/v1/close",
        200,
        &json!({"tx": "0200", "txid": "ef".repeat(32), "type": "unilateral"}),
    );

    let peer: PeerAddress = "02aa@172.18.0.3:9735".parse()?;
    client.connect_peer(&peer).await?;
    assert_eq!(
        mock.last_request().unwrap().json(),
        json!({"id": "02aa@172.18.0.3:9735"})
    );

    let opened = client.open_channel("02aa", 250_000, 10).await?;
    assert_eq!(opened.funding_txid, "ab".repeat(32));
    assert_eq!(opened.output_index, Some(1));
    assert_eq!(
        mock.last_request().unwrap().json(),
        json!({"id": "02aa", "amount": 250_000, "push_msat": 10_000})
    );

    client.open_channel("02aa", 250_000, 0).await?;
    assert!(mock.last_request().unwrap().json().get("push_msat").is_none());

    let closed = client.close_channel("103x1x0", true).await?;
    assert_eq!(closed.close_type.as_deref(), Some("unilateral"));
    assert_eq!(
        mock.last_request().unwrap().json(),
        json!({"id": "103x1x0", "unilateraltimeout": 1})
    );
    Ok(())
}

#[tokio::test]
async fn test_decode_invoice() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "POST",
        "/v1/decode",
        200,
        &json!({
            "type": "bolt11 invoice",
            "valid": true,
            "payee": "02aa",
            "payment_hash": "ab".repeat(32),
            "amount_msat": 21_000,
            "created_at": 1_700_000_000_u64,
            "expiry": 3600,
            "description": "coffee"
        }),
    );

    let decoded = client.decode_invoice("lnbcrt210n1p").await?;
    assert_eq!(decoded.destination, "02aa");
    assert_eq!(decoded.amount_sat, Some(21));
    assert_eq!(decoded.timestamp, 1_700_000_000);
    assert_eq!(decoded.description.as_deref(), Some("coffee"));
    assert_eq!(
        mock.last_request().unwrap().json(),
        json!({"string": "lnbcrt210n1p"})
    );

    mock.on("POST", "/v1/decode", 200, &json!({"type": "bolt11 invoice", "valid": false}));
    let err = client.decode_invoice("lnbcrt210n1p").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    Ok(())
}

#[tokio::test]
async fn test_get_route() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "POST",
        "/v1/getroute",
        200,
        &json!({"route": [
            {"id": "02aa", "channel": "103x1x0", "direction": 0, "amount_msat": 100_001, "delay": 20, "style": "tlv"},
            {"id": "03bb", "channel": "105x1x0", "direction": 1, "amount_msat": 100_000, "delay": 9, "style": "tlv"}
        ]}),
    );

    let routes = client.get_route("03bb", 100).await?;
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].total_fees_msat, 1);
    assert_eq!(routes[0].hops.len(), 2);

    let body = mock.last_request().unwrap().json();
    assert_eq!(body["id"], "03bb");
    assert_eq!(body["amount_msat"], 100_000);
    assert_eq!(body["riskfactor"], 1.0);
    Ok(())
}
