//! LND client against a scripted REST API.

use anyhow::Result;
use polar_core::{Error, ErrorKind, InvoiceStatus, PaymentStatus, PeerAddress};
use polar_nodes::{ClientOptions, InvoiceRequest, LndClient, NodeClient};
use polar_tests::MockNode;
use serde_json::json;

const TXID: &str = "5f1d4c3b2a1908f7e6d5c4b3a29180706f5e4d3c2b1a09f8e7d6c5b4a3928170";

async fn setup() -> Result<(MockNode, LndClient)> {
    let mock = MockNode::start().await?;
    let client = LndClient::from_node(&mock.lnd_node("alice"), &ClientOptions::default())?;
    Ok((mock, client))
}

#[tokio::test]
async fn test_get_info() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "GET",
        "/v1/getinfo",
        200,
        &json!({
            "version": "0.18.5-beta commit=v0.18.5-beta",
            "identity_pubkey": "02c3a5e8b4a5b56ae85f0f6b0a9fbbca1b6a9a4f5c7e8d9f0a1b2c3d4e5f6a7b8c",
            "alias": "alice",
            "color": "#3399ff",
            "num_pending_channels": 0,
            "num_active_channels": 1,
            "num_inactive_channels": 0,
            "num_peers": 2,
            "block_height": 412,
            "block_hash": "00",
            "synced_to_chain": true,
            "synced_to_graph": false,
            "chains": [{"chain": "bitcoin", "network": "regtest"}]
        }),
    );

    let info = client.get_info().await?;
    assert_eq!(info.alias, "alice");
    assert_eq!(info.num_peers, 2);
    assert_eq!(info.block_height, 412);
    assert_eq!(info.network.as_deref(), Some("regtest"));
    assert_eq!(info.synced_to_graph, Some(false));
    assert_eq!(mock.last_request().unwrap().method, "GET");
    Ok(())
}

#[tokio::test]
async fn test_combined_balance_excludes_unconfirmed() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "GET",
        "/v1/balance/blockchain",
        200,
        &json!({"total_balance": "600", "confirmed_balance": "500", "unconfirmed_balance": "100"}),
    );
    mock.on(
        "GET",
        "/v1/balance/channels",
        200,
        &json!({"balance": "300", "pending_open_balance": "50"}),
    );

    let wallet = client.get_wallet_balance().await?;
    assert_eq!(wallet.confirmed_balance, 500);
    assert_eq!(wallet.unconfirmed_balance, 100);
    assert_eq!(wallet.total_balance, 600);

    let channels = client.get_channel_balance().await?;
    assert_eq!(channels.balance, 300);
    assert_eq!(channels.pending_open_balance, 50);

    assert_eq!(client.get_balance().await?, 800);
    Ok(())
}

#[tokio::test]
async fn test_create_invoice_defaults() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "POST",
        "/v1/invoices",
        200,
        &json!({
            "r_hash": "q6urq6urq6urq6urq6urq6urq6urq6urq6urq6urq6s=",
            "payment_request": "lnbcrt5u1pjlnd",
            "add_index": "7",
            "payment_addr": "AA=="
        }),
    );

    let invoice = client.create_invoice(&InvoiceRequest::new(500)).await?;
    assert_eq!(invoice.payment_hash, "ab".repeat(32));
    assert_eq!(invoice.payment_request, "lnbcrt5u1pjlnd");
    assert_eq!(invoice.add_index, Some(7));

    let body = mock.last_request().unwrap().json();
    assert_eq!(
        body,
        json!({"value": "500", "memo": "Invoice for 500 sats", "expiry": "3600"})
    );

    client
        .create_invoice(
            &InvoiceRequest::new(1)
                .with_description("tip")
                .with_expiry(60),
        )
        .await?;
    let body = mock.last_request().unwrap().json();
    assert_eq!(body, json!({"value": "1", "memo": "tip", "expiry": "60"}));
    Ok(())
}

#[tokio::test]
async fn test_pay_invoice_reports_payment_error() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "POST",
        "/v1/channels/transactions",
        200,
        &json!({
            "payment_error": "",
            "payment_preimage": "7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e7e4=",
            "payment_hash": "q6urq6urq6urq6urq6urq6urq6urq6urq6urq6urq6s=",
            "payment_route": {"total_time_lock": 500, "total_fees_msat": "0", "total_amt_msat": "500000"}
        }),
    );

    let paid = client.pay_invoice("lnbcrt5u1pjlnd", None).await?;
    assert_eq!(paid.payment_hash, "ab".repeat(32));
    assert_eq!(paid.amount_sent_sat, Some(500));
    assert_eq!(paid.fee_sat, Some(0));
    assert_eq!(paid.status, PaymentStatus::Complete);
    assert_eq!(
        mock.last_request().unwrap().json(),
        json!({"payment_request": "lnbcrt5u1pjlnd"})
    );

    mock.on(
        "POST",
        "/v1/channels/transactions",
        200,
        &json!({"payment_error": "unable to find a path to destination"}),
    );
    let err = client.pay_invoice("lnbcrt1pjany", Some(42)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(err.to_string().contains("unable to find a path"));
    assert_eq!(mock.last_request().unwrap().json()["amt"], "42");
    Ok(())
}

#[tokio::test]
async fn test_decode_escapes_payment_request() -> Result<()> {
    let (mock, client) = setup().await?;
    let encoded = "/v1/payreq/lnbcrt1%2Fodd%3Fpart";
    mock.on(
        "GET",
        encoded,
        200,
        &json!({
            "destination": "03bb",
            "payment_hash": "ab".repeat(32),
            "num_satoshis": "21",
            "timestamp": "1700000000",
            "expiry": "3600",
            "description": "",
            "num_msat": "21000"
        }),
    );

    let decoded = client.decode_invoice("lnbcrt1/odd?part").await?;
    assert_eq!(decoded.destination, "03bb");
    assert_eq!(decoded.amount_sat, Some(21));
    assert_eq!(decoded.expiry, 3600);
    assert_eq!(decoded.description, None);

    let request = mock.last_request().unwrap();
    assert_eq!(request.target, encoded);
    assert_eq!(request.query(), None);
    Ok(())
}

#[tokio::test]
async fn test_close_channel_rejects_malformed_point() -> Result<()> {
    let (mock, client) = setup().await?;

    let bad_index = format!("{TXID}:x");
    for bad in ["no-colon-here", "abc:0", bad_index.as_str()] {
        let err = client.close_channel(bad, false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput, "{bad}");
    }
    assert!(mock.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_close_channel_reads_first_update() -> Result<()> {
    let (mock, client) = setup().await?;
    let path = format!("/v1/channels/{TXID}/1");
    // txid bytes 00..1f, reported in internal byte order
    mock.on_raw(
        "DELETE",
        &path,
        200,
        "{\"result\":{\"close_pending\":{\"txid\":\"AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=\",\"output_index\":0}}}\n",
    );

    let closed = client.close_channel(&format!("{TXID}:1"), true).await?;
    assert_eq!(
        closed.closing_txid.as_deref(),
        Some("1f1e1d1c1b1a191817161514131211100f0e0d0c0b0a09080706050403020100")
    );

    let request = mock.last_request().unwrap();
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.path(), path);
    assert_eq!(request.query(), Some("force=true"));
    Ok(())
}

#[tokio::test]
async fn test_generic_request_rejects_unsupported_method() -> Result<()> {
    let (mock, client) = setup().await?;

    let err = client.request("PATCH", &["v1", "getinfo"], None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(mock.requests().is_empty());

    mock.on("GET", "/v1/getinfo", 200, &json!({"alias": "alice"}));
    let value = client.request("get", &["v1", "getinfo"], None).await?;
    assert_eq!(value["alias"], "alice");
    Ok(())
}

#[tokio::test]
async fn test_http_error_names_node_and_url() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "GET",
        "/v1/channels",
        500,
        &json!({"code": 2, "message": "boom", "details": []}),
    );

    let err = client.list_channels().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(err.status(), Some(500));
    let Error::Operation { source, .. } = &err else {
        panic!("expected an operation error, got {err:?}");
    };
    assert!(matches!(
        source.as_ref(),
        Error::Http { node, url, .. } if node == "alice" && url.ends_with("/v1/channels")
    ));
    Ok(())
}

#[tokio::test]
async fn test_listings() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on(
        "GET",
        "/v1/channels",
        200,
        &json!({"channels": [{
            "active": true,
            "remote_pubkey": "03bb",
            "channel_point": format!("{TXID}:0"),
            "chan_id": "453083565588480",
            "capacity": "250000",
            "local_balance": "240000",
            "remote_balance": "6530",
            "commit_fee": "3470"
        }]}),
    );
    mock.on(
        "GET",
        "/v1/invoices",
        200,
        &json!({"invoices": [{
            "memo": "coffee",
            "r_hash": "q6urq6urq6urq6urq6urq6urq6urq6urq6urq6urq6s=",
            "value": "21",
            "value_msat": "21000",
            "settled": false,
            "creation_date": "1700000000",
            "expiry": "3600",
            "payment_request": "lnbcrt210n1p",
            "add_index": "3",
            "state": "OPEN"
        }]}),
    );
    mock.on(
        "GET",
        "/v1/payments",
        200,
        &json!({"payments": [{
            "payment_hash": "ab".repeat(32),
            "value_sat": "10",
            "value_msat": "10000",
            "fee_msat": "1",
            "creation_date": "1700000100",
            "status": "SUCCEEDED",
            "htlcs": [{"route": {"hops": [{"pub_key": "02aa"}, {"pub_key": "03bb"}]}}]
        }]}),
    );
    mock.on("GET", "/v1/peers", 200, &json!({"peers": [{"pub_key": "03bb", "address": "172.18.0.4:9735"}]}));

    let channels = client.list_channels().await?;
    assert_eq!(channels[0].capacity_sat, Some(250_000));
    assert_eq!(channels[0].local_balance_sat, Some(240_000));
    assert_eq!(channels[0].raw["commit_fee"], "3470");

    let invoices = client.list_invoices(true).await?;
    assert_eq!(invoices[0].status, InvoiceStatus::Open);
    assert_eq!(invoices[0].payment_hash.as_deref(), Some("ab".repeat(32).as_str()));
    assert_eq!(invoices[0].expires_at, Some(1_700_003_600));
    assert_eq!(invoices[0].amount_sat, Some(21));
    // add_index is a sequence number, not a label.
    assert_eq!(invoices[0].label, None);
    assert_eq!(invoices[0].raw["add_index"], "3");
    assert_eq!(mock.last_request().unwrap().query(), Some("pending_only=true"));

    client.list_invoices(false).await?;
    assert_eq!(mock.last_request().unwrap().query(), None);

    let payments = client.list_payments().await?;
    assert_eq!(payments[0].status, PaymentStatus::Complete);
    assert_eq!(payments[0].destination.as_deref(), Some("03bb"));
    assert_eq!(payments[0].amount_sent_sat, Some(10));
    assert_eq!(payments[0].fee_sat, Some(0));

    let peers = client.list_peers().await?;
    assert_eq!(peers[0].address.as_deref(), Some("172.18.0.4:9735"));
    Ok(())
}

#[tokio::test]
async fn test_peer_and_channel_requests() -> Result<()> {
    let (mock, client) = setup().await?;
    mock.on("POST", "/v1/peers", 200, &json!({}));
    mock.on(
        "POST",
        "/v1/channels",
        200,
        &json!({"funding_txid_bytes": "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=", "output_index": 0}),
    );
    mock.on(
        "POST",
        "/v1/graph/routes",
        200,
        &json!({"routes": [{
            "total_time_lock": 520,
            "total_fees": "0",
            "total_amt": "1000",
            "total_fees_msat": "1000",
            "total_amt_msat": "1001000",
            "hops": [{"chan_id": "453083565588480", "expiry": 520, "amt_to_forward_msat": "1000000", "pub_key": "03bb"}]
        }]}),
    );

    let peer = PeerAddress::new("03bb", Some("172.18.0.4"), Some(9735));
    client.connect_peer(&peer).await?;
    assert_eq!(
        mock.last_request().unwrap().json(),
        json!({"addr": {"pubkey": "03bb", "host": "172.18.0.4:9735"}})
    );

    let err = client
        .connect_peer(&PeerAddress::new("03bb", None, None))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let opened = client.open_channel("03bb", 250_000, 1_000).await?;
    assert_eq!(
        opened.funding_txid,
        "1f1e1d1c1b1a191817161514131211100f0e0d0c0b0a09080706050403020100"
    );
    assert_eq!(opened.output_index, Some(0));
    assert_eq!(
        mock.last_request().unwrap().json(),
        json!({"node_pubkey_string": "03bb", "local_funding_amount": "250000", "push_sat": "1000"})
    );

    let routes = client.get_route("03bb", 1000).await?;
    assert_eq!(routes[0].total_amt_msat, 1_001_000);
    assert_eq!(routes[0].hops[0].pubkey, "03bb");
    assert_eq!(
        mock.last_request().unwrap().json(),
        json!({"pub_key": "03bb", "amt": "1000"})
    );
    Ok(())
}
