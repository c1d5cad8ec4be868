//! JSON-RPC and indexer clients against a local HTTP server

mod common;

use std::sync::Arc;
use std::time::Duration;

use lunagens::error::{IndexerError, RpcError};
use lunagens::infrastructure::ethereum::{HttpRpc, JsonRpc, RetryPolicy};
use lunagens::infrastructure::indexer::{HttpIndexer, Indexer};
use serde_json::{json, Value};

use common::serve_canned;

fn client(max_attempts: u32) -> HttpRpc {
    HttpRpc::new(
        Duration::from_secs(5),
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        },
    )
    .unwrap()
}

fn ok(body: Value) -> (u16, String) {
    (200, body.to_string())
}

#[tokio::test]
async fn test_request_returns_result() {
    let (url, bodies) = serve_canned(vec![ok(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x61" }))]).await;

    let value = client(3).request(&url, "eth_chainId", json!([])).await.unwrap();
    assert_eq!(value, json!("0x61"));

    let sent: Value = serde_json::from_str(&bodies.lock().unwrap()[0]).unwrap();
    assert_eq!(sent["jsonrpc"], "2.0");
    assert_eq!(sent["method"], "eth_chainId");
    assert_eq!(sent["params"], json!([]));
}

#[tokio::test]
async fn test_rpc_error_is_not_retried() {
    let (url, bodies) = serve_canned(vec![ok(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": { "code": -32000, "message": "execution reverted" }
    }))])
    .await;

    let err = client(3).request(&url, "eth_call", json!([])).await.unwrap_err();
    assert_eq!(
        err,
        RpcError::Rpc {
            code: -32000,
            message: "execution reverted".into()
        }
    );
    assert_eq!(bodies.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_gateway_error_is_retried() {
    let (url, bodies) = serve_canned(vec![
        (503, "<html>busy</html>".to_string()),
        ok(json!({ "jsonrpc": "2.0", "id": 2, "result": "0x10" })),
    ])
    .await;

    let value = client(3).request(&url, "eth_blockNumber", json!([])).await.unwrap();
    assert_eq!(value, json!("0x10"));
    assert_eq!(bodies.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let (url, bodies) = serve_canned(vec![(502, "bad gateway".to_string())]).await;

    let err = client(2).request(&url, "eth_blockNumber", json!([])).await.unwrap_err();
    assert!(matches!(err, RpcError::Transport(_)));
    assert_eq!(bodies.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (url, _) = serve_canned(vec![(200, "not json".to_string())]).await;
    let err = client(3).request(&url, "eth_chainId", json!([])).await.unwrap_err();
    assert!(matches!(err, RpcError::Malformed(_)));

    let (url, _) = serve_canned(vec![ok(json!({ "jsonrpc": "2.0", "id": 1 }))]).await;
    let err = client(3).request(&url, "eth_chainId", json!([])).await.unwrap_err();
    assert!(matches!(err, RpcError::Malformed(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = client(2).request(&url, "eth_chainId", json!([])).await.unwrap_err();
    assert!(matches!(err, RpcError::Transport(_)));
}

#[tokio::test]
async fn test_indexer_strips_result_envelope() {
    let (url, _) = serve_canned(vec![ok(json!({
        "result": { "totalItems": 45, "items": ["0x01", "0x02"] }
    }))])
    .await;
    let indexer = Indexer::new(Arc::new(HttpIndexer::new(&url, Duration::from_secs(5)).unwrap()));

    let page = indexer.staking_pools(56, 2).await.unwrap();
    assert_eq!(page.total_items, 45);
    assert_eq!(page.items, vec!["0x01".to_string(), "0x02".to_string()]);
}

#[tokio::test]
async fn test_indexer_status_and_envelope_errors() {
    let (url, _) = serve_canned(vec![(500, "boom".to_string())]).await;
    let indexer = Indexer::new(Arc::new(HttpIndexer::new(&url, Duration::from_secs(5)).unwrap()));
    let err = indexer.top_pairs(97).await.unwrap_err();
    assert!(matches!(err, IndexerError::Status { status: 500, .. }));

    let (url, _) = serve_canned(vec![ok(json!({ "data": [] }))]).await;
    let indexer = Indexer::new(Arc::new(HttpIndexer::new(&url, Duration::from_secs(5)).unwrap()));
    let err = indexer.top_pairs(97).await.unwrap_err();
    assert!(matches!(err, IndexerError::Malformed(_)));
}
