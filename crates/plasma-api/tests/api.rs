//! # Router Tests for plasma-api
//!
//! Drive the full router with `oneshot`: health probes, the block and tx
//! lifecycle, root publication, error codes, and request metrics.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use plasma_api::middleware::metrics::ApiMetrics;
use plasma_api::state::AppState;
use plasma_chain::{ChainConfig, ChildChain, MemoryStore, Tx, TxIn, TxOut};
use plasma_core::{decode_hex, Address, Digest32, Position};
use plasma_crypto::{verify_membership, Account};
use plasma_rootchain::{DepositWatcher, MemoryRootChain};

struct TestNode {
    chain: Arc<ChildChain>,
    root: Arc<MemoryRootChain>,
    operator: Arc<Account>,
    metrics: ApiMetrics,
}

impl TestNode {
    fn new() -> Self {
        let operator = Arc::new(Account::generate());
        Self {
            chain: Arc::new(
                ChildChain::open(Arc::new(MemoryStore::new()), ChainConfig::default()).unwrap(),
            ),
            root: Arc::new(MemoryRootChain::new(operator.address())),
            operator,
            metrics: ApiMetrics::new(),
        }
    }

    fn app(&self) -> axum::Router {
        let state = AppState::new(
            Arc::clone(&self.chain),
            Arc::clone(&self.operator),
            self.root.clone(),
        );
        plasma_api::app_with_metrics(state, self.metrics.clone())
    }

    /// Deposit on the root chain and apply the event, as the watcher would.
    fn deposit(&self, owner: Address, amount: u64) -> u64 {
        let event = self.root.deposit(owner, amount);
        DepositWatcher::new(Arc::clone(&self.chain), Arc::clone(&self.operator))
            .handle_event(&event)
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_string(response).await)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        (status, serde_json::from_str(&body).unwrap())
    }

    async fn send_json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let (status, body) = self
            .send(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        (status, serde_json::from_str(&body).unwrap())
    }

    async fn seal(&self) -> (StatusCode, Value) {
        let (status, body) = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/blocks")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        (status, serde_json::from_str(&body).unwrap())
    }
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn error_code(body: &Value) -> u64 {
    body["error"]["code"].as_u64().unwrap()
}

fn spend(owner: &Account, block: u64, to: Address, amount: u64) -> Tx {
    let mut tx = Tx::new(
        [TxIn::new(block, 0, 0), TxIn::null()],
        [TxOut::new(to, amount), TxOut::null()],
    );
    tx.sign(0, owner).unwrap();
    tx
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn health_probes_and_ping() {
    let node = TestNode::new();
    for (uri, expected) in [
        ("/health/liveness", "ok"),
        ("/health/readiness", "ready"),
        ("/ping", "pong"),
    ] {
        let (status, body) = node
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, expected);
    }
}

// -- Block and Tx Lifecycle ---------------------------------------------------

#[tokio::test]
async fn submit_seal_prove_confirm() {
    let node = TestNode::new();
    let alice = Account::generate();
    let bob = Address([0xbb; 20]);
    assert_eq!(node.deposit(alice.address(), 100), 1);

    // Submit.
    let tx = spend(&alice, 1, bob, 100);
    let (status, body) = node
        .send_json("POST", "/txes", json!({ "tx": tx.encode().to_hex() }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let pos = Position::tx(2, 0).unwrap();
    assert_eq!(body["pos"], pos.as_u64());
    assert_eq!(body["hash"], tx.hash().to_string());

    // Seal and publish.
    let (status, summary) = node.seal().await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(summary["num"], 2);
    assert_eq!(summary["txes"][0], tx.hash().to_string());
    let root = node.chain.get_block(2).unwrap().merkle_root().unwrap();
    assert_eq!(node.root.committed_roots(), vec![(2, root)]);

    // Lookup.
    let (status, body) = node.get(&format!("/txes/{pos}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tx"], tx.encode().to_hex());

    let (status, body) = node.get("/blocks/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, summary);

    // Proof.
    let (status, body) = node.get(&format!("/txes/{pos}/proof")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["root"], root.to_string());
    let proof = decode_hex(body["proof"].as_str().unwrap()).unwrap();
    assert_eq!(proof.len(), 16 * 32);
    assert!(verify_membership(&root, &tx.merkle_leaf(), 0, &proof));

    // Confirm.
    let confsig = alice.sign(&tx.confirmation_digest()).unwrap();
    let input = Position::input(2, 0, 0).unwrap();
    let (status, body) = node
        .send_json(
            "PUT",
            &format!("/txins/{input}"),
            json!({ "confsig": confsig.to_hex() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let stored = Tx::decode(&decode_hex(body["tx"].as_str().unwrap()).unwrap()).unwrap();
    assert_eq!(stored.inputs()[0].confirmation_signature, confsig);
    // Confirmation does not move the committed root.
    assert_eq!(node.chain.get_block(2).unwrap().merkle_root().unwrap(), root);
}

#[tokio::test]
async fn deposit_block_by_request() {
    let node = TestNode::new();
    let owner = Address([0x11; 20]);
    let (status, summary) = node
        .send_json(
            "POST",
            "/blocks",
            json!({ "type": "deposit", "owner": owner.to_hex(), "amount": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(summary["num"], 1);
    let tx = node.chain.get_tx(Position::tx(1, 0).unwrap()).unwrap();
    assert!(tx.is_deposit());
    assert_eq!(tx.outputs()[0], TxOut::new(owner, 5));
    assert!(node.root.committed_roots().is_empty());
    assert_eq!(node.metrics.snapshot().deposit_blocks, 1);
}

// -- Error Mapping ------------------------------------------------------------

#[tokio::test]
async fn malformed_path_is_20001() {
    let node = TestNode::new();
    let (status, body) = node.get("/blocks/latest").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), 20001);
    assert_eq!(body["error"]["message"], "'num' is invalid");

    let (status, body) = node.get("/txes/-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), 20001);
}

#[tokio::test]
async fn unknown_block_and_tx_are_not_found() {
    let node = TestNode::new();
    let (status, body) = node.get("/blocks/9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), 11001);
    assert_eq!(body["error"]["kind"], "NOT_FOUND");

    let (status, body) = node.get(&format!("/txes/{}", Position::tx(9, 0).unwrap())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), 11003);

    let (status, body) = node
        .get(&format!("/txes/{}/proof", Position::tx(9, 0).unwrap()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), 11003);
}

#[tokio::test]
async fn sealing_empty_block_is_conflict() {
    let node = TestNode::new();
    let (status, body) = node.seal().await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), 11002);
    assert!(node.root.committed_roots().is_empty());
}

#[tokio::test]
async fn body_parameter_errors_are_20002() {
    let node = TestNode::new();

    let (status, body) = node.send_json("POST", "/txes", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), 20002);
    assert_eq!(body["error"]["message"], "'tx' is required");

    let (status, body) = node.send_json("POST", "/txes", json!({ "tx": "0xnothex" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "'tx' is invalid");

    let (status, body) = node
        .send_json("POST", "/blocks", json!({ "type": "deposit", "amount": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "'owner' is required");

    let (status, body) = node
        .send_json("POST", "/blocks", json!({ "type": "withdraw" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "'type' is invalid");

    let (status, body) = node
        .send(
            Request::builder()
                .method("POST")
                .uri("/txes")
                .header("content-type", "application/json")
                .body(Body::from("{"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(error_code(&body), 20002);
}

#[tokio::test]
async fn double_spend_is_11010() {
    let node = TestNode::new();
    let alice = Account::generate();
    node.deposit(alice.address(), 10);

    let first = spend(&alice, 1, Address([1; 20]), 10);
    let (status, _) = node
        .send_json("POST", "/txes", json!({ "tx": first.encode().to_hex() }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let second = spend(&alice, 1, Address([2; 20]), 10);
    let (status, body) = node
        .send_json("POST", "/txes", json!({ "tx": second.encode().to_hex() }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), 11010);
    assert_eq!(node.chain.open_block_len(), 1);
}

#[tokio::test]
async fn forged_signature_and_overspend() {
    let node = TestNode::new();
    let alice = Account::generate();
    let mallory = Account::generate();
    node.deposit(alice.address(), 10);

    let forged = spend(&mallory, 1, mallory.address(), 10);
    let (status, body) = node
        .send_json("POST", "/txes", json!({ "tx": forged.encode().to_hex() }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), 11004);

    let greedy = spend(&alice, 1, alice.address(), 11);
    let (status, body) = node
        .send_json("POST", "/txes", json!({ "tx": greedy.encode().to_hex() }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), 11006);
}

#[tokio::test]
async fn confirmation_errors() {
    let node = TestNode::new();
    let alice = Account::generate();
    node.deposit(alice.address(), 10);
    let tx = spend(&alice, 1, Address([3; 20]), 10);
    node.chain.add_tx_to_mempool(tx.clone()).unwrap();
    node.chain.add_block(&node.operator).unwrap();

    // Null second input.
    let confsig = alice.sign(&tx.confirmation_digest()).unwrap();
    let (status, body) = node
        .send_json(
            "PUT",
            &format!("/txins/{}", Position::input(2, 0, 1).unwrap()),
            json!({ "confsig": confsig.to_hex() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), 11009);

    // Signed by someone other than the spent output's owner.
    let wrong = Account::generate()
        .sign(&tx.confirmation_digest())
        .unwrap();
    let (status, body) = node
        .send_json(
            "PUT",
            &format!("/txins/{}", Position::input(2, 0, 0).unwrap()),
            json!({ "confsig": wrong.to_hex() }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), 11005);

    let (status, body) = node
        .send_json(
            "PUT",
            &format!("/txins/{}", Position::input(2, 0, 0).unwrap()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "'confsig' is required");
}

#[tokio::test]
async fn block_limit_reports_limit() {
    let operator = Arc::new(Account::generate());
    let chain = Arc::new(
        ChildChain::open(
            Arc::new(MemoryStore::new()),
            ChainConfig {
                max_txes_per_block: 1,
            },
        )
        .unwrap(),
    );
    let root = Arc::new(MemoryRootChain::new(operator.address()));
    let alice = Account::generate();
    chain.add_deposit_block(alice.address(), 5, &operator).unwrap();
    chain.add_deposit_block(alice.address(), 5, &operator).unwrap();
    chain
        .add_tx_to_mempool(spend(&alice, 1, alice.address(), 5))
        .unwrap();

    let app = plasma_api::app(AppState::new(chain, operator, root));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/txes")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "tx": spend(&alice, 2, alice.address(), 5).encode().to_hex() })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(error_code(&body), 12001);
    assert_eq!(body["error"]["details"]["limit"], 1);
}

// -- Metrics ------------------------------------------------------------------

#[tokio::test]
async fn metrics_count_requests_and_errors() {
    let node = TestNode::new();
    let alice = Account::generate();
    node.deposit(alice.address(), 1);
    node.chain
        .add_tx_to_mempool(spend(&alice, 1, alice.address(), 1))
        .unwrap();

    node.get("/blocks/1").await;
    node.get("/blocks/77").await;
    node.seal().await;

    let (status, body) = node.get("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requests"], 3);
    assert_eq!(body["client_errors"], 1);
    assert_eq!(body["server_errors"], 0);
    assert_eq!(body["blocks_sealed"], 1);
    assert_eq!(node.metrics.requests(), 4);
    assert_eq!(node.metrics.errors(), 1);
}

#[tokio::test]
async fn digest_fields_are_hex() {
    let node = TestNode::new();
    node.deposit(Address([7; 20]), 3);
    let (_, body) = node.get("/blocks/1").await;
    let root: Digest32 = serde_json::from_value(body["root"].clone()).unwrap();
    assert_eq!(root, node.chain.get_block(1).unwrap().merkle_root().unwrap());
    assert!(body["sig"].as_str().unwrap().starts_with("0x"));
}
