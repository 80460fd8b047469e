//! JSON-RPC connection against a fake wallet endpoint served by axum

use assert_matches::assert_matches;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use docproof_core::effects::{
    CallRequest, ConnectionEffects, ConnectionError, ConnectionEvent, TransactionRequest,
};
use docproof_core::{networks, Address, ChainId, ProofError};
use docproof_effects::JsonRpcConnection;
use docproof_ledger::NetworkReconciler;
use docproof_testkit::fixtures::{CONTRACT, LOCAL_DEV, MAINNET, SEPOLIA};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const SENDER: &str = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1";
const TX_HASH: &str = "0x00000000000000000000000000000000000000000000000000000000000000aa";

#[derive(Debug)]
struct WalletState {
    chain_id: u64,
    known_chains: BTreeSet<u64>,
    reject_switch: bool,
    supports_request_accounts: bool,
    broke: bool,
    pending_polls: u32,
    receipt_status: &'static str,
    methods: Vec<String>,
}

#[derive(Debug, Clone)]
struct FakeWallet(Arc<Mutex<WalletState>>);

impl FakeWallet {
    fn on_chain(chain_id: u64) -> Self {
        Self(Arc::new(Mutex::new(WalletState {
            chain_id,
            known_chains: [chain_id, 1, 11_155_111].into_iter().collect(),
            reject_switch: false,
            supports_request_accounts: true,
            broke: false,
            pending_polls: 0,
            receipt_status: "0x1",
            methods: Vec::new(),
        })))
    }

    fn configure(self, f: impl FnOnce(&mut WalletState)) -> Self {
        f(&mut self.0.lock());
        self
    }

    fn methods(&self) -> Vec<String> {
        self.0.lock().methods.clone()
    }

    fn count(&self, method: &str) -> usize {
        self.0.lock().methods.iter().filter(|m| *m == method).count()
    }
}

fn ok(id: &Value, result: Value) -> Json<Value> {
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

fn err(id: &Value, code: i64, message: &str) -> Json<Value> {
    Json(json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } }))
}

fn requested_chain(params: &Value) -> u64 {
    params[0]["chainId"]
        .as_str()
        .and_then(|hex| u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok())
        .unwrap_or_default()
}

async fn rpc(State(wallet): State<FakeWallet>, Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request["params"].clone();
    let mut state = wallet.0.lock();
    state.methods.push(method.clone());

    match method.as_str() {
        "eth_chainId" => ok(&id, json!(format!("{:#x}", state.chain_id))),
        "eth_requestAccounts" if !state.supports_request_accounts => {
            err(&id, -32601, "Method eth_requestAccounts not found")
        }
        "eth_requestAccounts" | "eth_accounts" => ok(&id, json!([SENDER])),
        "wallet_switchEthereumChain" => {
            let chain = requested_chain(&params);
            if state.reject_switch {
                err(&id, 4001, "User rejected the request.")
            } else if !state.known_chains.contains(&chain) {
                err(&id, 4902, &format!("Unrecognized chain ID \"{chain:#x}\""))
            } else {
                state.chain_id = chain;
                ok(&id, Value::Null)
            }
        }
        "wallet_addEthereumChain" => {
            let chain = requested_chain(&params);
            if params[0]["chainName"].is_string() && params[0]["rpcUrls"].is_array() {
                state.known_chains.insert(chain);
                ok(&id, Value::Null)
            } else {
                err(&id, -32602, "invalid chain parameters")
            }
        }
        "eth_getCode" => {
            let address = params[0].as_str().unwrap_or_default();
            if address == CONTRACT.to_string() && state.chain_id == 11_155_111 {
                ok(&id, json!("0x6080604052"))
            } else {
                ok(&id, json!("0x"))
            }
        }
        "eth_call" => ok(&id, json!(format!("0x{:064x}", 1))),
        "eth_sendTransaction" if state.broke => err(
            &id,
            -32000,
            "insufficient funds for gas * price + value",
        ),
        "eth_sendTransaction" => ok(&id, json!(TX_HASH)),
        "eth_getTransactionReceipt" => {
            if state.pending_polls > 0 {
                state.pending_polls -= 1;
                ok(&id, Value::Null)
            } else {
                ok(
                    &id,
                    json!({
                        "transactionHash": TX_HASH,
                        "blockNumber": "0x10",
                        "status": state.receipt_status,
                    }),
                )
            }
        }
        _ => err(&id, -32601, "method not found"),
    }
}

async fn serve(wallet: FakeWallet) -> JsonRpcConnection {
    let app = Router::new().route("/", post(rpc)).with_state(wallet);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    JsonRpcConnection::new(
        format!("http://{addr}"),
        Duration::from_secs(5),
        Duration::from_millis(10),
    )
    .unwrap()
}

#[tokio::test]
async fn reads_chain_and_switches_known_chain() {
    let wallet = FakeWallet::on_chain(1);
    let conn = serve(wallet.clone()).await;
    let mut events = conn.subscribe();

    assert_eq!(conn.chain_id().await.unwrap(), MAINNET);
    conn.switch_chain(SEPOLIA).await.unwrap();
    assert_eq!(conn.chain_id().await.unwrap(), SEPOLIA);
    assert_eq!(
        events.recv().await.unwrap(),
        ConnectionEvent::ChainChanged(SEPOLIA)
    );
}

#[tokio::test]
async fn unknown_chain_is_registered_through_reconciler() {
    let wallet = FakeWallet::on_chain(1);
    let conn = serve(wallet.clone()).await;

    assert_matches!(
        conn.switch_chain(LOCAL_DEV).await,
        Err(ConnectionError::UnrecognizedChain { chain_id }) if chain_id == LOCAL_DEV
    );

    NetworkReconciler::new(LOCAL_DEV)
        .reconcile(&conn)
        .await
        .unwrap();
    assert_eq!(conn.chain_id().await.unwrap(), LOCAL_DEV);
    assert_eq!(wallet.count("wallet_addEthereumChain"), 1);
    assert_eq!(wallet.count("wallet_switchEthereumChain"), 3);
}

#[tokio::test]
async fn declined_switch_becomes_chain_mismatch() {
    let wallet = FakeWallet::on_chain(1).configure(|s| s.reject_switch = true);
    let conn = serve(wallet.clone()).await;

    assert_matches!(
        conn.switch_chain(SEPOLIA).await,
        Err(ConnectionError::UserRejected { .. })
    );
    assert_matches!(
        NetworkReconciler::new(SEPOLIA).reconcile(&conn).await,
        Err(ProofError::ChainMismatch { .. })
    );
}

#[tokio::test]
async fn add_chain_sends_registration_fields() {
    let wallet = FakeWallet::on_chain(1);
    let conn = serve(wallet.clone()).await;
    conn.add_chain(&networks::HOLESKY).await.unwrap();
    conn.switch_chain(ChainId::new(17_000)).await.unwrap();
    assert_eq!(conn.chain_id().await.unwrap(), ChainId::new(17_000));
}

#[tokio::test]
async fn code_and_call_decode_hex_data() {
    let wallet = FakeWallet::on_chain(11_155_111);
    let conn = serve(wallet).await;

    assert_eq!(
        conn.code_at(&CONTRACT).await.unwrap(),
        vec![0x60, 0x80, 0x60, 0x40, 0x52]
    );
    assert!(conn
        .code_at(&Address::from_bytes([7; 20]))
        .await
        .unwrap()
        .is_empty());

    let output = conn
        .call(&CallRequest {
            to: CONTRACT,
            data: vec![0xde, 0xad],
        })
        .await
        .unwrap();
    assert_eq!(output.len(), 32);
    assert_eq!(output[31], 1);
}

#[tokio::test]
async fn receipt_is_polled_until_included() {
    let wallet = FakeWallet::on_chain(11_155_111).configure(|s| s.pending_polls = 3);
    let conn = serve(wallet.clone()).await;

    let tx_hash = conn
        .send_transaction(&TransactionRequest {
            from: SENDER.parse().unwrap(),
            to: CONTRACT,
            data: vec![1, 2, 3],
        })
        .await
        .unwrap();
    assert_eq!(tx_hash.to_string(), TX_HASH);

    let receipt = conn.wait_for_receipt(&tx_hash).await.unwrap();
    assert!(receipt.success);
    assert_eq!(receipt.block_number, 16);
    assert_eq!(wallet.count("eth_getTransactionReceipt"), 4);
}

#[tokio::test]
async fn reverted_receipt_reports_failure() {
    let wallet = FakeWallet::on_chain(11_155_111).configure(|s| s.receipt_status = "0x0");
    let conn = serve(wallet).await;
    let receipt = conn
        .wait_for_receipt(&TX_HASH.parse().unwrap())
        .await
        .unwrap();
    assert!(!receipt.success);
}

#[tokio::test]
async fn insufficient_funds_is_typed() {
    let wallet = FakeWallet::on_chain(11_155_111).configure(|s| s.broke = true);
    let conn = serve(wallet).await;
    let err = conn
        .send_transaction(&TransactionRequest {
            from: SENDER.parse().unwrap(),
            to: CONTRACT,
            data: Vec::new(),
        })
        .await
        .unwrap_err();
    assert_matches!(err, ConnectionError::InsufficientFunds { .. });
    assert_matches!(ProofError::from(err), ProofError::InsufficientFunds { .. });
}

#[tokio::test]
async fn plain_node_accounts_fallback() {
    let wallet = FakeWallet::on_chain(31_337).configure(|s| s.supports_request_accounts = false);
    let conn = serve(wallet.clone()).await;

    let accounts = conn.request_accounts().await.unwrap();
    assert_eq!(accounts, vec![SENDER.parse::<Address>().unwrap()]);
    assert_eq!(
        wallet.methods(),
        vec!["eth_requestAccounts", "eth_accounts"]
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let conn = JsonRpcConnection::new(
        format!("http://{addr}"),
        Duration::from_secs(2),
        Duration::from_millis(10),
    )
    .unwrap();
    assert_matches!(
        conn.chain_id().await,
        Err(ConnectionError::Unavailable { .. })
    );
}
