//! JSON-RPC ledger connection
//!
//! Speaks the EIP-1193 method set over HTTP to a wallet bridge or a node with
//! unlocked accounts. Wallet error codes are mapped onto [`ConnectionError`]
//! so the reconciler and ledger client can react to them by type.
//!
//! `wait_for_receipt` polls `eth_getTransactionReceipt` at a fixed interval
//! and has no deadline of its own.

use async_trait::async_trait;
use docproof_core::effects::{
    CallRequest, ConnectionEffects, ConnectionError, ConnectionEvent, ConnectionEventBus,
    TransactionRequest, TxReceipt,
};
use docproof_core::{Address, ChainId, KnownNetwork, ProofConfig, TxHash};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

/// EIP-1193: the user rejected the request
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-3085: the chain has not been added to the wallet
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// JSON-RPC: method not found
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: TxHash,
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Map a JSON-RPC error object onto the connection error taxonomy
pub fn classify_rpc_error(code: i64, message: &str) -> ConnectionError {
    let lowered = message.to_ascii_lowercase();
    if code == USER_REJECTED_CODE {
        ConnectionError::UserRejected {
            reason: message.to_string(),
        }
    } else if lowered.contains("insufficient funds") {
        ConnectionError::InsufficientFunds {
            reason: message.to_string(),
        }
    } else {
        ConnectionError::Rpc {
            code,
            message: message.to_string(),
        }
    }
}

fn is_unrecognized_chain(code: i64, message: &str) -> bool {
    code == UNRECOGNIZED_CHAIN_CODE
        || message
            .to_ascii_lowercase()
            .contains("unrecognized chain id")
}

/// Parse a `0x` hex quantity
pub fn parse_quantity(quantity: &str) -> Result<u64, ConnectionError> {
    let digits = quantity
        .strip_prefix("0x")
        .or_else(|| quantity.strip_prefix("0X"))
        .ok_or_else(|| ConnectionError::Decode {
            reason: format!("quantity '{quantity}' lacks 0x prefix"),
        })?;
    u64::from_str_radix(digits, 16).map_err(|e| ConnectionError::Decode {
        reason: format!("invalid quantity '{quantity}': {e}"),
    })
}

fn decode_data(data: &str) -> Result<Vec<u8>, ConnectionError> {
    let digits = data
        .strip_prefix("0x")
        .or_else(|| data.strip_prefix("0X"))
        .unwrap_or(data);
    hex::decode(digits).map_err(|e| ConnectionError::Decode {
        reason: format!("invalid hex data: {e}"),
    })
}

/// Connection handler backed by an HTTP JSON-RPC endpoint
#[derive(Debug)]
pub struct JsonRpcConnection {
    client: Client,
    endpoint: String,
    poll_interval: Duration,
    request_id: AtomicU64,
    events: ConnectionEventBus,
}

impl JsonRpcConnection {
    /// Connection to `endpoint` with explicit timing
    pub fn new(
        endpoint: impl Into<String>,
        request_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self, ConnectionError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ConnectionError::Unavailable {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            poll_interval,
            request_id: AtomicU64::new(1),
            events: ConnectionEventBus::default(),
        })
    }

    /// Connection configured from `rpc_url` and the timing fields
    pub fn from_config(config: &ProofConfig) -> Result<Self, ConnectionError> {
        Self::new(
            config.rpc_url.clone(),
            config.request_timeout(),
            config.receipt_poll_interval(),
        )
    }

    /// Endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issue one request; `Ok(None)` when the endpoint returned a null result
    async fn request_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, ConnectionError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        trace!(method, id, "JSON-RPC request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ConnectionError::Unavailable {
                        reason: format!("cannot reach {}: {e}", self.endpoint),
                    }
                } else {
                    ConnectionError::Transport {
                        reason: format!("{method} failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectionError::Transport {
                reason: format!("{method}: HTTP {status} {body}"),
            });
        }

        let body: RpcResponse<T> = response.json().await.map_err(|e| ConnectionError::Decode {
            reason: format!("{method}: {e}"),
        })?;
        if let Some(error) = body.error {
            debug!(method, code = error.code, message = %error.message, "JSON-RPC error");
            return Err(ConnectionError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(body.result)
    }

    /// Issue one request whose result must be present
    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ConnectionError> {
        self.request_optional(method, params)
            .await?
            .ok_or_else(|| ConnectionError::Decode {
                reason: format!("{method}: empty result"),
            })
    }

    /// Issue a wallet-facing request, mapping wallet error codes
    async fn wallet_request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ConnectionError> {
        self.request(method, params).await.map_err(|e| match e {
            ConnectionError::Rpc { code, message } => classify_rpc_error(code, &message),
            other => other,
        })
    }
}

#[async_trait]
impl ConnectionEffects for JsonRpcConnection {
    async fn request_accounts(&self) -> Result<Vec<Address>, ConnectionError> {
        match self
            .wallet_request::<Vec<Address>>("eth_requestAccounts", json!([]))
            .await
        {
            // plain nodes expose unlocked accounts without a permission prompt
            Err(ConnectionError::Rpc { code, .. }) if code == METHOD_NOT_FOUND_CODE => {
                self.request("eth_accounts", json!([])).await
            }
            other => other,
        }
    }

    async fn chain_id(&self) -> Result<ChainId, ConnectionError> {
        let quantity: String = self.request("eth_chainId", json!([])).await?;
        Ok(ChainId::new(parse_quantity(&quantity)?))
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ConnectionError> {
        let params = json!([{ "chainId": chain_id.to_hex() }]);
        let result: Result<Option<Value>, ConnectionError> = self
            .request_optional("wallet_switchEthereumChain", params)
            .await;
        match result {
            Ok(_) => {
                info!(chain_id = %chain_id, "wallet switched chain");
                self.events.publish(ConnectionEvent::ChainChanged(chain_id));
                Ok(())
            }
            Err(ConnectionError::Rpc { code, message })
                if is_unrecognized_chain(code, &message) =>
            {
                Err(ConnectionError::UnrecognizedChain { chain_id })
            }
            Err(ConnectionError::Rpc { code, message }) => Err(classify_rpc_error(code, &message)),
            Err(other) => Err(other),
        }
    }

    async fn add_chain(&self, network: &KnownNetwork) -> Result<(), ConnectionError> {
        let mut entry = json!({
            "chainId": network.chain_id.to_hex(),
            "chainName": network.name,
            "rpcUrls": network.rpc_urls,
            "nativeCurrency": network.native_currency,
        });
        if !network.block_explorer_urls.is_empty() {
            entry["blockExplorerUrls"] = json!(network.block_explorer_urls);
        }
        self.request_optional::<Value>("wallet_addEthereumChain", json!([entry]))
            .await
            .map_err(|e| match e {
                ConnectionError::Rpc { code, message } => classify_rpc_error(code, &message),
                other => other,
            })?;
        info!(chain_id = %network.chain_id, name = network.name, "wallet registered chain");
        Ok(())
    }

    async fn code_at(&self, address: &Address) -> Result<Vec<u8>, ConnectionError> {
        let code: String = self
            .request("eth_getCode", json!([address, "latest"]))
            .await?;
        decode_data(&code)
    }

    async fn call(&self, request: &CallRequest) -> Result<Vec<u8>, ConnectionError> {
        let output: String = self.request("eth_call", json!([request, "latest"])).await?;
        decode_data(&output)
    }

    async fn send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TxHash, ConnectionError> {
        self.wallet_request("eth_sendTransaction", json!([request]))
            .await
    }

    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<TxReceipt, ConnectionError> {
        loop {
            let receipt: Option<RawReceipt> = self
                .request_optional("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            // pending transactions have no receipt, or a receipt without a block
            if let Some(RawReceipt {
                transaction_hash,
                block_number: Some(block_number),
                status,
            }) = receipt
            {
                let success = match status.as_deref() {
                    Some(status) => parse_quantity(status)? == 1,
                    // receipts from before status codes existed carry no status
                    None => true,
                };
                return Ok(TxReceipt {
                    tx_hash: transaction_hash,
                    block_number: parse_quantity(&block_number)?,
                    success,
                });
            }
            trace!(tx_hash = %tx_hash, "receipt not yet available");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }
}
