//! Connection effect trait definitions
//!
//! A connection is whatever lets the client talk to the ledger on behalf of an
//! account: a browser wallet bridge, a node with unlocked accounts, or a test
//! double. Every ledger-facing operation receives one explicitly; there is no
//! ambient global provider.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `docproof-effects` (JSON-RPC), `docproof-testkit` (mock)
//! - **Usage**: reconciler, ledger client, diagnostics probe

use super::events::ConnectionEvent;
use crate::errors::ProofError;
use crate::networks::KnownNetwork;
use crate::types::{Address, ChainId, TxHash};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Failures reported by a connection handler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ConnectionError {
    /// No wallet or endpoint is available
    #[error("Connection unavailable: {reason}")]
    Unavailable {
        /// Why the connection is unusable
        reason: String,
    },
    /// The connection does not know the requested chain (EIP-3085 code 4902)
    #[error("Chain {chain_id} is not recognized by the connection")]
    UnrecognizedChain {
        /// Requested chain
        chain_id: ChainId,
    },
    /// The user declined the request (EIP-1193 code 4001)
    #[error("Request rejected: {reason}")]
    UserRejected {
        /// Reason given by the wallet
        reason: String,
    },
    /// The sending account cannot cover the transaction cost
    #[error("Insufficient funds: {reason}")]
    InsufficientFunds {
        /// Reason given by the node
        reason: String,
    },
    /// JSON-RPC error object returned by the endpoint
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message
        message: String,
    },
    /// The request never produced a JSON-RPC response
    #[error("Transport failed: {reason}")]
    Transport {
        /// Transport failure description
        reason: String,
    },
    /// The response could not be decoded
    #[error("Malformed response: {reason}")]
    Decode {
        /// Decoding failure description
        reason: String,
    },
}

impl From<ConnectionError> for ProofError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Unavailable { reason } => ProofError::connectivity(reason),
            ConnectionError::UnrecognizedChain { chain_id } => ProofError::rpc(
                Some(4902),
                format!("chain {chain_id} is not recognized by the connection"),
            ),
            ConnectionError::UserRejected { reason } => ProofError::signing_rejected(reason),
            ConnectionError::InsufficientFunds { reason } => ProofError::insufficient_funds(reason),
            ConnectionError::Rpc { code, message } => ProofError::rpc(Some(code), message),
            ConnectionError::Transport { reason } => ProofError::rpc(None, reason),
            ConnectionError::Decode { reason } => ProofError::unknown_ledger(reason),
        }
    }
}

/// Read-only contract call (`eth_call`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    /// Contract address
    pub to: Address,
    /// ABI-encoded calldata
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

/// State-mutating transaction (`eth_sendTransaction`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Sending account
    pub from: Address,
    /// Contract address
    pub to: Address,
    /// ABI-encoded calldata
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

/// Inclusion receipt for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Inclusion block
    pub block_number: u64,
    /// Execution status (false when reverted)
    pub success: bool,
}

/// Connection capability consumed by the anchoring client
///
/// Handlers are stateless from the client's point of view: the client never
/// caches chain ids or accounts between calls.
#[async_trait]
pub trait ConnectionEffects: Send + Sync {
    /// Request access to the user's accounts; the first is the sender
    async fn request_accounts(&self) -> Result<Vec<Address>, ConnectionError>;

    /// Chain the connection is currently pointed at
    async fn chain_id(&self) -> Result<ChainId, ConnectionError>;

    /// Ask the connection to switch to another chain
    ///
    /// Returns [`ConnectionError::UnrecognizedChain`] when the chain must be
    /// added first.
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ConnectionError>;

    /// Register a network with the connection
    async fn add_chain(&self, network: &KnownNetwork) -> Result<(), ConnectionError>;

    /// Deployed bytecode at an address; empty when there is none
    async fn code_at(&self, address: &Address) -> Result<Vec<u8>, ConnectionError>;

    /// Execute a read-only call and return the raw return data
    async fn call(&self, request: &CallRequest) -> Result<Vec<u8>, ConnectionError>;

    /// Sign and broadcast a transaction, returning once it is broadcast
    async fn send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TxHash, ConnectionError>;

    /// Suspend until the network reports the transaction's receipt
    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<TxReceipt, ConnectionError>;

    /// Subscribe to account and network change notifications
    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent>;
}

pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(&text);
        hex::decode(digits).map_err(serde::de::Error::custom)
    }
}
