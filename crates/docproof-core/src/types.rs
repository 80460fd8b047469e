//! Ledger identifiers and transaction types
//!
//! Fixed-width byte values (`Address`, `TxHash`) serialize as `0x`-prefixed
//! lower-case hex so they round-trip through JSON-RPC and configuration files
//! unchanged.

use crate::errors::ProofError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network identity of a ledger (EIP-155 chain id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(u64);

impl ChainId {
    /// Wrap a raw chain id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw numeric value
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Minimal lower-case hex quantity, as wallets expect (`0xaa36a7`)
    pub fn to_hex(&self) -> String {
        format!("{:#x}", self.0)
    }

    /// Parse a JSON-RPC hex quantity
    pub fn from_hex(quantity: &str) -> Result<Self, ProofError> {
        let digits = strip_hex_prefix(quantity.trim()).ok_or_else(|| {
            ProofError::rpc(None, format!("chain id '{quantity}' is not a hex quantity"))
        })?;
        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| ProofError::rpc(None, format!("chain id '{quantity}': {e}")))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Accepts decimal (`11155111`) or hex (`0xaa36a7`)
impl FromStr for ChainId {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if strip_hex_prefix(s).is_some() {
            return Self::from_hex(s)
                .map_err(|_| ProofError::configuration(format!("invalid chain id '{s}'")));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| ProofError::configuration(format!("invalid chain id '{s}'")))
    }
}

/// 20-byte account or contract address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// Wrap raw address bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = strip_hex_prefix(s).unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| ProofError::configuration(format!("invalid address '{s}': {e}")))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = ProofError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// 32-byte transaction hash
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Wrap raw hash bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw hash bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for TxHash {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = strip_hex_prefix(s).unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| ProofError::rpc(None, format!("invalid transaction hash '{s}': {e}")))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for TxHash {
    type Error = ProofError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TxHash> for String {
    fn from(hash: TxHash) -> Self {
        hash.to_string()
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

/// Reference to a broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHandle {
    /// Hash returned by the broadcast
    pub tx_hash: TxHash,
    /// Chain the transaction was broadcast on
    pub chain_id: ChainId,
    /// Sending account
    pub from: Address,
}

/// Network verdict on a broadcast transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOutcome {
    /// Included and executed successfully
    Confirmed {
        /// Block the transaction was included in
        block_number: u64,
    },
    /// Included but reverted
    Failed {
        /// Block the transaction was included in
        block_number: u64,
    },
}

/// Lifecycle of an anchor write as seen by its submitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Broadcast, outcome not yet known
    Submitted,
    /// Included and executed successfully
    Confirmed {
        /// Inclusion block
        block_number: u64,
    },
    /// Included but reverted
    Failed {
        /// Inclusion block
        block_number: u64,
    },
}

/// A submitted anchor write, owned by the caller that submitted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorTransaction {
    /// Broadcast reference
    pub handle: TransactionHandle,
    /// Current status
    pub status: TxStatus,
}

impl AnchorTransaction {
    /// Track a freshly broadcast transaction
    pub fn submitted(handle: TransactionHandle) -> Self {
        Self {
            handle,
            status: TxStatus::Submitted,
        }
    }

    /// Record the network's verdict
    pub fn resolve(&mut self, outcome: TxOutcome) {
        self.status = match outcome {
            TxOutcome::Confirmed { block_number } => TxStatus::Confirmed { block_number },
            TxOutcome::Failed { block_number } => TxStatus::Failed { block_number },
        };
    }

    /// Whether the network has reported an outcome
    pub fn is_final(&self) -> bool {
        !matches!(self.status, TxStatus::Submitted)
    }
}

pub(crate) fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}
