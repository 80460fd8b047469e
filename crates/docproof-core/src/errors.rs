//! Unified error taxonomy for docproof
//!
//! Every failure a workflow step can produce maps onto exactly one
//! [`ProofError`] variant. Callers branch on the variant; operators read the
//! remediation hint. Nothing in the client collapses these into a generic
//! "failed".

use crate::networks;
use crate::types::{Address, ChainId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of failures surfaced by the anchoring client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ProofError {
    /// Required configuration is missing or unparseable
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is missing or invalid
        message: String,
    },

    /// No usable connection capability
    #[error("Connectivity error: {message}")]
    Connectivity {
        /// Why the connection could not be used
        message: String,
    },

    /// The connection targets a different network than configured
    #[error("Wrong network: connected to chain {actual}, expected chain {expected}; {hint}")]
    ChainMismatch {
        /// Configured target chain
        expected: ChainId,
        /// Chain the connection reported
        actual: ChainId,
        /// User-facing remediation hint
        hint: String,
    },

    /// No contract code is deployed at the configured address
    #[error("No contract code at {address} on chain {chain_id}")]
    ContractNotFound {
        /// Configured contract address
        address: Address,
        /// Chain that was queried
        chain_id: ChainId,
    },

    /// Digest is wider than the ledger's 32-byte slot
    #[error("Invalid digest length: {bytes} bytes exceeds the 32-byte ledger slot")]
    InvalidDigestLength {
        /// Byte length of the rejected input
        bytes: usize,
    },

    /// Digest text is not hexadecimal
    #[error("Malformed digest: {message}")]
    MalformedDigest {
        /// What was wrong with the input
        message: String,
    },

    /// The digest collaborator did not return a digest
    #[error("Digest unavailable for document '{document_id}': {message}")]
    DigestUnavailable {
        /// Document the digest was requested for
        document_id: String,
        /// Collaborator-provided reason
        message: String,
    },

    /// Transport or node failure
    #[error("RPC error: {message}")]
    Rpc {
        /// JSON-RPC error code, when the node supplied one
        code: Option<i64>,
        /// Error message from the node or transport
        message: String,
    },

    /// The signer declined the request
    #[error("Signing rejected: {message}")]
    SigningRejected {
        /// Reason reported by the signer
        message: String,
    },

    /// The sending account cannot pay for the transaction
    #[error("Insufficient funds: {message}")]
    InsufficientFunds {
        /// Reason reported by the node
        message: String,
    },

    /// Anything the ledger reported that fits no other variant
    #[error("Unknown ledger error: {message}")]
    UnknownLedger {
        /// Error description
        message: String,
    },
}

impl ProofError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connectivity error
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
        }
    }

    /// Create a chain mismatch error with a "switch wallet to network X" hint
    pub fn chain_mismatch(expected: ChainId, actual: ChainId) -> Self {
        Self::ChainMismatch {
            expected,
            actual,
            hint: format!(
                "switch wallet to network {}",
                networks::display_name(expected)
            ),
        }
    }

    /// Create a contract-not-found error
    pub fn contract_not_found(address: Address, chain_id: ChainId) -> Self {
        Self::ContractNotFound { address, chain_id }
    }

    /// Create a malformed digest error
    pub fn malformed_digest(message: impl Into<String>) -> Self {
        Self::MalformedDigest {
            message: message.into(),
        }
    }

    /// Create a digest-unavailable error
    pub fn digest_unavailable(document_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DigestUnavailable {
            document_id: document_id.into(),
            message: message.into(),
        }
    }

    /// Create an RPC error
    pub fn rpc(code: Option<i64>, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    /// Create a signing-rejected error
    pub fn signing_rejected(message: impl Into<String>) -> Self {
        Self::SigningRejected {
            message: message.into(),
        }
    }

    /// Create an insufficient-funds error
    pub fn insufficient_funds(message: impl Into<String>) -> Self {
        Self::InsufficientFunds {
            message: message.into(),
        }
    }

    /// Create a catch-all ledger error
    pub fn unknown_ledger(message: impl Into<String>) -> Self {
        Self::UnknownLedger {
            message: message.into(),
        }
    }

    /// Stable, machine-readable identifier for this error variant
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION",
            Self::Connectivity { .. } => "CONNECTIVITY",
            Self::ChainMismatch { .. } => "CHAIN_MISMATCH",
            Self::ContractNotFound { .. } => "CONTRACT_NOT_FOUND",
            Self::InvalidDigestLength { .. } => "INVALID_DIGEST_LENGTH",
            Self::MalformedDigest { .. } => "MALFORMED_DIGEST",
            Self::DigestUnavailable { .. } => "DIGEST_UNAVAILABLE",
            Self::Rpc { .. } => "RPC_ERROR",
            Self::SigningRejected { .. } => "SIGNING_REJECTED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::UnknownLedger { .. } => "UNKNOWN_LEDGER",
        }
    }

    /// High-level category for frontend routing
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidDigestLength { .. } | Self::MalformedDigest { .. } => ErrorCategory::Input,
            Self::Configuration { .. } | Self::ContractNotFound { .. } => ErrorCategory::Config,
            Self::Connectivity { .. } | Self::Rpc { .. } | Self::DigestUnavailable { .. } => {
                ErrorCategory::Network
            }
            Self::ChainMismatch { .. }
            | Self::SigningRejected { .. }
            | Self::InsufficientFunds { .. } => ErrorCategory::Wallet,
            Self::UnknownLedger { .. } => ErrorCategory::Ledger,
        }
    }

    /// What the operator should do about this error
    pub fn remediation_hint(&self) -> String {
        match self {
            Self::Configuration { .. } => {
                "Set the target chain id and contract address in the configuration".to_string()
            }
            Self::Connectivity { .. } => {
                "Connect a wallet or check the RPC endpoint is reachable".to_string()
            }
            Self::ChainMismatch { hint, .. } => {
                let mut hint = hint.clone();
                if let Some(first) = hint.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                hint
            }
            Self::ContractNotFound { chain_id, .. } => format!(
                "Configured address is not a contract on {}; check the address and network",
                networks::display_name(*chain_id)
            ),
            Self::InvalidDigestLength { .. } | Self::MalformedDigest { .. } => {
                "Supply a SHA-256 digest of at most 64 hex digits".to_string()
            }
            Self::DigestUnavailable { .. } => {
                "Check the document exists and the digest service is reachable".to_string()
            }
            Self::Rpc { .. } => "Check the node or RPC endpoint and retry".to_string(),
            Self::SigningRejected { .. } => "Approve the request in your wallet".to_string(),
            Self::InsufficientFunds { .. } => {
                "Fund the sending account to cover transaction fees".to_string()
            }
            Self::UnknownLedger { .. } => "Inspect the transaction on a block explorer".to_string(),
        }
    }
}

/// Standard Result type for docproof operations
pub type Result<T> = std::result::Result<T, ProofError>;

/// High-level error categories for frontend error handling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Bad digest input
    Input,
    /// Fixable by editing configuration
    Config,
    /// Transport or collaborator failures, often transient
    Network,
    /// Wallet state or wallet decisions
    Wallet,
    /// Ledger-side failures
    Ledger,
}

impl ErrorCategory {
    /// Whether the operator can fix this without code changes
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Input | Self::Config | Self::Wallet)
    }

    /// Whether re-invoking the workflow may succeed without intervention
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Config => "Config",
            Self::Network => "Network",
            Self::Wallet => "Wallet",
            Self::Ledger => "Ledger",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
