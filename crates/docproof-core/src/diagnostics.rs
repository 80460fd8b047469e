//! Diagnostic result types
//!
//! Produced by the passive probe for display; never an error path.

use crate::networks;
use crate::types::{Address, ChainId};
use serde::{Deserialize, Serialize};

/// Why a probe did or did not pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticReason {
    /// Connection on the target chain and contract code present
    Ok,
    /// No connection capability available
    NoConnection,
    /// Connection on a different chain than configured
    WrongChain,
    /// No code at the configured contract address
    NoContractCode,
}

impl DiagnosticReason {
    /// Pick the reason from probe observations
    ///
    /// Missing connection dominates, then missing code, then chain mismatch.
    pub fn classify(has_connection: bool, chain_matches: bool, has_code: bool) -> Self {
        if !has_connection {
            Self::NoConnection
        } else if !has_code {
            Self::NoContractCode
        } else if !chain_matches {
            Self::WrongChain
        } else {
            Self::Ok
        }
    }
}

/// Observations gathered by the probe
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiagnosticDetails {
    /// Chain the client is configured for
    pub configured_chain_id: Option<ChainId>,
    /// Chain the connection reported, if it answered
    pub wallet_chain_id: Option<ChainId>,
    /// Configured contract address
    pub contract_address: Option<Address>,
    /// Byte length of the code found at the address
    pub code_length: usize,
    /// Whether any code was found
    pub is_contract: bool,
    /// Errors swallowed while probing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Structured probe outcome for passive display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    /// True only for [`DiagnosticReason::Ok`]
    pub ok: bool,
    /// Classified reason
    pub reason: DiagnosticReason,
    /// Raw observations
    pub details: DiagnosticDetails,
}

impl DiagnosticResult {
    /// Build a result, deriving `ok` from `reason`
    pub fn new(reason: DiagnosticReason, details: DiagnosticDetails) -> Self {
        Self {
            ok: reason == DiagnosticReason::Ok,
            reason,
            details,
        }
    }

    /// One-line operator message
    pub fn summary(&self) -> String {
        let target = self
            .details
            .configured_chain_id
            .map(networks::display_name)
            .unwrap_or_else(|| "the configured network".to_string());
        match self.reason {
            DiagnosticReason::Ok => format!("Ledger connection ready on {target}"),
            DiagnosticReason::NoConnection => {
                "No wallet or ledger connection available".to_string()
            }
            DiagnosticReason::WrongChain => {
                format!("Wrong chain in wallet; please switch to {target}")
            }
            DiagnosticReason::NoContractCode => {
                "Configured address is not a contract on the current network".to_string()
            }
        }
    }
}
