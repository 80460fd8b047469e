//! Client configuration
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file,
//! `DOCPROOF_*` environment variables, then explicit overrides (CLI flags).
//! Blank values are treated as unset.
//!
//! The target chain and contract address have no defaults. Resolving a
//! [`LedgerTarget`] fails with [`ProofError::Configuration`] before any network
//! call when either is missing.

use crate::errors::{ProofError, Result};
use crate::types::{Address, ChainId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "DOCPROOF_";

/// Full client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    /// Target chain id (decimal or `0x` hex)
    pub chain_id: Option<String>,
    /// Anchor contract address
    pub contract_address: Option<String>,
    /// JSON-RPC endpoint of the wallet bridge or node
    pub rpc_url: String,
    /// Base URL of the document service API
    pub api_base: String,
    /// Bearer token for the document service
    pub auth_token: Option<String>,
    /// Receipt polling interval used by the JSON-RPC handler
    pub receipt_poll_interval_ms: u64,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            chain_id: None,
            contract_address: None,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            api_base: "http://127.0.0.1:5000/api".to_string(),
            auth_token: None,
            receipt_poll_interval_ms: 2_000,
            request_timeout_secs: 30,
        }
    }
}

/// Validated network and contract the client must talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTarget {
    /// Configured chain
    pub chain_id: ChainId,
    /// Configured contract
    pub contract: Address,
}

impl ProofConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProofError::configuration(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ProofError::configuration(format!("invalid config TOML: {e}")))
    }

    /// Apply `DOCPROOF_*` variables from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `DOCPROOF_*` variables from an explicit iterator
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            if let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) {
                let field = field.to_ascii_lowercase();
                if Self::is_known_key(&field) {
                    self.set_from_string(&field, value.as_ref())?;
                }
            }
        }
        Ok(())
    }

    /// Set one field by name (used for env and CLI overrides)
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let optional = || (!value.is_empty()).then(|| value.to_string());
        match key {
            "chain_id" => self.chain_id = optional(),
            "contract_address" => self.contract_address = optional(),
            "rpc_url" => {
                if !value.is_empty() {
                    self.rpc_url = value.to_string();
                }
            }
            "api_base" => {
                if !value.is_empty() {
                    self.api_base = value.to_string();
                }
            }
            "auth_token" => self.auth_token = optional(),
            "receipt_poll_interval_ms" => {
                self.receipt_poll_interval_ms = parse_number(key, value)?;
            }
            "request_timeout_secs" => {
                self.request_timeout_secs = parse_number(key, value)?;
            }
            other => {
                return Err(ProofError::configuration(format!(
                    "unknown configuration key '{other}'"
                )))
            }
        }
        Ok(())
    }

    fn is_known_key(key: &str) -> bool {
        matches!(
            key,
            "chain_id"
                | "contract_address"
                | "rpc_url"
                | "api_base"
                | "auth_token"
                | "receipt_poll_interval_ms"
                | "request_timeout_secs"
        )
    }

    /// Resolve the configured chain and contract
    ///
    /// # Errors
    /// [`ProofError::Configuration`] when either value is missing or invalid.
    pub fn ledger_target(&self) -> Result<LedgerTarget> {
        let chain_id = self
            .chain_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ProofError::configuration("target chain id not configured"))?
            .parse::<ChainId>()?;
        let contract = self
            .contract_address
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ProofError::configuration("contract address not configured"))?
            .parse::<Address>()?;
        Ok(LedgerTarget { chain_id, contract })
    }

    /// Configured chain id, if present and valid
    pub fn target_chain(&self) -> Result<ChainId> {
        self.chain_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ProofError::configuration("target chain id not configured"))?
            .parse()
    }

    /// Configured contract address; `Ok(None)` when unset
    pub fn contract(&self) -> Result<Option<Address>> {
        self.contract_address
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .transpose()
    }

    /// Validate everything that can be checked offline
    pub fn validate(&self) -> Result<()> {
        self.ledger_target()?;
        if self.receipt_poll_interval_ms == 0 {
            return Err(ProofError::configuration(
                "receipt_poll_interval_ms must be greater than 0",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ProofError::configuration(
                "request_timeout_secs must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Receipt polling interval
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| ProofError::configuration(format!("{key} must be a number, got '{value}'")))
}
