//! Subcommand implementations

pub mod anchor;
pub mod diagnose;
pub mod networks;
pub mod verify;

use anyhow::anyhow;
use docproof_core::{LedgerTarget, ProofConfig, ProofError};
use docproof_effects::{HttpDigestSource, JsonRpcConnection};

/// Production handlers for one invocation
pub struct Handlers {
    pub target: LedgerTarget,
    pub connection: JsonRpcConnection,
    pub digests: HttpDigestSource,
}

impl Handlers {
    /// Validate the target first so configuration errors never reach the network
    pub fn from_config(config: &ProofConfig) -> Result<Self, ProofError> {
        config.validate()?;
        Ok(Self {
            target: config.ledger_target()?,
            connection: JsonRpcConnection::from_config(config)?,
            digests: HttpDigestSource::from_config(config)?,
        })
    }
}

/// Turn a typed failure into an operator-facing error
pub fn operator_error(error: &ProofError) -> anyhow::Error {
    anyhow!(
        "[{}] {error}\n  category: {}\n  hint: {}",
        error.code(),
        error.category(),
        error.remediation_hint()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_target_fails_before_building_handlers() {
        let error = Handlers::from_config(&ProofConfig::default())
            .err()
            .unwrap();
        assert!(matches!(error, ProofError::Configuration { .. }));
    }

    #[test]
    fn test_operator_error_names_code_and_hint() {
        let text = operator_error(&ProofError::signing_rejected("denied")).to_string();
        assert!(text.starts_with("[SIGNING_REJECTED]"));
        assert!(text.contains("Approve the request"));
    }
}
