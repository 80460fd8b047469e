//! Passive misconfiguration probe
//!
//! Looks at the connection without changing it: no switch, no registration,
//! no signing prompt. Every failure is folded into the returned
//! [`DiagnosticResult`].

use crate::client::contract_code_len;
use crate::reconciler::NetworkReconciler;
use docproof_core::effects::ConnectionEffects;
use docproof_core::{
    Address, ChainId, DiagnosticDetails, DiagnosticReason, DiagnosticResult, ProofConfig,
    ProofError, Result,
};
use tracing::{debug, info};

/// Startup/idle-time health check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsProbe {
    reconciler: NetworkReconciler,
    contract: Option<Address>,
}

impl DiagnosticsProbe {
    /// Probe for a target chain and optional contract address
    pub fn new(target_chain: ChainId, contract: Option<Address>) -> Self {
        Self {
            reconciler: NetworkReconciler::new(target_chain),
            contract,
        }
    }

    /// Probe from configuration
    ///
    /// Only the chain id is required; a missing contract address shows up as
    /// `NoContractCode` in the result instead of failing here.
    pub fn from_config(config: &ProofConfig) -> Result<Self> {
        Ok(Self::new(config.target_chain()?, config.contract()?))
    }

    /// Run the probe; never fails
    pub async fn run<C>(&self, connection: Option<&C>) -> DiagnosticResult
    where
        C: ConnectionEffects + ?Sized,
    {
        let target = self.reconciler.target();
        let mut details = DiagnosticDetails {
            configured_chain_id: Some(target),
            contract_address: self.contract,
            ..DiagnosticDetails::default()
        };

        let Some(connection) = connection else {
            return finish(DiagnosticReason::NoConnection, details);
        };

        // read-only: current_chain never asks for a switch
        let wallet_chain = match self.reconciler.current_chain(connection).await {
            Ok(chain) => Some(chain),
            Err(ProofError::Connectivity { message }) => {
                details.errors.push(message);
                return finish(DiagnosticReason::NoConnection, details);
            }
            Err(e) => {
                details.errors.push(format!("chain id: {e}"));
                None
            }
        };
        details.wallet_chain_id = wallet_chain;
        let chain_matches = wallet_chain == Some(target);

        if let Some(address) = self.contract {
            match contract_code_len(connection, &address).await {
                Ok(len) => {
                    details.code_length = len;
                    details.is_contract = len > 0;
                }
                Err(e) => details.errors.push(format!("code lookup: {e}")),
            }
        }

        let reason = DiagnosticReason::classify(true, chain_matches, details.is_contract);
        finish(reason, details)
    }
}

/// Classify the connection's readiness for ledger calls
pub async fn probe<C>(
    connection: Option<&C>,
    target: ChainId,
    contract: Option<Address>,
) -> DiagnosticResult
where
    C: ConnectionEffects + ?Sized,
{
    DiagnosticsProbe::new(target, contract).run(connection).await
}

fn finish(reason: DiagnosticReason, details: DiagnosticDetails) -> DiagnosticResult {
    let result = DiagnosticResult::new(reason, details);
    if result.ok {
        debug!(reason = ?result.reason, "ledger diagnostics passed");
    } else {
        info!(reason = ?result.reason, summary = %result.summary(), "ledger diagnostics");
    }
    result
}
