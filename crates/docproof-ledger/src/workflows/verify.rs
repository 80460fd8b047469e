//! Verify workflow
//!
//! `Idle → FetchingDigest → Reconciling → CheckingContract → Querying →
//! Verified | Failed`
//!
//! Read-only. Concurrent runs share nothing but the connection.

use super::{Phase, Progress};
use crate::client::{DeployedContract, LedgerClient};
use crate::reconciler::NetworkReconciler;
use docproof_core::effects::{ConnectionEffects, DigestSourceEffects};
use docproof_core::{canonicalize, CanonicalDigest, LedgerTarget, ProofError, Result};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

/// States of one verify run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VerifyState {
    /// Not started
    Idle,
    /// Asking the digest source
    FetchingDigest,
    /// Aligning the network
    Reconciling {
        /// Canonical digest being checked
        digest: CanonicalDigest,
    },
    /// Looking for contract code
    CheckingContract {
        /// Canonical digest being checked
        digest: CanonicalDigest,
    },
    /// Running `isAnchored`
    Querying {
        /// Canonical digest being checked
        digest: CanonicalDigest,
        /// Contract being queried
        contract: DeployedContract,
    },
    /// Query answered
    Verified {
        /// Canonical digest that was checked
        digest: CanonicalDigest,
        /// Whether the ledger holds it
        anchored: bool,
    },
    /// Stopped in `phase`
    Failed {
        /// Phase that failed
        phase: Phase,
        /// Why it failed
        error: ProofError,
    },
}

impl VerifyState {
    /// Whether the run has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified { .. } | Self::Failed { .. })
    }

    /// Collapse a terminal state into `(digest, anchored)`
    pub fn into_result(self) -> Result<(CanonicalDigest, bool)> {
        match self {
            Self::Verified { digest, anchored } => Ok((digest, anchored)),
            Self::Failed { error, .. } => Err(error),
            other => Err(ProofError::unknown_ledger(format!(
                "verify workflow stopped before completion: {other:?}"
            ))),
        }
    }
}

/// Orchestrates one existence query per run
#[derive(Debug)]
pub struct VerifyWorkflow {
    reconciler: NetworkReconciler,
    client: LedgerClient,
    progress: Progress<VerifyState>,
}

impl VerifyWorkflow {
    /// Workflow against a validated target
    pub fn new(target: LedgerTarget) -> Self {
        Self {
            reconciler: NetworkReconciler::new(target.chain_id),
            client: LedgerClient::new(target),
            progress: Progress::default(),
        }
    }

    /// Publish every entered state to `sender`
    pub fn with_progress(mut self, sender: watch::Sender<VerifyState>) -> Self {
        self.progress.attach(sender);
        self
    }

    /// Check whether `document_id`'s digest is anchored
    pub async fn run<C, D>(&self, connection: &C, digests: &D, document_id: &str) -> VerifyState
    where
        C: ConnectionEffects + ?Sized,
        D: DigestSourceEffects + ?Sized,
    {
        let mut state = VerifyState::Idle;
        self.progress.publish(&state);
        while !state.is_terminal() {
            state = self.step(state, connection, digests, document_id).await;
            self.progress.publish(&state);
        }
        match &state {
            VerifyState::Verified { digest, anchored } => {
                info!(document_id, digest = %digest, anchored, "document verified")
            }
            VerifyState::Failed { phase, error } => warn!(
                document_id,
                phase = %phase,
                code = error.code(),
                error = %error,
                "verify workflow failed"
            ),
            _ => {}
        }
        state
    }

    async fn step<C, D>(
        &self,
        state: VerifyState,
        connection: &C,
        digests: &D,
        document_id: &str,
    ) -> VerifyState
    where
        C: ConnectionEffects + ?Sized,
        D: DigestSourceEffects + ?Sized,
    {
        match state {
            VerifyState::Idle => VerifyState::FetchingDigest,

            VerifyState::FetchingDigest => {
                let fetched = async { canonicalize(&digests.fetch_digest(document_id).await?) };
                match fetched.await {
                    Ok(digest) => VerifyState::Reconciling { digest },
                    Err(error) => failed(Phase::FetchingDigest, error),
                }
            }

            VerifyState::Reconciling { digest } => {
                match self.reconciler.reconcile(connection).await {
                    Ok(()) => VerifyState::CheckingContract { digest },
                    Err(error) => failed(Phase::Reconciling, error),
                }
            }

            VerifyState::CheckingContract { digest } => {
                match self.client.require_contract(connection).await {
                    Ok(contract) => VerifyState::Querying { digest, contract },
                    Err(error) => failed(Phase::CheckingContract, error),
                }
            }

            VerifyState::Querying { digest, contract } => match self
                .client
                .query_anchored(connection, &contract, &digest)
                .await
            {
                Ok(anchored) => VerifyState::Verified { digest, anchored },
                Err(error) => failed(Phase::Querying, error),
            },

            terminal @ (VerifyState::Verified { .. } | VerifyState::Failed { .. }) => terminal,
        }
    }
}

fn failed(phase: Phase, error: ProofError) -> VerifyState {
    VerifyState::Failed { phase, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use docproof_testkit::fixtures::{
        target, CONTRACT, MAINNET, SAMPLE_DOCUMENT, SAMPLE_SHA256, SEPOLIA,
    };
    use docproof_testkit::{MockConnection, MockDigestSource};

    #[tokio::test]
    async fn test_reports_not_anchored_then_anchored() {
        let conn = MockConnection::on_chain(SEPOLIA).with_contract(SEPOLIA, CONTRACT);
        let digests = MockDigestSource::new().with_digest(SAMPLE_DOCUMENT, SAMPLE_SHA256);
        let workflow = VerifyWorkflow::new(target(SEPOLIA));

        let (digest, anchored) = workflow
            .run(&conn, &digests, SAMPLE_DOCUMENT)
            .await
            .into_result()
            .unwrap();
        assert!(!anchored);

        conn.preload_anchor(SEPOLIA, *digest.as_bytes());
        assert_matches!(
            workflow.run(&conn, &digests, SAMPLE_DOCUMENT).await,
            VerifyState::Verified { anchored: true, .. }
        );
        assert_eq!(conn.send_requests(), 0);
    }

    #[tokio::test]
    async fn test_reconciles_before_querying() {
        let conn = MockConnection::on_chain(MAINNET).with_contract(SEPOLIA, CONTRACT);
        let digests = MockDigestSource::new().with_digest(SAMPLE_DOCUMENT, SAMPLE_SHA256);
        let state = VerifyWorkflow::new(target(SEPOLIA))
            .run(&conn, &digests, SAMPLE_DOCUMENT)
            .await;

        assert_matches!(state, VerifyState::Verified { anchored: false, .. });
        assert_eq!(conn.current_chain(), SEPOLIA);
        assert_eq!(conn.switch_requests(), 1);
    }

    #[tokio::test]
    async fn test_unknown_document_fails_in_fetch() {
        let conn = MockConnection::on_chain(SEPOLIA);
        let state = VerifyWorkflow::new(target(SEPOLIA))
            .run(&conn, &MockDigestSource::new(), "missing")
            .await;

        assert_matches!(
            state,
            VerifyState::Failed {
                phase: Phase::FetchingDigest,
                error: ProofError::DigestUnavailable { .. }
            }
        );
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_contract_fails_in_check() {
        let conn = MockConnection::on_chain(SEPOLIA);
        let digests = MockDigestSource::new().with_digest(SAMPLE_DOCUMENT, SAMPLE_SHA256);
        let state = VerifyWorkflow::new(target(SEPOLIA))
            .run(&conn, &digests, SAMPLE_DOCUMENT)
            .await;

        assert_matches!(
            state,
            VerifyState::Failed {
                phase: Phase::CheckingContract,
                error: ProofError::ContractNotFound { .. }
            }
        );
    }
}
