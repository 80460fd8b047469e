//! Anchor workflow
//!
//! `Idle → FetchingDigest → Reconciling → CheckingContract → Submitting →
//! AwaitingConfirmation → Anchored | Failed`
//!
//! One digest fetch and at most one ledger write per run. Anchoring the same
//! digest twice produces two writes; deduplication is the contract's concern.

use super::{Phase, Progress};
use crate::client::{DeployedContract, LedgerClient};
use crate::reconciler::NetworkReconciler;
use docproof_core::effects::{ConnectionEffects, DigestSourceEffects};
use docproof_core::{
    canonicalize, AnchorTransaction, CanonicalDigest, LedgerTarget, ProofError, Result, TxOutcome,
};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

/// Proof that a document's digest was anchored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchorReceipt {
    /// External identifier written alongside the digest
    pub document_id: String,
    /// Canonical digest that was anchored
    pub digest: CanonicalDigest,
    /// Confirmed transaction
    pub transaction: AnchorTransaction,
}

/// States of one anchor run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnchorState {
    /// Not started
    Idle,
    /// Asking the digest source
    FetchingDigest,
    /// Digest canonicalized, aligning the network
    Reconciling {
        /// Canonical digest being anchored
        digest: CanonicalDigest,
    },
    /// On the target chain, looking for contract code
    CheckingContract {
        /// Canonical digest being anchored
        digest: CanonicalDigest,
    },
    /// Contract present, broadcasting
    Submitting {
        /// Canonical digest being anchored
        digest: CanonicalDigest,
        /// Contract the write goes to
        contract: DeployedContract,
    },
    /// Broadcast, waiting for inclusion
    AwaitingConfirmation {
        /// Canonical digest being anchored
        digest: CanonicalDigest,
        /// Broadcast transaction
        transaction: AnchorTransaction,
    },
    /// Confirmed on the ledger
    Anchored(AnchorReceipt),
    /// Stopped in `phase`
    Failed {
        /// Phase that failed
        phase: Phase,
        /// Why it failed
        error: ProofError,
    },
}

impl AnchorState {
    /// Whether the run has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Anchored(_) | Self::Failed { .. })
    }

    /// Phase the state belongs to; `None` for idle and terminal states
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::FetchingDigest => Some(Phase::FetchingDigest),
            Self::Reconciling { .. } => Some(Phase::Reconciling),
            Self::CheckingContract { .. } => Some(Phase::CheckingContract),
            Self::Submitting { .. } => Some(Phase::Submitting),
            Self::AwaitingConfirmation { .. } => Some(Phase::AwaitingConfirmation),
            Self::Idle | Self::Anchored(_) | Self::Failed { .. } => None,
        }
    }

    /// Broadcast transaction, once there is one
    pub fn transaction(&self) -> Option<&AnchorTransaction> {
        match self {
            Self::AwaitingConfirmation { transaction, .. } => Some(transaction),
            Self::Anchored(receipt) => Some(&receipt.transaction),
            _ => None,
        }
    }

    /// Collapse a terminal state into a result
    pub fn into_result(self) -> Result<AnchorReceipt> {
        match self {
            Self::Anchored(receipt) => Ok(receipt),
            Self::Failed { error, .. } => Err(error),
            other => Err(ProofError::unknown_ledger(format!(
                "anchor workflow stopped before completion: {other:?}"
            ))),
        }
    }
}

/// Orchestrates one anchor write per run
#[derive(Debug)]
pub struct AnchorWorkflow {
    reconciler: NetworkReconciler,
    client: LedgerClient,
    progress: Progress<AnchorState>,
}

impl AnchorWorkflow {
    /// Workflow against a validated target
    pub fn new(target: LedgerTarget) -> Self {
        Self {
            reconciler: NetworkReconciler::new(target.chain_id),
            client: LedgerClient::new(target),
            progress: Progress::default(),
        }
    }

    /// Publish every entered state to `sender`
    pub fn with_progress(mut self, sender: watch::Sender<AnchorState>) -> Self {
        self.progress.attach(sender);
        self
    }

    /// Anchor `document_id`'s digest and wait for confirmation
    ///
    /// Always returns a terminal state. The confirmation wait has no internal
    /// bound; wrap this future in a timeout to cap it.
    pub async fn run<C, D>(&self, connection: &C, digests: &D, document_id: &str) -> AnchorState
    where
        C: ConnectionEffects + ?Sized,
        D: DigestSourceEffects + ?Sized,
    {
        let mut state = AnchorState::Idle;
        self.progress.publish(&state);
        while !state.is_terminal() {
            state = self.step(state, connection, digests, document_id).await;
            self.progress.publish(&state);
        }
        match &state {
            AnchorState::Anchored(receipt) => info!(
                document_id,
                digest = %receipt.digest,
                tx_hash = %receipt.transaction.handle.tx_hash,
                "document anchored"
            ),
            AnchorState::Failed { phase, error } => warn!(
                document_id,
                phase = %phase,
                code = error.code(),
                error = %error,
                "anchor workflow failed"
            ),
            _ => {}
        }
        state
    }

    async fn step<C, D>(
        &self,
        state: AnchorState,
        connection: &C,
        digests: &D,
        document_id: &str,
    ) -> AnchorState
    where
        C: ConnectionEffects + ?Sized,
        D: DigestSourceEffects + ?Sized,
    {
        match state {
            AnchorState::Idle => AnchorState::FetchingDigest,

            AnchorState::FetchingDigest => {
                let fetched = async { canonicalize(&digests.fetch_digest(document_id).await?) };
                match fetched.await {
                    Ok(digest) => AnchorState::Reconciling { digest },
                    Err(error) => failed(Phase::FetchingDigest, error),
                }
            }

            AnchorState::Reconciling { digest } => {
                match self.reconciler.reconcile(connection).await {
                    Ok(()) => AnchorState::CheckingContract { digest },
                    Err(error) => failed(Phase::Reconciling, error),
                }
            }

            AnchorState::CheckingContract { digest } => {
                match self.client.require_contract(connection).await {
                    Ok(contract) => AnchorState::Submitting { digest, contract },
                    Err(error) => failed(Phase::CheckingContract, error),
                }
            }

            AnchorState::Submitting { digest, contract } => match self
                .client
                .broadcast_anchor(connection, &contract, &digest, document_id)
                .await
            {
                Ok(handle) => AnchorState::AwaitingConfirmation {
                    digest,
                    transaction: AnchorTransaction::submitted(handle),
                },
                Err(error) => failed(Phase::Submitting, error),
            },

            AnchorState::AwaitingConfirmation {
                digest,
                mut transaction,
            } => match self
                .client
                .await_confirmation(connection, &transaction.handle)
                .await
            {
                Ok(outcome) => {
                    transaction.resolve(outcome);
                    match outcome {
                        TxOutcome::Confirmed { .. } => AnchorState::Anchored(AnchorReceipt {
                            document_id: document_id.to_string(),
                            digest,
                            transaction,
                        }),
                        TxOutcome::Failed { block_number } => failed(
                            Phase::AwaitingConfirmation,
                            ProofError::unknown_ledger(format!(
                                "anchor transaction {} reverted in block {block_number}",
                                transaction.handle.tx_hash
                            )),
                        ),
                    }
                }
                Err(error) => failed(Phase::AwaitingConfirmation, error),
            },

            terminal @ (AnchorState::Anchored(_) | AnchorState::Failed { .. }) => terminal,
        }
    }
}

fn failed(phase: Phase, error: ProofError) -> AnchorState {
    AnchorState::Failed { phase, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use docproof_core::TxStatus;
    use docproof_testkit::fixtures::{target, CONTRACT, SAMPLE_DOCUMENT, SAMPLE_SHA256, SEPOLIA};
    use docproof_testkit::{MockConnection, MockDigestSource, SendPolicy};

    fn source() -> MockDigestSource {
        MockDigestSource::new().with_digest(SAMPLE_DOCUMENT, SAMPLE_SHA256)
    }

    #[tokio::test]
    async fn test_happy_path_reaches_anchored() {
        let conn = MockConnection::on_chain(SEPOLIA).with_contract(SEPOLIA, CONTRACT);
        let digests = source();
        let state = AnchorWorkflow::new(target(SEPOLIA))
            .run(&conn, &digests, SAMPLE_DOCUMENT)
            .await;

        let receipt = state.into_result().unwrap();
        assert_eq!(receipt.document_id, SAMPLE_DOCUMENT);
        assert_eq!(receipt.digest, canonicalize(SAMPLE_SHA256).unwrap());
        assert_matches!(receipt.transaction.status, TxStatus::Confirmed { .. });
        assert_eq!(digests.fetches(), vec![SAMPLE_DOCUMENT.to_string()]);
        assert_eq!(conn.send_requests(), 1);
    }

    #[tokio::test]
    async fn test_bad_digest_fails_before_any_ledger_call() {
        let conn = MockConnection::on_chain(SEPOLIA).with_contract(SEPOLIA, CONTRACT);
        let digests = MockDigestSource::new().with_digest("doc", "not-hex");
        let state = AnchorWorkflow::new(target(SEPOLIA))
            .run(&conn, &digests, "doc")
            .await;

        assert_matches!(
            state,
            AnchorState::Failed {
                phase: Phase::FetchingDigest,
                error: ProofError::MalformedDigest { .. }
            }
        );
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn test_revert_is_failed_with_unknown_ledger() {
        let conn = MockConnection::on_chain(SEPOLIA)
            .with_contract(SEPOLIA, CONTRACT)
            .with_send_policy(SendPolicy::Revert);
        let state = AnchorWorkflow::new(target(SEPOLIA))
            .run(&conn, &source(), SAMPLE_DOCUMENT)
            .await;

        assert_matches!(
            state,
            AnchorState::Failed {
                phase: Phase::AwaitingConfirmation,
                error: ProofError::UnknownLedger { .. }
            }
        );
    }

    #[tokio::test]
    async fn test_progress_ends_on_terminal_state() {
        let conn = MockConnection::on_chain(SEPOLIA).with_contract(SEPOLIA, CONTRACT);
        let (tx, rx) = watch::channel(AnchorState::Idle);
        let state = AnchorWorkflow::new(target(SEPOLIA))
            .with_progress(tx)
            .run(&conn, &source(), SAMPLE_DOCUMENT)
            .await;

        assert_eq!(*rx.borrow(), state);
        assert!(rx.borrow().is_terminal());
    }

    #[test]
    fn test_phase_of_states() {
        assert_eq!(AnchorState::Idle.phase(), None);
        assert_eq!(
            AnchorState::FetchingDigest.phase(),
            Some(Phase::FetchingDigest)
        );
        assert!(AnchorState::Failed {
            phase: Phase::Submitting,
            error: ProofError::signing_rejected("no"),
        }
        .is_terminal());
    }
}
