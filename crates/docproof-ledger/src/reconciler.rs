//! Network reconciliation
//!
//! Before any ledger call the connection must be pointed at the configured
//! chain. The reconciler reads the current chain, asks for a switch when it
//! differs, and registers the target from the known-network table when the
//! connection has never heard of it. It retries the switch exactly once after
//! registering; anything else ends in [`ProofError::ChainMismatch`].

use docproof_core::effects::{ConnectionEffects, ConnectionError};
use docproof_core::{networks, ChainId, ProofError, Result};
use tracing::{debug, info, warn};

/// Aligns a connection with the target chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkReconciler {
    target: ChainId,
}

impl NetworkReconciler {
    /// Reconciler for `target`
    pub fn new(target: ChainId) -> Self {
        Self { target }
    }

    /// Configured target chain
    pub fn target(&self) -> ChainId {
        self.target
    }

    /// Read the connection's chain without trying to change it
    pub async fn current_chain<C>(&self, connection: &C) -> Result<ChainId>
    where
        C: ConnectionEffects + ?Sized,
    {
        Ok(connection.chain_id().await?)
    }

    /// Ensure the connection is on the target chain, switching if needed
    ///
    /// Performs no mutation when the chains already match.
    pub async fn reconcile<C>(&self, connection: &C) -> Result<()>
    where
        C: ConnectionEffects + ?Sized,
    {
        let actual = self.current_chain(connection).await?;
        if actual == self.target {
            debug!(chain_id = %actual, "connection already on target chain");
            return Ok(());
        }

        info!(
            actual = %actual,
            target = %self.target,
            "requesting network switch"
        );
        match connection.switch_chain(self.target).await {
            Ok(()) => {
                info!(chain_id = %self.target, "network switched");
                Ok(())
            }
            Err(ConnectionError::UnrecognizedChain { .. }) => {
                self.register_and_switch(connection, actual).await
            }
            Err(ConnectionError::Unavailable { reason }) => Err(ProofError::connectivity(reason)),
            Err(e) => {
                warn!(error = %e, target = %self.target, "network switch failed");
                Err(ProofError::chain_mismatch(self.target, actual))
            }
        }
    }

    async fn register_and_switch<C>(&self, connection: &C, actual: ChainId) -> Result<()>
    where
        C: ConnectionEffects + ?Sized,
    {
        let Some(network) = networks::lookup(self.target) else {
            warn!(
                target = %self.target,
                "target chain unknown to connection and absent from network table"
            );
            return Err(ProofError::chain_mismatch(self.target, actual));
        };

        info!(chain_id = %self.target, name = network.name, "registering network");
        if let Err(e) = connection.add_chain(network).await {
            warn!(error = %e, target = %self.target, "network registration failed");
            return Err(ProofError::chain_mismatch(self.target, actual));
        }

        connection.switch_chain(self.target).await.map_err(|e| {
            warn!(error = %e, target = %self.target, "switch after registration failed");
            ProofError::chain_mismatch(self.target, actual)
        })?;
        info!(chain_id = %self.target, "network registered and switched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use docproof_testkit::fixtures::{LOCAL_DEV, MAINNET, SEPOLIA, UNLISTED};
    use docproof_testkit::{ConnectionCall, MockConnection, SwitchPolicy};

    #[tokio::test]
    async fn test_matching_chain_makes_no_switch_or_add() {
        let conn = MockConnection::on_chain(SEPOLIA);
        NetworkReconciler::new(SEPOLIA)
            .reconcile(&conn)
            .await
            .unwrap();

        assert_eq!(conn.calls(), vec![ConnectionCall::ChainId]);
    }

    #[tokio::test]
    async fn test_mismatch_issues_exactly_one_switch() {
        let conn = MockConnection::on_chain(MAINNET);
        NetworkReconciler::new(SEPOLIA)
            .reconcile(&conn)
            .await
            .unwrap();

        assert_eq!(conn.switch_requests(), 1);
        assert_eq!(conn.add_requests(), 0);
        assert_eq!(conn.current_chain(), SEPOLIA);
    }

    #[tokio::test]
    async fn test_declined_switch_is_chain_mismatch() {
        let conn = MockConnection::on_chain(MAINNET).with_switch_policy(SwitchPolicy::Reject);
        let err = NetworkReconciler::new(SEPOLIA)
            .reconcile(&conn)
            .await
            .unwrap_err();

        assert_matches!(
            err,
            ProofError::ChainMismatch { expected, actual, ref hint }
                if expected == SEPOLIA && actual == MAINNET && hint.contains("Sepolia")
        );
        assert_eq!(conn.switch_requests(), 1);
        assert_eq!(conn.add_requests(), 0);
    }

    #[tokio::test]
    async fn test_unknown_chain_is_registered_then_switched() {
        let conn = MockConnection::on_chain(MAINNET).with_known_chains([MAINNET]);
        NetworkReconciler::new(LOCAL_DEV)
            .reconcile(&conn)
            .await
            .unwrap();

        assert_eq!(
            conn.calls(),
            vec![
                ConnectionCall::ChainId,
                ConnectionCall::SwitchChain(LOCAL_DEV),
                ConnectionCall::AddChain(LOCAL_DEV),
                ConnectionCall::SwitchChain(LOCAL_DEV),
            ]
        );
        assert_eq!(conn.current_chain(), LOCAL_DEV);
    }

    #[tokio::test]
    async fn test_single_add_then_switch_before_failing() {
        let conn =
            MockConnection::on_chain(MAINNET).with_switch_policy(SwitchPolicy::AlwaysUnrecognized);
        let err = NetworkReconciler::new(SEPOLIA)
            .reconcile(&conn)
            .await
            .unwrap_err();

        assert_matches!(err, ProofError::ChainMismatch { .. });
        assert_eq!(conn.switch_requests(), 2);
        assert_eq!(conn.add_requests(), 1);
    }

    #[tokio::test]
    async fn test_rejected_registration_skips_second_switch() {
        let conn = MockConnection::on_chain(MAINNET)
            .with_known_chains([MAINNET])
            .rejecting_add_chain();
        let err = NetworkReconciler::new(SEPOLIA)
            .reconcile(&conn)
            .await
            .unwrap_err();

        assert_matches!(err, ProofError::ChainMismatch { .. });
        assert_eq!(conn.switch_requests(), 1);
        assert_eq!(conn.add_requests(), 1);
    }

    #[tokio::test]
    async fn test_unlisted_target_is_not_registered() {
        let conn = MockConnection::on_chain(MAINNET);
        let err = NetworkReconciler::new(UNLISTED)
            .reconcile(&conn)
            .await
            .unwrap_err();

        assert_matches!(
            err,
            ProofError::ChainMismatch { ref hint, .. } if hint.contains("chain 424242")
        );
        assert_eq!(conn.add_requests(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_connection_is_connectivity_error() {
        let conn = MockConnection::on_chain(MAINNET).unavailable();
        let err = NetworkReconciler::new(SEPOLIA)
            .reconcile(&conn)
            .await
            .unwrap_err();
        assert_matches!(err, ProofError::Connectivity { .. });
    }
}
