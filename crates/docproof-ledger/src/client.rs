//! Ledger read/write protocol
//!
//! [`LedgerClient`] owns the validated target (chain and contract) and checks
//! before every ledger call that the connection is still on that chain, so no
//! call ever reaches a different network than configured. It never tries to
//! fix a mismatch itself; that is the reconciler's job.
//!
//! Contract presence is proven once per workflow through
//! [`LedgerClient::require_contract`], which yields a [`DeployedContract`]
//! consumed by the query and broadcast steps.

use crate::abi;
use docproof_core::effects::{CallRequest, ConnectionEffects, TransactionRequest};
use docproof_core::{
    Address, CanonicalDigest, ChainId, LedgerTarget, ProofError, Result, TransactionHandle,
    TxOutcome,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Contract code observed at the target address on the target chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeployedContract {
    address: Address,
    chain_id: ChainId,
    code_len: usize,
}

impl DeployedContract {
    /// Contract address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Chain the code was observed on
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Length of the observed bytecode
    pub fn code_len(&self) -> usize {
        self.code_len
    }
}

/// Low-level code-presence query
///
/// Returns `false` for addresses with empty code. Does not check the chain.
pub async fn has_contract_code<C>(connection: &C, address: &Address) -> Result<bool>
where
    C: ConnectionEffects + ?Sized,
{
    Ok(contract_code_len(connection, address).await? > 0)
}

/// Byte length of the code deployed at `address`; zero for plain accounts
pub async fn contract_code_len<C>(connection: &C, address: &Address) -> Result<usize>
where
    C: ConnectionEffects + ?Sized,
{
    Ok(connection.code_at(address).await?.len())
}

/// Client for the anchor contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerClient {
    target: LedgerTarget,
}

impl LedgerClient {
    /// Client bound to a validated target
    pub fn new(target: LedgerTarget) -> Self {
        Self { target }
    }

    /// Configured target
    pub fn target(&self) -> &LedgerTarget {
        &self.target
    }

    /// Code-presence query for an arbitrary address
    pub async fn has_contract_code<C>(&self, connection: &C, address: &Address) -> Result<bool>
    where
        C: ConnectionEffects + ?Sized,
    {
        has_contract_code(connection, address).await
    }

    /// Fail with `ChainMismatch` unless the connection is on the target chain
    async fn ensure_target_chain<C>(&self, connection: &C) -> Result<ChainId>
    where
        C: ConnectionEffects + ?Sized,
    {
        let actual = connection.chain_id().await?;
        if actual != self.target.chain_id {
            warn!(
                actual = %actual,
                target = %self.target.chain_id,
                "ledger call refused on wrong chain"
            );
            return Err(ProofError::chain_mismatch(self.target.chain_id, actual));
        }
        Ok(actual)
    }

    /// Prove the contract is deployed on the target chain
    ///
    /// # Errors
    /// `ChainMismatch` when off target, `ContractNotFound` when the address
    /// has no code, `Rpc`/`Connectivity` on transport failure.
    pub async fn require_contract<C>(&self, connection: &C) -> Result<DeployedContract>
    where
        C: ConnectionEffects + ?Sized,
    {
        let chain_id = self.ensure_target_chain(connection).await?;
        let code_len = contract_code_len(connection, &self.target.contract).await?;
        if code_len == 0 {
            warn!(
                address = %self.target.contract,
                chain_id = %chain_id,
                "no contract code at configured address"
            );
            return Err(ProofError::contract_not_found(
                self.target.contract,
                chain_id,
            ));
        }
        debug!(
            address = %self.target.contract,
            code_len,
            "contract code present"
        );
        Ok(DeployedContract {
            address: self.target.contract,
            chain_id,
            code_len,
        })
    }

    /// Read-only existence query
    ///
    /// Requires the connection to already be reconciled; never returns a
    /// boolean from the wrong chain.
    pub async fn read_anchored<C>(&self, connection: &C, digest: &CanonicalDigest) -> Result<bool>
    where
        C: ConnectionEffects + ?Sized,
    {
        let contract = self.require_contract(connection).await?;
        self.query_anchored(connection, &contract, digest).await
    }

    /// Existence query against an already-proven contract
    pub async fn query_anchored<C>(
        &self,
        connection: &C,
        contract: &DeployedContract,
        digest: &CanonicalDigest,
    ) -> Result<bool>
    where
        C: ConnectionEffects + ?Sized,
    {
        self.ensure_target_chain(connection).await?;
        let request = CallRequest {
            to: contract.address,
            data: abi::encode_is_anchored(digest),
        };
        let output = connection.call(&request).await?;
        let anchored = abi::decode_bool(&output)?;
        debug!(digest = %digest, anchored, "isAnchored query");
        Ok(anchored)
    }

    /// Encode and broadcast `anchor(digest, external_id)`
    ///
    /// Checks the chain and contract code before any signing prompt. Returns
    /// as soon as the transaction is broadcast.
    pub async fn submit_anchor<C>(
        &self,
        connection: &C,
        digest: &CanonicalDigest,
        external_id: &str,
    ) -> Result<TransactionHandle>
    where
        C: ConnectionEffects + ?Sized,
    {
        let contract = self.require_contract(connection).await?;
        self.broadcast_anchor(connection, &contract, digest, external_id)
            .await
    }

    /// Broadcast against an already-proven contract
    pub async fn broadcast_anchor<C>(
        &self,
        connection: &C,
        contract: &DeployedContract,
        digest: &CanonicalDigest,
        external_id: &str,
    ) -> Result<TransactionHandle>
    where
        C: ConnectionEffects + ?Sized,
    {
        let chain_id = self.ensure_target_chain(connection).await?;
        let from = connection
            .request_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProofError::connectivity("connection exposed no accounts"))?;

        let request = TransactionRequest {
            from,
            to: contract.address,
            data: abi::encode_anchor(digest, external_id),
        };
        let tx_hash = connection.send_transaction(&request).await?;
        info!(
            tx_hash = %tx_hash,
            digest = %digest,
            external_id,
            chain_id = %chain_id,
            "anchor transaction broadcast"
        );
        Ok(TransactionHandle {
            tx_hash,
            chain_id,
            from,
        })
    }

    /// Suspend until the network reports the transaction's outcome
    ///
    /// There is no internal timeout; wrap the future to bound the wait.
    /// Dropping it leaves the transaction pending on the network.
    pub async fn await_confirmation<C>(
        &self,
        connection: &C,
        handle: &TransactionHandle,
    ) -> Result<TxOutcome>
    where
        C: ConnectionEffects + ?Sized,
    {
        let receipt = connection.wait_for_receipt(&handle.tx_hash).await?;
        if receipt.tx_hash != handle.tx_hash {
            return Err(ProofError::unknown_ledger(format!(
                "receipt for {} returned while waiting on {}",
                receipt.tx_hash, handle.tx_hash
            )));
        }
        let outcome = if receipt.success {
            TxOutcome::Confirmed {
                block_number: receipt.block_number,
            }
        } else {
            TxOutcome::Failed {
                block_number: receipt.block_number,
            }
        };
        info!(tx_hash = %handle.tx_hash, ?outcome, "anchor transaction resolved");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use docproof_core::canonicalize;
    use docproof_testkit::fixtures::{target, CONTRACT, MAINNET, SAMPLE_SHA256, SEPOLIA};
    use docproof_testkit::{ConnectionCall, MockConnection, SendPolicy};

    fn digest() -> CanonicalDigest {
        canonicalize(SAMPLE_SHA256).unwrap()
    }

    #[tokio::test]
    async fn test_read_without_reconcile_is_chain_mismatch() {
        let conn = MockConnection::on_chain(MAINNET).with_contract(SEPOLIA, CONTRACT);
        let client = LedgerClient::new(target(SEPOLIA));

        let err = client.read_anchored(&conn, &digest()).await.unwrap_err();
        assert_matches!(err, ProofError::ChainMismatch { .. });
        assert!(conn
            .calls()
            .iter()
            .all(|c| !matches!(c, ConnectionCall::Call(_) | ConnectionCall::CodeAt(_))));
    }

    #[tokio::test]
    async fn test_read_reports_anchor_state() {
        let conn = MockConnection::on_chain(SEPOLIA).with_contract(SEPOLIA, CONTRACT);
        let client = LedgerClient::new(target(SEPOLIA));

        assert!(!client.read_anchored(&conn, &digest()).await.unwrap());
        conn.preload_anchor(SEPOLIA, *digest().as_bytes());
        assert!(client.read_anchored(&conn, &digest()).await.unwrap());
    }

    #[tokio::test]
    async fn test_submit_without_code_fails_before_signing() {
        let conn = MockConnection::on_chain(SEPOLIA);
        let client = LedgerClient::new(target(SEPOLIA));

        let err = client
            .submit_anchor(&conn, &digest(), "doc-1")
            .await
            .unwrap_err();
        assert_matches!(
            err,
            ProofError::ContractNotFound { address, chain_id }
                if address == CONTRACT && chain_id == SEPOLIA
        );
        assert_eq!(conn.send_requests(), 0);
        assert_eq!(
            conn.count_calls(|c| matches!(c, ConnectionCall::RequestAccounts)),
            0
        );
    }

    #[tokio::test]
    async fn test_submit_then_confirm() {
        let conn = MockConnection::on_chain(SEPOLIA).with_contract(SEPOLIA, CONTRACT);
        let client = LedgerClient::new(target(SEPOLIA));

        let handle = client
            .submit_anchor(&conn, &digest(), "doc-1")
            .await
            .unwrap();
        assert_eq!(handle.chain_id, SEPOLIA);
        assert_eq!(handle.from, docproof_testkit::DEFAULT_ACCOUNT);

        let outcome = client.await_confirmation(&conn, &handle).await.unwrap();
        assert_matches!(outcome, TxOutcome::Confirmed { .. });
        assert!(client.read_anchored(&conn, &digest()).await.unwrap());
    }

    #[tokio::test]
    async fn test_submit_sends_encoded_calldata() {
        let conn = MockConnection::on_chain(SEPOLIA).with_contract(SEPOLIA, CONTRACT);
        let client = LedgerClient::new(target(SEPOLIA));
        client
            .submit_anchor(&conn, &digest(), "doc-1")
            .await
            .unwrap();

        let sent = conn
            .calls()
            .into_iter()
            .find_map(|c| match c {
                ConnectionCall::SendTransaction(tx) => Some(tx),
                _ => None,
            })
            .unwrap();
        assert_eq!(sent.to, CONTRACT);
        assert_eq!(sent.data, abi::encode_anchor(&digest(), "doc-1"));
    }

    #[tokio::test]
    async fn test_submit_twice_makes_two_ledger_calls() {
        let conn = MockConnection::on_chain(SEPOLIA).with_contract(SEPOLIA, CONTRACT);
        let client = LedgerClient::new(target(SEPOLIA));

        let first = client.submit_anchor(&conn, &digest(), "doc-1").await.unwrap();
        let second = client.submit_anchor(&conn, &digest(), "doc-1").await.unwrap();
        assert_ne!(first.tx_hash, second.tx_hash);
        assert_eq!(conn.send_requests(), 2);
    }

    #[tokio::test]
    async fn test_signing_failures_are_typed() {
        let client = LedgerClient::new(target(SEPOLIA));

        let rejecting = MockConnection::on_chain(SEPOLIA)
            .with_contract(SEPOLIA, CONTRACT)
            .with_send_policy(SendPolicy::RejectSigning);
        assert_matches!(
            client.submit_anchor(&rejecting, &digest(), "d").await,
            Err(ProofError::SigningRejected { .. })
        );

        let broke = MockConnection::on_chain(SEPOLIA)
            .with_contract(SEPOLIA, CONTRACT)
            .with_send_policy(SendPolicy::InsufficientFunds);
        assert_matches!(
            client.submit_anchor(&broke, &digest(), "d").await,
            Err(ProofError::InsufficientFunds { .. })
        );
    }

    #[tokio::test]
    async fn test_reverted_transaction_is_failed_outcome() {
        let conn = MockConnection::on_chain(SEPOLIA)
            .with_contract(SEPOLIA, CONTRACT)
            .with_send_policy(SendPolicy::Revert);
        let client = LedgerClient::new(target(SEPOLIA));

        let handle = client.submit_anchor(&conn, &digest(), "d").await.unwrap();
        assert_matches!(
            client.await_confirmation(&conn, &handle).await,
            Ok(TxOutcome::Failed { .. })
        );
        assert!(!client.read_anchored(&conn, &digest()).await.unwrap());
    }

    #[tokio::test]
    async fn test_no_accounts_is_connectivity_error() {
        let conn = MockConnection::on_chain(SEPOLIA)
            .with_contract(SEPOLIA, CONTRACT)
            .with_accounts(vec![]);
        let client = LedgerClient::new(target(SEPOLIA));
        assert_matches!(
            client.submit_anchor(&conn, &digest(), "d").await,
            Err(ProofError::Connectivity { .. })
        );
        assert_eq!(conn.send_requests(), 0);
    }

    #[tokio::test]
    async fn test_has_contract_code_ignores_chain() {
        let conn = MockConnection::on_chain(MAINNET).with_contract(MAINNET, CONTRACT);
        let client = LedgerClient::new(target(SEPOLIA));
        assert!(client.has_contract_code(&conn, &CONTRACT).await.unwrap());
        assert!(!has_contract_code(&conn, &Address::from_bytes([9; 20]))
            .await
            .unwrap());
    }
}
