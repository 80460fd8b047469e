//! Mock connection for deterministic ledger tests
//!
//! `MockConnection` implements [`ConnectionEffects`] entirely in memory and
//! records every request so tests can assert on exact call sequences (how many
//! switch requests, whether a signing prompt happened, and so on).
//!
//! It also emulates the anchor contract closely enough for workflow tests:
//! the first calldata word after the 4-byte selector is the digest for both
//! contract functions, so `send_transaction` stores that word and `call`
//! answers whether it has been stored. Selectors are not interpreted.

use async_trait::async_trait;
use docproof_core::effects::{
    CallRequest, ConnectionEffects, ConnectionError, ConnectionEvent, ConnectionEventBus,
    TransactionRequest, TxReceipt,
};
use docproof_core::{Address, ChainId, KnownNetwork, TxHash};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Stand-in bytecode installed at deployed contract addresses
pub const MOCK_CONTRACT_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52];

/// Default sending account
pub const DEFAULT_ACCOUNT: Address = Address::from_bytes([0xa1; 20]);

/// One request observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionCall {
    /// `request_accounts`
    RequestAccounts,
    /// `chain_id`
    ChainId,
    /// `switch_chain`
    SwitchChain(ChainId),
    /// `add_chain`
    AddChain(ChainId),
    /// `code_at`
    CodeAt(Address),
    /// `call`
    Call(CallRequest),
    /// `send_transaction`
    SendTransaction(TransactionRequest),
    /// `wait_for_receipt`
    WaitForReceipt(TxHash),
}

/// How the mock answers `switch_chain`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPolicy {
    /// Switch when the chain is known, report unrecognized otherwise
    Follow,
    /// The user declines every switch
    Reject,
    /// Report every chain as unrecognized, even after `add_chain`
    AlwaysUnrecognized,
}

/// How the mock answers `send_transaction`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPolicy {
    /// Broadcast and later confirm
    Confirm,
    /// Broadcast and later report a revert
    Revert,
    /// The user declines to sign
    RejectSigning,
    /// The node reports insufficient funds
    InsufficientFunds,
    /// Broadcast, but the receipt never arrives
    NeverConfirm,
}

#[derive(Debug)]
struct MockState {
    available: bool,
    chain_id: ChainId,
    known_chains: BTreeSet<ChainId>,
    accounts: Vec<Address>,
    code: HashMap<(ChainId, Address), Vec<u8>>,
    anchored: HashSet<(ChainId, [u8; 32])>,
    switch_policy: SwitchPolicy,
    add_rejected: bool,
    send_policy: SendPolicy,
    pending: HashMap<TxHash, PendingTx>,
    next_block: u64,
    tx_counter: u64,
    calls: Vec<ConnectionCall>,
}

#[derive(Debug, Clone, Copy)]
struct PendingTx {
    chain_id: ChainId,
    word: Option<[u8; 32]>,
    outcome: SendPolicy,
}

/// In-memory connection double
#[derive(Debug, Clone)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
    events: ConnectionEventBus,
}

impl MockConnection {
    /// Connection on `chain_id` that also knows mainnet and Sepolia
    pub fn on_chain(chain_id: ChainId) -> Self {
        let known_chains = [chain_id, ChainId::new(1), ChainId::new(11_155_111)]
            .into_iter()
            .collect();
        Self {
            state: Arc::new(Mutex::new(MockState {
                available: true,
                chain_id,
                known_chains,
                accounts: vec![DEFAULT_ACCOUNT],
                code: HashMap::new(),
                anchored: HashSet::new(),
                switch_policy: SwitchPolicy::Follow,
                add_rejected: false,
                send_policy: SendPolicy::Confirm,
                pending: HashMap::new(),
                next_block: 1,
                tx_counter: 0,
                calls: Vec::new(),
            })),
            events: ConnectionEventBus::default(),
        }
    }

    /// Deploy stand-in code at `address` on `chain_id`
    pub fn with_contract(self, chain_id: ChainId, address: Address) -> Self {
        self.state
            .lock()
            .code
            .insert((chain_id, address), MOCK_CONTRACT_CODE.to_vec());
        self
    }

    /// Only the listed chains are known to the connection
    pub fn with_known_chains(self, chains: impl IntoIterator<Item = ChainId>) -> Self {
        {
            let mut state = self.state.lock();
            state.known_chains = chains.into_iter().collect();
            let current = state.chain_id;
            state.known_chains.insert(current);
        }
        self
    }

    /// Replace the exposed accounts
    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        self.state.lock().accounts = accounts;
        self
    }

    /// Set the switch policy
    pub fn with_switch_policy(self, policy: SwitchPolicy) -> Self {
        self.state.lock().switch_policy = policy;
        self
    }

    /// Make `add_chain` fail with a user rejection
    pub fn rejecting_add_chain(self) -> Self {
        self.state.lock().add_rejected = true;
        self
    }

    /// Set the send policy
    pub fn with_send_policy(self, policy: SendPolicy) -> Self {
        self.state.lock().send_policy = policy;
        self
    }

    /// Every call fails with `Unavailable`
    pub fn unavailable(self) -> Self {
        self.state.lock().available = false;
        self
    }

    /// Mark a digest word as already anchored on `chain_id`
    pub fn preload_anchor(&self, chain_id: ChainId, word: [u8; 32]) {
        self.state.lock().anchored.insert((chain_id, word));
    }

    /// Simulate the user changing network in their wallet
    pub fn user_switches_to(&self, chain_id: ChainId) {
        {
            let mut state = self.state.lock();
            state.chain_id = chain_id;
            state.known_chains.insert(chain_id);
        }
        self.events.publish(ConnectionEvent::ChainChanged(chain_id));
    }

    /// Current chain without recording a call
    pub fn current_chain(&self) -> ChainId {
        self.state.lock().chain_id
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<ConnectionCall> {
        self.state.lock().calls.clone()
    }

    /// Count of recorded calls matching a predicate
    pub fn count_calls(&self, predicate: impl Fn(&ConnectionCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Number of `switch_chain` requests
    pub fn switch_requests(&self) -> usize {
        self.count_calls(|c| matches!(c, ConnectionCall::SwitchChain(_)))
    }

    /// Number of `add_chain` requests
    pub fn add_requests(&self) -> usize {
        self.count_calls(|c| matches!(c, ConnectionCall::AddChain(_)))
    }

    /// Number of `send_transaction` requests (signing prompts)
    pub fn send_requests(&self) -> usize {
        self.count_calls(|c| matches!(c, ConnectionCall::SendTransaction(_)))
    }

    fn record(
        &self,
        call: ConnectionCall,
    ) -> Result<parking_lot::MutexGuard<'_, MockState>, ConnectionError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if !state.available {
            return Err(ConnectionError::Unavailable {
                reason: "mock connection is offline".to_string(),
            });
        }
        Ok(state)
    }
}

fn first_word(data: &[u8]) -> Option<[u8; 32]> {
    data.get(4..36).and_then(|w| w.try_into().ok())
}

fn bool_word(value: bool) -> Vec<u8> {
    let mut word = vec![0u8; 32];
    word[31] = u8::from(value);
    word
}

#[async_trait]
impl ConnectionEffects for MockConnection {
    async fn request_accounts(&self) -> Result<Vec<Address>, ConnectionError> {
        let state = self.record(ConnectionCall::RequestAccounts)?;
        Ok(state.accounts.clone())
    }

    async fn chain_id(&self) -> Result<ChainId, ConnectionError> {
        let state = self.record(ConnectionCall::ChainId)?;
        Ok(state.chain_id)
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ConnectionError> {
        {
            let mut state = self.record(ConnectionCall::SwitchChain(chain_id))?;
            match state.switch_policy {
                SwitchPolicy::Reject => {
                    return Err(ConnectionError::UserRejected {
                        reason: "User rejected the request.".to_string(),
                    })
                }
                SwitchPolicy::AlwaysUnrecognized => {
                    return Err(ConnectionError::UnrecognizedChain { chain_id })
                }
                SwitchPolicy::Follow if !state.known_chains.contains(&chain_id) => {
                    return Err(ConnectionError::UnrecognizedChain { chain_id })
                }
                SwitchPolicy::Follow => state.chain_id = chain_id,
            }
        }
        self.events.publish(ConnectionEvent::ChainChanged(chain_id));
        Ok(())
    }

    async fn add_chain(&self, network: &KnownNetwork) -> Result<(), ConnectionError> {
        let mut state = self.record(ConnectionCall::AddChain(network.chain_id))?;
        if state.add_rejected {
            return Err(ConnectionError::UserRejected {
                reason: "User rejected adding the network.".to_string(),
            });
        }
        state.known_chains.insert(network.chain_id);
        Ok(())
    }

    async fn code_at(&self, address: &Address) -> Result<Vec<u8>, ConnectionError> {
        let state = self.record(ConnectionCall::CodeAt(*address))?;
        Ok(state
            .code
            .get(&(state.chain_id, *address))
            .cloned()
            .unwrap_or_default())
    }

    async fn call(&self, request: &CallRequest) -> Result<Vec<u8>, ConnectionError> {
        let state = self.record(ConnectionCall::Call(request.clone()))?;
        if !state.code.contains_key(&(state.chain_id, request.to)) {
            // calls to an address without code succeed with empty return data
            return Ok(Vec::new());
        }
        let word = first_word(&request.data).ok_or_else(|| ConnectionError::Rpc {
            code: -32000,
            message: "execution reverted".to_string(),
        })?;
        Ok(bool_word(state.anchored.contains(&(state.chain_id, word))))
    }

    async fn send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TxHash, ConnectionError> {
        let mut state = self.record(ConnectionCall::SendTransaction(request.clone()))?;
        match state.send_policy {
            SendPolicy::RejectSigning => {
                return Err(ConnectionError::UserRejected {
                    reason: "User denied transaction signature.".to_string(),
                })
            }
            SendPolicy::InsufficientFunds => {
                return Err(ConnectionError::InsufficientFunds {
                    reason: "insufficient funds for gas * price + value".to_string(),
                })
            }
            SendPolicy::Confirm | SendPolicy::Revert | SendPolicy::NeverConfirm => {}
        }

        state.tx_counter += 1;
        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&state.tx_counter.to_be_bytes());
        let tx_hash = TxHash::from_bytes(hash);
        let pending = PendingTx {
            chain_id: state.chain_id,
            word: first_word(&request.data),
            outcome: state.send_policy,
        };
        state.pending.insert(tx_hash, pending);
        tracing::debug!(%tx_hash, "mock transaction broadcast");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<TxReceipt, ConnectionError> {
        let pending = {
            let state = self.record(ConnectionCall::WaitForReceipt(*tx_hash))?;
            state.pending.get(tx_hash).copied()
        };
        let pending = pending.ok_or_else(|| ConnectionError::Rpc {
            code: -32000,
            message: format!("unknown transaction {tx_hash}"),
        })?;

        if pending.outcome == SendPolicy::NeverConfirm {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock();
        let block_number = state.next_block;
        state.next_block += 1;
        let success = pending.outcome == SendPolicy::Confirm;
        if success {
            if let Some(word) = pending.word {
                state.anchored.insert((pending.chain_id, word));
            }
        }
        state.pending.remove(tx_hash);
        Ok(TxReceipt {
            tx_hash: *tx_hash,
            block_number,
            success,
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }
}
