//! Anchor and verify workflows
//!
//! Each workflow is an explicit state machine over one document. A transition
//! fires only when the previous step succeeded; any failure moves straight to
//! a terminal `Failed` state carrying the phase and the typed error. Nothing is
//! retried.
//!
//! Progress can be observed through an optional [`tokio::sync::watch`]
//! channel. Every state entered, including `Idle` and the terminal state, is
//! published; a watcher that falls behind only sees the latest one.

pub mod anchor;
pub mod verify;

pub use anchor::{AnchorReceipt, AnchorState, AnchorWorkflow};
pub use verify::{VerifyState, VerifyWorkflow};

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

/// Non-terminal step a workflow can fail in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Asking the digest source and canonicalizing the answer
    FetchingDigest,
    /// Aligning the connection with the target chain
    Reconciling,
    /// Looking for contract code at the target address
    CheckingContract,
    /// Broadcasting the anchor write
    Submitting,
    /// Waiting for the network's verdict on the write
    AwaitingConfirmation,
    /// Running the read-only existence query
    Querying,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FetchingDigest => "fetching digest",
            Self::Reconciling => "reconciling network",
            Self::CheckingContract => "checking contract",
            Self::Submitting => "submitting",
            Self::AwaitingConfirmation => "awaiting confirmation",
            Self::Querying => "querying",
        };
        f.write_str(label)
    }
}

/// Optional progress sink shared by both workflows
#[derive(Debug)]
pub(crate) struct Progress<S> {
    sender: Option<watch::Sender<S>>,
}

impl<S> Default for Progress<S> {
    fn default() -> Self {
        Self { sender: None }
    }
}

impl<S: Clone> Progress<S> {
    pub(crate) fn attach(&mut self, sender: watch::Sender<S>) {
        self.sender = Some(sender);
    }

    pub(crate) fn publish(&self, state: &S) {
        if let Some(sender) = &self.sender {
            // send_replace stores the value even when nobody is subscribed
            sender.send_replace(state.clone());
        }
    }
}
