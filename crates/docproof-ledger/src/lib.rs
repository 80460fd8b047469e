//! # docproof ledger
//!
//! Anchoring and verification protocol on top of the `docproof-core`
//! capabilities.
//!
//! # Architecture
//!
//! - [`abi`] - calldata codec for the anchor contract
//! - [`reconciler`] - aligns the connection with the target chain
//! - [`client`] - ledger reads and writes, guarded by chain and code checks
//! - [`diagnostics`] - passive health probe that never fails
//! - [`workflows`] - anchor and verify state machines
//!
//! Every operation takes its connection explicitly; nothing here holds a
//! global provider.

#![forbid(unsafe_code)]

pub mod abi;
pub mod client;
pub mod diagnostics;
pub mod reconciler;
pub mod workflows;

pub use client::{contract_code_len, has_contract_code, DeployedContract, LedgerClient};
pub use diagnostics::{probe, DiagnosticsProbe};
pub use reconciler::NetworkReconciler;
pub use workflows::{
    AnchorReceipt, AnchorState, AnchorWorkflow, Phase, VerifyState, VerifyWorkflow,
};

/// Common imports for callers driving workflows
pub mod prelude {
    pub use crate::{
        probe, AnchorState, AnchorWorkflow, DiagnosticsProbe, LedgerClient, NetworkReconciler,
        Phase, VerifyState, VerifyWorkflow,
    };
    pub use docproof_core::{
        canonicalize, CanonicalDigest, ChainId, DiagnosticResult, LedgerTarget, ProofConfig,
        ProofError,
    };
}
