//! # docproof core
//!
//! Shared vocabulary for the ledger anchoring client:
//!
//! - **Digests**: [`canonicalize`] turns collaborator hex into the ledger's
//!   fixed 32-byte form
//! - **Identifiers**: [`ChainId`], [`Address`], [`TxHash`]
//! - **Errors**: the closed [`ProofError`] taxonomy
//! - **Effects**: connection, digest-source and notification capabilities
//!   injected into every operation
//! - **Configuration**: [`ProofConfig`] and the validated [`LedgerTarget`]
//!
//! This crate performs no I/O beyond reading configuration files.

pub mod config;
pub mod diagnostics;
pub mod digest;
pub mod effects;
pub mod errors;
pub mod networks;
pub mod types;

pub use config::{LedgerTarget, ProofConfig};
pub use diagnostics::{DiagnosticDetails, DiagnosticReason, DiagnosticResult};
pub use digest::{canonicalize, CanonicalDigest, DIGEST_BYTES};
pub use effects::{
    CallRequest, ConnectionEffects, ConnectionError, ConnectionEvent, ConnectionEventBus,
    DigestResponse, DigestSourceEffects, TransactionRequest, TxReceipt,
};
pub use errors::{ErrorCategory, ProofError, Result};
pub use networks::{KnownNetwork, NativeCurrency, KNOWN_NETWORKS};
pub use types::{
    Address, AnchorTransaction, ChainId, TransactionHandle, TxHash, TxOutcome, TxStatus,
};
