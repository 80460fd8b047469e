//! # docproof testkit
//!
//! Deterministic doubles for the docproof effect traits:
//!
//! - [`MockConnection`]: in-memory ledger connection with call recording and
//!   a minimal anchor-contract emulation
//! - [`MockDigestSource`]: map-backed digest collaborator
//! - [`fixtures`]: shared chain ids, addresses and digests
//!
//! # Blocking Lock Usage
//!
//! Uses `parking_lot::Mutex` because locks are never held across an await and
//! tests prefer the simpler synchronous API.

pub mod connection;
pub mod digest_source;
pub mod fixtures;

pub use connection::{
    ConnectionCall, MockConnection, SendPolicy, SwitchPolicy, DEFAULT_ACCOUNT, MOCK_CONTRACT_CODE,
};
pub use digest_source::MockDigestSource;
