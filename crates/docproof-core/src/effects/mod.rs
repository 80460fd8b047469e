//! Effect traits
//!
//! Capabilities the client consumes from its environment. Production handlers
//! live in `docproof-effects`; deterministic doubles live in
//! `docproof-testkit`.

pub mod connection;
pub mod digest_source;
pub mod events;

pub use connection::{
    CallRequest, ConnectionEffects, ConnectionError, TransactionRequest, TxReceipt,
};
pub use digest_source::{DigestResponse, DigestSourceEffects};
pub use events::{ConnectionEvent, ConnectionEventBus, DEFAULT_EVENT_CAPACITY};
