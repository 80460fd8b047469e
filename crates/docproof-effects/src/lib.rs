//! # docproof effects
//!
//! Production handlers for the `docproof-core` effect traits:
//!
//! - [`JsonRpcConnection`] implements `ConnectionEffects` over HTTP JSON-RPC
//! - [`HttpDigestSource`] implements `DigestSourceEffects` against the
//!   document service
//!
//! Handlers are stateless apart from an HTTP client and the notification bus;
//! they never cache chain ids or accounts.

#![forbid(unsafe_code)]

pub mod digest_source;
pub mod json_rpc;

pub use digest_source::HttpDigestSource;
pub use json_rpc::{classify_rpc_error, parse_quantity, JsonRpcConnection};
