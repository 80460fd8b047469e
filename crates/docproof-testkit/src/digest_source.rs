//! In-memory digest source

use async_trait::async_trait;
use docproof_core::{DigestSourceEffects, ProofError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Digest source backed by a map of document id to raw hex
#[derive(Debug, Clone, Default)]
pub struct MockDigestSource {
    digests: Arc<Mutex<HashMap<String, String>>>,
    fetches: Arc<Mutex<Vec<String>>>,
}

impl MockDigestSource {
    /// Empty source; every fetch fails with `DigestUnavailable`
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a digest for a document
    pub fn with_digest(self, document_id: impl Into<String>, raw_hex: impl Into<String>) -> Self {
        self.digests
            .lock()
            .insert(document_id.into(), raw_hex.into());
        self
    }

    /// Document ids requested so far, in order
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }
}

#[async_trait]
impl DigestSourceEffects for MockDigestSource {
    async fn fetch_digest(&self, document_id: &str) -> Result<String> {
        self.fetches.lock().push(document_id.to_string());
        self.digests
            .lock()
            .get(document_id)
            .cloned()
            .ok_or_else(|| ProofError::digest_unavailable(document_id, "Document not found"))
    }
}
