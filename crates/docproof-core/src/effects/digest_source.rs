//! Digest source effect
//!
//! The document store computes content digests; this client only asks for
//! them. The wire shape mirrors the collaborator's `/proof/hash/{id}` reply.

use crate::errors::{ProofError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Collaborator reply to a digest request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestResponse {
    /// Whether the collaborator produced a digest
    pub success: bool,
    /// Hex SHA-256 digest, usually without `0x`
    #[serde(default)]
    pub sha256: Option<String>,
    /// Echoed document identifier
    #[serde(default)]
    pub document_id: Option<String>,
    /// Error message when `success` is false
    #[serde(default)]
    pub error: Option<String>,
}

impl DigestResponse {
    /// Extract the raw digest, or the collaborator's reason for not having one
    pub fn into_digest(self, document_id: &str) -> Result<String> {
        if !self.success {
            return Err(ProofError::digest_unavailable(
                document_id,
                self.error
                    .unwrap_or_else(|| "digest service reported failure".to_string()),
            ));
        }
        match self.sha256 {
            Some(digest) if !digest.trim().is_empty() => Ok(digest),
            _ => Err(ProofError::digest_unavailable(
                document_id,
                "response carried no sha256 field",
            )),
        }
    }
}

/// Source of content digests, keyed by document identifier
#[async_trait]
pub trait DigestSourceEffects: Send + Sync {
    /// Fetch the raw hex digest for a document
    ///
    /// The returned text is not canonical; callers must pass it through
    /// [`crate::canonicalize`] before it goes anywhere near the ledger.
    async fn fetch_digest(&self, document_id: &str) -> Result<String>;
}
