//! HTTP digest source
//!
//! Asks the document service for a document's content digest at
//! `GET {api_base}/proof/hash/{document_id}`, with an optional bearer token.

use async_trait::async_trait;
use docproof_core::effects::{DigestResponse, DigestSourceEffects};
use docproof_core::{ProofConfig, ProofError, Result};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// Digest source backed by the document service's HTTP API
#[derive(Debug, Clone)]
pub struct HttpDigestSource {
    client: Client,
    api_base: Url,
    auth_token: Option<String>,
}

impl HttpDigestSource {
    /// Source for `api_base`, authenticating with `auth_token` when given
    pub fn new(api_base: &str, auth_token: Option<String>, timeout: Duration) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| ProofError::configuration(format!("invalid api_base '{api_base}': {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(ProofError::configuration(format!(
                "api_base '{api_base}' cannot carry a path"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProofError::connectivity(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base,
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Source configured from `api_base`, `auth_token` and the request timeout
    pub fn from_config(config: &ProofConfig) -> Result<Self> {
        Self::new(
            &config.api_base,
            config.auth_token.clone(),
            config.request_timeout(),
        )
    }

    /// Endpoint queried for `document_id`
    pub fn digest_url(&self, document_id: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["proof", "hash", document_id]);
        }
        url
    }
}

#[async_trait]
impl DigestSourceEffects for HttpDigestSource {
    async fn fetch_digest(&self, document_id: &str) -> Result<String> {
        let url = self.digest_url(document_id);
        debug!(%url, document_id, "fetching document digest");

        let mut request = self.client.get(url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| {
            ProofError::connectivity(format!("digest service unreachable: {e}"))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProofError::digest_unavailable(document_id, e.to_string()))?;

        // error replies usually carry the same JSON envelope
        match serde_json::from_str::<DigestResponse>(&body) {
            Ok(reply) if status.is_success() => reply.into_digest(document_id),
            Ok(reply) => Err(ProofError::digest_unavailable(
                document_id,
                reply
                    .error
                    .unwrap_or_else(|| format!("digest service returned HTTP {status}")),
            )),
            Err(_) if !status.is_success() => Err(ProofError::digest_unavailable(
                document_id,
                format!("digest service returned HTTP {status}"),
            )),
            Err(e) => Err(ProofError::digest_unavailable(
                document_id,
                format!("unreadable digest response: {e}"),
            )),
        }
    }
}
