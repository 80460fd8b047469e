//! Digest canonicalization
//!
//! The ledger contract stores digests in a `bytes32` slot. Collaborators hand
//! us hex text of arbitrary width and casing; [`canonicalize`] is the only way
//! to obtain a [`CanonicalDigest`], so nothing reaches the ledger in any other
//! form.
//!
//! Inputs shorter than 32 bytes are left-padded with zero bytes. Inputs longer
//! than 32 bytes are rejected rather than truncated or padded.

use crate::errors::{ProofError, Result};
use crate::types::strip_hex_prefix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of the ledger's digest slot in bytes
pub const DIGEST_BYTES: usize = 32;

const DIGEST_HEX_DIGITS: usize = DIGEST_BYTES * 2;

/// A digest in the ledger's fixed-width form
///
/// Displays as `0x` followed by exactly 64 lower-case hex digits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalDigest([u8; DIGEST_BYTES]);

impl CanonicalDigest {
    /// Wrap raw digest bytes; any 32-byte value is already canonical
    pub const fn from_bytes(bytes: [u8; DIGEST_BYTES]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes, as written into the ABI word
    pub fn as_bytes(&self) -> &[u8; DIGEST_BYTES] {
        &self.0
    }
}

/// Normalize a hex digest into its canonical 32-byte form
///
/// Accepts input with or without a `0x` prefix in any letter case. An odd
/// number of digits is read as if it carried a leading zero nibble.
///
/// # Errors
/// - [`ProofError::MalformedDigest`] for empty input or non-hex characters
/// - [`ProofError::InvalidDigestLength`] when the input exceeds 32 bytes
pub fn canonicalize(raw_hex: &str) -> Result<CanonicalDigest> {
    let trimmed = raw_hex.trim();
    let digits = strip_hex_prefix(trimmed).unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(ProofError::malformed_digest("digest is empty"));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ProofError::malformed_digest(format!(
            "non-hex character {bad:?} in '{trimmed}'"
        )));
    }

    let byte_len = digits.len().div_ceil(2);
    if byte_len > DIGEST_BYTES {
        return Err(ProofError::InvalidDigestLength { bytes: byte_len });
    }

    let mut padded = "0".repeat(DIGEST_HEX_DIGITS - digits.len());
    padded.push_str(digits);

    let mut bytes = [0u8; DIGEST_BYTES];
    hex::decode_to_slice(&padded, &mut bytes)
        .map_err(|e| ProofError::malformed_digest(e.to_string()))?;
    Ok(CanonicalDigest(bytes))
}

impl FromStr for CanonicalDigest {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self> {
        canonicalize(s)
    }
}

impl TryFrom<String> for CanonicalDigest {
    type Error = ProofError;

    fn try_from(value: String) -> Result<Self> {
        canonicalize(&value)
    }
}

impl From<CanonicalDigest> for String {
    fn from(digest: CanonicalDigest) -> Self {
        digest.to_string()
    }
}

impl fmt::Display for CanonicalDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for CanonicalDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalDigest({self})")
    }
}
