//! Anchor contract ABI codec
//!
//! Hand-rolled Solidity ABI encoding for the two functions the client calls.
//! The contract surface is fixed:
//!
//! ```text
//! function anchor(bytes32 hash, string docId)
//! function isAnchored(bytes32 hash) view returns (bool)
//! event Anchored(bytes32 hash, string docId, address indexed sender, uint256 timestamp)
//! ```

use docproof_core::{CanonicalDigest, ProofError, Result};
use sha3::{Digest, Keccak256};

/// ABI word width
pub const WORD: usize = 32;

/// Canonical signature of the write function
pub const ANCHOR_SIGNATURE: &str = "anchor(bytes32,string)";

/// Canonical signature of the read function
pub const IS_ANCHORED_SIGNATURE: &str = "isAnchored(bytes32)";

/// First four bytes of the Keccak-256 hash of a function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for `isAnchored(bytes32)`
pub fn encode_is_anchored(digest: &CanonicalDigest) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&selector(IS_ANCHORED_SIGNATURE));
    data.extend_from_slice(digest.as_bytes());
    data
}

/// Calldata for `anchor(bytes32,string)`
///
/// Head: digest word, then the offset of the string tail (two words).
/// Tail: length word, then UTF-8 bytes right-padded to a word boundary.
pub fn encode_anchor(digest: &CanonicalDigest, external_id: &str) -> Vec<u8> {
    let bytes = external_id.as_bytes();
    let padded_len = bytes.len().div_ceil(WORD) * WORD;

    let mut data = Vec::with_capacity(4 + 3 * WORD + padded_len);
    data.extend_from_slice(&selector(ANCHOR_SIGNATURE));
    data.extend_from_slice(digest.as_bytes());
    data.extend_from_slice(&uint_word(2 * WORD as u64));
    data.extend_from_slice(&uint_word(bytes.len() as u64));
    data.extend_from_slice(bytes);
    data.resize(4 + 3 * WORD + padded_len, 0);
    data
}

/// Decode a single `bool` return value
///
/// # Errors
/// [`ProofError::UnknownLedger`] when the data is not one well-formed bool
/// word. Empty return data usually means the call hit an address without the
/// expected contract.
pub fn decode_bool(data: &[u8]) -> Result<bool> {
    if data.is_empty() {
        return Err(ProofError::unknown_ledger(
            "empty return data from isAnchored",
        ));
    }
    let word = data.get(..WORD).ok_or_else(|| {
        ProofError::unknown_ledger(format!(
            "isAnchored returned {} bytes, expected {WORD}",
            data.len()
        ))
    })?;
    if word[..WORD - 1].iter().any(|b| *b != 0) || word[WORD - 1] > 1 {
        return Err(ProofError::unknown_ledger(format!(
            "isAnchored returned a non-boolean word 0x{}",
            hex::encode(word)
        )));
    }
    Ok(word[WORD - 1] == 1)
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}
