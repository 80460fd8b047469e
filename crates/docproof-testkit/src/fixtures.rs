//! Shared fixture values

use docproof_core::{Address, ChainId, LedgerTarget};

/// Sepolia, the usual target network
pub const SEPOLIA: ChainId = ChainId::new(11_155_111);

/// Ethereum mainnet, the usual "wrong" network
pub const MAINNET: ChainId = ChainId::new(1);

/// Local development chain
pub const LOCAL_DEV: ChainId = ChainId::new(31_337);

/// A chain absent from the known-network table
pub const UNLISTED: ChainId = ChainId::new(424_242);

/// Anchor contract address used across tests
pub const CONTRACT: Address = Address::from_bytes([
    0x5f, 0xbd, 0xb2, 0x31, 0x56, 0x78, 0xaf, 0xec, 0xb3, 0x67, 0xf0, 0x32, 0xd9, 0x3f, 0x64,
    0x2f, 0x64, 0x18, 0x0a, 0xa3,
]);

/// A 64-digit SHA-256 digest as the document service returns it
pub const SAMPLE_SHA256: &str = "3f25a0c1d2e3f4a5b6c7d8e9f00112233445566778899aabbccddeeff0011223";

/// Document id paired with [`SAMPLE_SHA256`]
pub const SAMPLE_DOCUMENT: &str = "doc-0001";

/// Target pointing at [`CONTRACT`] on `chain_id`
pub fn target(chain_id: ChainId) -> LedgerTarget {
    LedgerTarget {
        chain_id,
        contract: CONTRACT,
    }
}
