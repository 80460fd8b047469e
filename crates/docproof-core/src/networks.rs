//! Well-known ledger networks
//!
//! Static registration data the reconciler offers to a connection that does
//! not recognize the target chain.

use crate::types::ChainId;
use serde::Serialize;

/// Native currency metadata required by `wallet_addEthereumChain`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    /// Currency name
    pub name: &'static str,
    /// Ticker symbol
    pub symbol: &'static str,
    /// Decimal places
    pub decimals: u8,
}

/// Registration data for a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnownNetwork {
    /// Chain identifier
    pub chain_id: ChainId,
    /// Human-readable network name
    pub name: &'static str,
    /// Public RPC endpoints
    pub rpc_urls: &'static [&'static str],
    /// Native currency
    pub native_currency: NativeCurrency,
    /// Block explorers, may be empty
    pub block_explorer_urls: &'static [&'static str],
}

const ETH: NativeCurrency = NativeCurrency {
    name: "Ether",
    symbol: "ETH",
    decimals: 18,
};

/// Ethereum mainnet
pub const MAINNET: KnownNetwork = KnownNetwork {
    chain_id: ChainId::new(1),
    name: "Ethereum Mainnet",
    rpc_urls: &["https://ethereum-rpc.publicnode.com"],
    native_currency: ETH,
    block_explorer_urls: &["https://etherscan.io"],
};

/// Sepolia testnet
pub const SEPOLIA: KnownNetwork = KnownNetwork {
    chain_id: ChainId::new(11_155_111),
    name: "Sepolia",
    rpc_urls: &["https://rpc.sepolia.org"],
    native_currency: NativeCurrency {
        name: "Sepolia Ether",
        symbol: "ETH",
        decimals: 18,
    },
    block_explorer_urls: &["https://sepolia.etherscan.io"],
};

/// Holesky testnet
pub const HOLESKY: KnownNetwork = KnownNetwork {
    chain_id: ChainId::new(17_000),
    name: "Holesky",
    rpc_urls: &["https://ethereum-holesky-rpc.publicnode.com"],
    native_currency: NativeCurrency {
        name: "Holesky Ether",
        symbol: "ETH",
        decimals: 18,
    },
    block_explorer_urls: &["https://holesky.etherscan.io"],
};

/// Local Hardhat / Anvil development node
pub const LOCAL_DEV: KnownNetwork = KnownNetwork {
    chain_id: ChainId::new(31_337),
    name: "Local Hardhat",
    rpc_urls: &["http://127.0.0.1:8545"],
    native_currency: ETH,
    block_explorer_urls: &[],
};

/// Every network the reconciler knows how to register
pub const KNOWN_NETWORKS: &[KnownNetwork] = &[MAINNET, SEPOLIA, HOLESKY, LOCAL_DEV];

/// Look up registration data by chain id
pub fn lookup(chain_id: ChainId) -> Option<&'static KnownNetwork> {
    KNOWN_NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// "Sepolia (chain 11155111)" for known chains, "chain 12345" otherwise
pub fn display_name(chain_id: ChainId) -> String {
    match lookup(chain_id) {
        Some(network) => format!("{} (chain {})", network.name, chain_id),
        None => format!("chain {chain_id}"),
    }
}
