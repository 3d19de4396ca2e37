//! Static registry of the chains the application can switch wallets to.

use crate::rpc::{AddChainParams, NativeCurrency};

/// Ethereum mainnet.
pub const ETH_MAINNET: u64 = 1;
/// Ethereum Sepolia testnet.
pub const ETH_SEPOLIA: u64 = 11_155_111;
/// TRON mainnet, through its JSON-RPC gateway.
pub const TRON_MAINNET: u64 = 728_126_428;
/// TRON Shasta testnet.
pub const TRON_SHASTA: u64 = 2_494_104_990;

/// Native currencies of all supported chains use 18 decimals on the wallet side.
const NATIVE_DECIMALS: u8 = 18;

/// Static configuration of a supported chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    pub id: u64,
    /// `id` as a `0x` prefixed hex string, the form wallets expect.
    pub hex_id: &'static str,
    pub name: &'static str,
    pub rpc_url: &'static str,
    pub symbol: &'static str,
    pub explorer_url: &'static str,
}

impl ChainConfig {
    /// The `wallet_addEthereumChain` payload for this chain.
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: self.hex_id.to_string(),
            chain_name: self.name.to_string(),
            rpc_urls: vec![self.rpc_url.to_string()],
            block_explorer_urls: vec![self.explorer_url.to_string()],
            native_currency: NativeCurrency {
                name: self.symbol.to_string(),
                symbol: self.symbol.to_string(),
                decimals: NATIVE_DECIMALS,
            },
        }
    }
}

static SUPPORTED_CHAINS: [ChainConfig; 4] = [
    ChainConfig {
        id: ETH_MAINNET,
        hex_id: "0x1",
        name: "Ethereum Mainnet",
        rpc_url: "https://eth.public-rpc.com",
        symbol: "ETH",
        explorer_url: "https://etherscan.io",
    },
    ChainConfig {
        id: ETH_SEPOLIA,
        hex_id: "0xaa36a7",
        name: "Ethereum Sepolia",
        rpc_url: "https://sepolia.eth.public-rpc.com",
        symbol: "ETH",
        explorer_url: "https://sepolia.etherscan.io",
    },
    ChainConfig {
        id: TRON_MAINNET,
        hex_id: "0x2b6653dc",
        name: "TRON Mainnet",
        rpc_url: "https://api.tronstack.com/jsonrpc",
        symbol: "TRX",
        explorer_url: "https://tronscan.org",
    },
    ChainConfig {
        id: TRON_SHASTA,
        hex_id: "0x94a9059e",
        name: "TRON Shasta",
        rpc_url: "https://api.shasta.tronstack.com/jsonrpc",
        symbol: "TRX",
        explorer_url: "https://shasta.tronscan.org",
    },
];

/// Returns the configuration of `chain_id`, if supported.
pub fn chain_config(chain_id: u64) -> Option<&'static ChainConfig> {
    SUPPORTED_CHAINS.iter().find(|chain| chain.id == chain_id)
}

/// Whether `chain_id` is in the static registry.
pub fn is_supported(chain_id: u64) -> bool {
    chain_config(chain_id).is_some()
}

/// All supported chains.
pub fn supported_chains() -> &'static [ChainConfig] {
    &SUPPORTED_CHAINS
}
