//! # escrow-wallets
//!
//! Wallet discovery and multi-account connection management for the escrow dApp.
//!
//! - [EIP-6963](https://eips.ethereum.org/EIPS/eip-6963): multi injected provider discovery
//! - [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193): the provider API wallets expose
//! - [EIP-3085](https://eips.ethereum.org/EIPS/eip-3085) and
//!   [EIP-3326](https://eips.ethereum.org/EIPS/eip-3326): adding and switching chains
//!
//! The environment is reached through three traits: [`Eip1193Provider`] for the wallets
//! themselves, [`DiscoveryChannel`] for the announcement bus and [`SessionStore`] for durable
//! storage. [`WalletContext::bootstrap`] wires them into a [`WalletRegistry`] and a
//! [`ConnectionManager`].

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
extern crate tracing;

pub mod bootstrap;
pub mod chains;
pub mod config;
pub mod discovery;
pub mod error;
pub mod manager;
pub mod provider;
pub mod rpc;
pub mod session;
pub mod store;
pub mod tx;

pub use bootstrap::WalletContext;
pub use chains::ChainConfig;
pub use config::WalletConfig;
pub use discovery::{
    DiscoveryChannel, ProviderAnnouncement, ProviderInfo, Subscription, WalletInfo, WalletRegistry,
};
pub use error::{
    ConfigError, DiscoveryError, ErrorCode, ProviderError, RpcError, StoreError, WalletError,
};
pub use manager::{ConnectionManager, ConnectionStatus};
pub use provider::{
    Eip1193Provider, EventHandler, ListenerId, ProviderCapabilities, ProviderEvent,
    ProviderEventKind, ProviderHandle,
};
pub use rpc::{AddChainParams, EthRpc, NativeCurrency};
pub use session::{ConnectedAccount, PersistedAccount, PersistedSession};
pub use store::{FileStore, MemoryStore, SessionStore};
