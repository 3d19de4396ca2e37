//! Wallet connection settings.

use crate::error::ConfigError;
use figment::{
    Figment, Provider,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Tunables of discovery, session restoration and persistence.
///
/// Values are read from, in increasing priority: the defaults, `wallet.toml` in the working
/// directory and `ESCROW_WALLET_` prefixed environment variables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// How long discovery waits for announcements before it counts as settled.
    pub discovery_timeout_ms: u64,
    /// Poll interval of [`WalletRegistry::await_discovery`](crate::WalletRegistry::await_discovery).
    pub discovery_poll_interval_ms: u64,
    /// Delay before event listeners are attached to providers of a restored session, giving the
    /// extension time to initialize.
    pub restore_listener_delay_ms: u64,
    /// Chain assumed when the wallet fails to report one while connecting.
    pub default_chain_id: u64,
    /// Storage key of the serialized account list.
    pub accounts_key: String,
    /// Storage key of the active account index.
    pub active_index_key: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_ms: 3_000,
            discovery_poll_interval_ms: 100,
            restore_listener_delay_ms: 500,
            default_chain_id: crate::chains::ETH_MAINNET,
            accounts_key: "connectedAccounts".to_string(),
            active_index_key: "activeAccountIndex".to_string(),
        }
    }
}

impl WalletConfig {
    /// The default name of the config file.
    pub const FILE_NAME: &'static str = "wallet.toml";

    /// Prefix of the environment variables overriding the config.
    pub const ENV_PREFIX: &'static str = "ESCROW_WALLET_";

    /// Loads the config from [`WalletConfig::FILE_NAME`] in the current directory and the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_root(".")
    }

    /// Same as [`WalletConfig::load`] but resolves the config file relative to `root`.
    pub fn load_with_root(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_provider(Self::figment_with_root(root))
    }

    /// Extracts a config from any figment provider, falling back to defaults for missing keys.
    pub fn from_provider<T: Provider>(provider: T) -> Result<Self, ConfigError> {
        Ok(Figment::from(Serialized::defaults(Self::default())).merge(provider).extract()?)
    }

    /// The layered figment: defaults, then the config file, then the environment.
    pub fn figment_with_root(root: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(root.as_ref().join(Self::FILE_NAME)))
            .merge(Env::prefixed(Self::ENV_PREFIX))
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn discovery_poll_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_poll_interval_ms.max(1))
    }

    pub fn restore_listener_delay(&self) -> Duration {
        Duration::from_millis(self.restore_listener_delay_ms)
    }
}
