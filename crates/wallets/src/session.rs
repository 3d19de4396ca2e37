//! Connected accounts and their persisted form.

use crate::{
    config::WalletConfig, discovery::WalletInfo, error::StoreError, provider::ProviderHandle,
    store::SessionStore,
};
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account exposed by a connected wallet.
///
/// Addresses compare case-insensitively by construction, [`Address`] holds raw bytes.
#[derive(Clone)]
pub struct ConnectedAccount {
    pub address: Address,
    pub chain_id: u64,
    /// Id of the announcing wallet, see [`WalletInfo::id`].
    pub provider_id: String,
    pub provider_name: String,
    pub provider: ProviderHandle,
    /// Last fetched native balance, `None` until fetched or if fetching failed.
    pub balance: Option<U256>,
    pub last_activated_at: DateTime<Utc>,
}

impl ConnectedAccount {
    pub fn new(address: Address, chain_id: u64, wallet: &WalletInfo) -> Self {
        Self {
            address,
            chain_id,
            provider_id: wallet.id.clone(),
            provider_name: wallet.name.clone(),
            provider: wallet.provider.clone(),
            balance: None,
            last_activated_at: Utc::now(),
        }
    }

    /// Rebuilds an account from its persisted form and the wallet that provides it.
    pub fn restore(persisted: &PersistedAccount, wallet: &WalletInfo) -> Self {
        Self {
            address: persisted.address,
            chain_id: persisted.chain_id,
            provider_id: persisted.provider_id.clone(),
            provider_name: persisted.display_name.clone(),
            provider: wallet.provider.clone(),
            balance: None,
            last_activated_at: persisted.last_activated_at,
        }
    }

    pub fn to_persisted(&self) -> PersistedAccount {
        PersistedAccount {
            address: self.address,
            chain_id: self.chain_id,
            provider_id: self.provider_id.clone(),
            display_name: self.provider_name.clone(),
            last_activated_at: self.last_activated_at,
        }
    }
}

impl fmt::Debug for ConnectedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedAccount")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("provider_id", &self.provider_id)
            .field("provider_name", &self.provider_name)
            .field("balance", &self.balance)
            .field("last_activated_at", &self.last_activated_at)
            .finish_non_exhaustive()
    }
}

/// Serialized account entry. The provider handle is never persisted.
///
/// Entries written under the legacy `walletUuid`/`walletName`/`lastUsed` names are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAccount {
    pub address: Address,
    pub chain_id: u64,
    #[serde(alias = "walletUuid")]
    pub provider_id: String,
    #[serde(alias = "walletName")]
    pub display_name: String,
    #[serde(alias = "lastUsed", with = "chrono::serde::ts_milliseconds")]
    pub last_activated_at: DateTime<Utc>,
}

/// The persisted unit: the ordered account list and the active index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistedSession {
    pub accounts: Vec<PersistedAccount>,
    pub active_index: usize,
}

impl PersistedSession {
    /// Reads the session from `store`.
    ///
    /// A missing account list means there is no prior session. A corrupt one is logged and treated
    /// the same way. A missing or unparsable active index reads as 0.
    pub fn load(store: &dyn SessionStore, config: &WalletConfig) -> Option<Self> {
        let raw = match store.get(&config.accounts_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(target: "wallets::session", %err, "failed to read persisted accounts");
                return None;
            }
        };
        let accounts: Vec<PersistedAccount> = match serde_json::from_str(&raw) {
            Ok(accounts) => accounts,
            Err(err) => {
                error!(target: "wallets::session", %err, "failed to decode persisted accounts");
                return None;
            }
        };

        let active_index = match store.get(&config.active_index_key) {
            Ok(raw) => raw.and_then(|raw| raw.trim().parse().ok()).unwrap_or_default(),
            Err(err) => {
                warn!(target: "wallets::session", %err, "failed to read persisted active index");
                0
            }
        };

        Some(Self { accounts, active_index })
    }

    /// Writes the session to `store`, returning the first failure.
    pub fn save(&self, store: &dyn SessionStore, config: &WalletConfig) -> Result<(), StoreError> {
        store.set(&config.accounts_key, &serde_json::to_string(&self.accounts)?)?;
        store.set(&config.active_index_key, &self.active_index.to_string())?;
        Ok(())
    }

    /// Removes both session entries from `store`.
    pub fn clear(store: &dyn SessionStore, config: &WalletConfig) -> Result<(), StoreError> {
        store.remove(&config.accounts_key)?;
        store.remove(&config.active_index_key)?;
        Ok(())
    }
}
