//! Shared fixtures.

use alloy_primitives::{Address, address};
use escrow_test_utils::{MockDiscovery, MockProvider, init_tracing};
use escrow_wallets::{
    ConnectionManager, MemoryStore, SessionStore, WalletConfig, WalletContext, WalletRegistry,
};
use std::{sync::Arc, time::Duration};

pub const ALICE: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const BOB: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");
pub const CAROL: Address = address!("0x90F79bf6EB2c4f870365E785982E1f101E93b906");
pub const DAVE: Address = address!("0x15d34AAf54267DB7D7c367839AAf71A00a2C6A65");

pub const SEPOLIA: u64 = 11_155_111;

/// Config with short timers so tests do not wait on the defaults.
pub fn test_config() -> WalletConfig {
    WalletConfig {
        discovery_timeout_ms: 200,
        discovery_poll_interval_ms: 5,
        restore_listener_delay_ms: 10,
        ..Default::default()
    }
}

/// A manager on top of a discovery bus with the given wallets installed.
pub struct Harness {
    pub discovery: Arc<MockDiscovery>,
    pub registry: WalletRegistry,
    pub store: Arc<MemoryStore>,
    pub manager: ConnectionManager,
}

impl Harness {
    pub fn new(wallets: &[(&str, &str, &Arc<MockProvider>)]) -> Self {
        Self::with_store(wallets, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(wallets: &[(&str, &str, &Arc<MockProvider>)], store: Arc<MemoryStore>) -> Self {
        init_tracing();
        let discovery = Arc::new(install(wallets));
        let config = test_config();
        let registry = WalletRegistry::spawn(discovery.clone(), &config);
        let manager = ConnectionManager::new(registry.clone(), store.clone(), config);
        Self { discovery, registry, store, manager }
    }

    /// Asserts the structural invariants of the account list.
    pub fn check_invariants(&self) {
        let accounts = self.manager.accounts();
        let index = self.manager.active_index();
        if accounts.is_empty() {
            assert_eq!(index, 0);
            assert!(!self.manager.is_connected());
            assert_eq!(self.manager.address(), None);
        } else {
            assert!(index < accounts.len(), "active index {index} out of {}", accounts.len());
            assert_eq!(self.manager.address(), Some(accounts[index].address));
        }
        for (i, account) in accounts.iter().enumerate() {
            assert!(
                accounts[i + 1..].iter().all(|other| other.address != account.address),
                "duplicate account {}",
                account.address
            );
        }
    }

    pub fn persisted(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap()
    }

    pub fn persisted_accounts(&self) -> Vec<serde_json::Value> {
        self.persisted("connectedAccounts")
            .map(|raw| serde_json::from_str(&raw).unwrap())
            .unwrap_or_default()
    }
}

pub fn install(wallets: &[(&str, &str, &Arc<MockProvider>)]) -> MockDiscovery {
    wallets.iter().fold(MockDiscovery::new(), |discovery, (uuid, name, provider)| {
        discovery.with_wallet(uuid, name, (*provider).clone())
    })
}

/// Boots a fresh context against `store`, as a page reload would.
pub async fn reload(
    wallets: &[(&str, &str, &Arc<MockProvider>)],
    store: Arc<MemoryStore>,
) -> WalletContext {
    WalletContext::bootstrap(test_config(), Arc::new(install(wallets)), store).await
}

pub fn wallet(accounts: &[Address], chain_id: u64) -> Arc<MockProvider> {
    Arc::new(MockProvider::wallet(accounts, chain_id))
}

/// Lets spawned tasks (deferred listener attachment, balance refreshes) run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
