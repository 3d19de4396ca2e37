//! Startup wiring of the wallet services.

use crate::{
    config::WalletConfig,
    discovery::{DiscoveryChannel, WalletRegistry},
    manager::ConnectionManager,
    session::PersistedSession,
    store::SessionStore,
};
use std::sync::Arc;

/// The wallet services of one application instance.
///
/// Built once at startup and passed by reference to whatever needs wallet access.
#[derive(Clone, Debug)]
pub struct WalletContext {
    pub registry: WalletRegistry,
    pub manager: ConnectionManager,
}

impl WalletContext {
    /// Starts discovery and restores the persisted session.
    ///
    /// Restoring needs the wallets of the persisted accounts, so when a session exists this waits
    /// for discovery first, at most [`WalletConfig::discovery_timeout`].
    pub async fn bootstrap(
        config: WalletConfig,
        channel: Arc<dyn DiscoveryChannel>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let registry = WalletRegistry::spawn(channel, &config);

        if PersistedSession::load(&*store, &config).is_some_and(|session| !session.accounts.is_empty()) {
            let wallets = registry.await_discovery(config.discovery_timeout()).await;
            debug!(target: "wallets::bootstrap", wallets = wallets.len(), "discovery finished before restore");
        }

        let manager = ConnectionManager::new(registry.clone(), store, config);
        let restored = manager.restore_session();
        debug!(target: "wallets::bootstrap", restored, "wallet context ready");

        Self { registry, manager }
    }
}
