//! wallet discovery tests

use crate::utils::*;
use escrow_test_utils::{MockDiscovery, announcement};
use escrow_wallets::{WalletConfig, WalletRegistry};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

fn slow_settling_registry(discovery: &Arc<MockDiscovery>) -> WalletRegistry {
    let config = WalletConfig { discovery_timeout_ms: 10_000, ..test_config() };
    WalletRegistry::spawn(discovery.clone(), &config)
}

fn announce_later(discovery: &Arc<MockDiscovery>, uuid: &'static str) {
    let discovery = discovery.clone();
    let provider = wallet(&[ALICE], SEPOLIA);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(discovery.announce(announcement(uuid, "Late Wallet", provider)));
    });
}

#[tokio::test]
async fn returns_once_a_wallet_announces() {
    let discovery = Arc::new(MockDiscovery::new());
    let registry = slow_settling_registry(&discovery);
    assert!(discovery.is_listening());
    assert_eq!(discovery.request_count(), 1);
    assert!(registry.is_empty());

    announce_later(&discovery, "late");
    let start = Instant::now();
    let wallets = registry.await_discovery(Duration::from_secs(5)).await;
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(wallets.len(), 1);
    assert_eq!(wallets[0].id, "late");
}

#[tokio::test]
async fn unbounded_wait_returns_on_announcement() {
    let discovery = Arc::new(MockDiscovery::new());
    let registry = slow_settling_registry(&discovery);

    announce_later(&discovery, "late");
    let wallets = tokio::time::timeout(Duration::from_secs(5), registry.await_discovery(Duration::MAX))
        .await
        .unwrap();
    assert_eq!(wallets.len(), 1);
}
