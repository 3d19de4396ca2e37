//! provider event tests

use crate::utils::*;
use alloy_primitives::Address;
use escrow_wallets::{ErrorCode, ProviderError, ProviderEvent, ProviderEventKind};

fn accounts_changed(accounts: &[Address]) -> ProviderEvent {
    ProviderEvent::AccountsChanged(accounts.iter().map(|a| a.to_checksum(None)).collect())
}

#[tokio::test]
async fn empty_account_list_disconnects() {
    let provider = wallet(&[ALICE], SEPOLIA);
    let h = Harness::new(&[("w", "Wallet", &provider)]);
    h.manager.connect(None).await.unwrap();

    assert_eq!(provider.emit(accounts_changed(&[])), 1);
    assert!(!h.manager.is_connected());
    assert!(h.store.is_empty());
    // detached, later events go nowhere
    assert_eq!(provider.emit(accounts_changed(&[ALICE])), 0);
}

#[tokio::test]
async fn disconnect_event_disconnects() {
    let provider = wallet(&[ALICE], SEPOLIA);
    let h = Harness::new(&[("w", "Wallet", &provider)]);
    h.manager.connect(None).await.unwrap();

    provider.emit(ProviderEvent::Disconnect(Some(ProviderError::new(ErrorCode::Disconnected))));
    assert!(h.manager.accounts().is_empty());
    assert_eq!(provider.listener_count(ProviderEventKind::Disconnect), 0);
    h.check_invariants();
}

#[tokio::test]
async fn follows_selected_account() {
    let provider = wallet(&[ALICE], SEPOLIA);
    let h = Harness::new(&[("w", "Wallet", &provider)]);
    h.manager.connect(None).await.unwrap();
    let fetched = provider.call_count("eth_getBalance");

    // the user picked BOB in the extension, ALICE is still exposed
    provider.emit(accounts_changed(&[BOB, ALICE]));
    assert_eq!(h.manager.address(), Some(BOB));
    assert_eq!(h.manager.accounts().len(), 1);
    assert_eq!(h.manager.accounts()[0].address, BOB);
    assert_eq!(h.persisted_accounts()[0]["address"], serde_json::json!(BOB));

    settle().await;
    assert_eq!(provider.call_count("eth_getBalance"), fetched + 1);
    assert!(h.manager.balance().is_some());
}

#[tokio::test]
async fn ignores_lists_without_active_account() {
    let provider = wallet(&[ALICE], SEPOLIA);
    let h = Harness::new(&[("w", "Wallet", &provider)]);
    h.manager.connect(None).await.unwrap();

    provider.emit(accounts_changed(&[BOB, CAROL]));
    assert_eq!(h.manager.address(), Some(ALICE));

    provider.emit(ProviderEvent::AccountsChanged(vec!["not an address".to_string()]));
    assert_eq!(h.manager.address(), Some(ALICE));
    assert!(h.manager.is_connected());
}

#[tokio::test]
async fn ignores_drift_of_inactive_wallet() {
    let metamask = wallet(&[ALICE], SEPOLIA);
    let trust = wallet(&[BOB], SEPOLIA);
    let h = Harness::new(&[("mm", "MetaMask", &metamask), ("trust", "Trust Wallet", &trust)]);
    h.manager.connect(Some("mm")).await.unwrap();
    h.manager.connect(Some("trust")).await.unwrap();
    assert_eq!(h.manager.address(), Some(ALICE));

    trust.emit(accounts_changed(&[CAROL, BOB]));
    let addresses: Vec<_> = h.manager.accounts().iter().map(|a| a.address).collect();
    assert_eq!(addresses, [ALICE, BOB]);
}

#[tokio::test]
async fn drift_onto_connected_address_activates_it() {
    let provider = wallet(&[ALICE, BOB], SEPOLIA);
    let h = Harness::new(&[("w", "Wallet", &provider)]);
    h.manager.connect(None).await.unwrap();

    provider.emit(accounts_changed(&[BOB, ALICE]));
    assert_eq!(h.manager.active_index(), 1);
    assert_eq!(h.manager.address(), Some(BOB));
    assert_eq!(h.manager.accounts().len(), 2);
    h.check_invariants();
}

#[tokio::test]
async fn chain_change_moves_accounts_of_emitting_wallet() {
    let metamask = wallet(&[ALICE, BOB], SEPOLIA);
    let trust = wallet(&[CAROL], SEPOLIA);
    let h = Harness::new(&[("mm", "MetaMask", &metamask), ("trust", "Trust Wallet", &trust)]);
    h.manager.connect(Some("mm")).await.unwrap();
    h.manager.connect(Some("trust")).await.unwrap();

    metamask.emit(ProviderEvent::ChainChanged("0x1".to_string()));
    let chains: Vec<_> = h.manager.accounts().iter().map(|a| a.chain_id).collect();
    assert_eq!(chains, [1, 1, SEPOLIA]);
    assert_eq!(h.manager.chain_id(), Some(1));
    assert_eq!(h.persisted_accounts()[1]["chainId"], 1);

    // unsupported chains are tracked too
    trust.emit(ProviderEvent::ChainChanged("0x89".to_string()));
    assert_eq!(h.manager.accounts()[2].chain_id, 137);
    assert_eq!(h.manager.chain_id(), Some(1));

    metamask.emit(ProviderEvent::ChainChanged("mainnet".to_string()));
    assert_eq!(h.manager.chain_id(), Some(1));
}
