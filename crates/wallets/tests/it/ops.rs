//! transaction and signing tests

use crate::utils::*;
use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, Bytes, TxKind, U256, address, b256, bytes, hex};
use alloy_rpc_types_eth::TransactionRequest;
use escrow_wallets::{ProviderError, WalletError};
use serde_json::{Value, json};

const USDT: Address = address!("0xdAC17F958D2ee523a2206206994597C13D831ec7");
const TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

async fn connected() -> (Harness, std::sync::Arc<escrow_test_utils::MockProvider>) {
    let provider = wallet(&[ALICE], SEPOLIA);
    provider.respond("eth_estimateGas", json!("0x5208"));
    provider.respond("eth_sendTransaction", json!(TX_HASH));
    let h = Harness::new(&[("w", "Wallet", &provider)]);
    h.manager.connect(None).await.unwrap();
    (h, provider)
}

fn sent_tx(provider: &escrow_test_utils::MockProvider) -> Value {
    provider.last_call("eth_sendTransaction").unwrap().params[0].clone()
}

#[tokio::test]
async fn send_fills_sender_and_gas() {
    let (h, provider) = connected().await;

    let tx = TransactionRequest {
        to: Some(TxKind::Call(BOB)),
        value: Some(U256::from(1_000u64)),
        ..Default::default()
    };
    let hash = h.manager.send_transaction(tx).await.unwrap();
    assert_eq!(hash, b256!("0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060"));

    let estimated = provider.last_call("eth_estimateGas").unwrap().params[0].clone();
    assert_eq!(estimated["from"], json!(ALICE));
    let sent = sent_tx(&provider);
    assert_eq!(sent["from"], json!(ALICE));
    assert_eq!(sent["to"], json!(BOB));
    assert_eq!(sent["gas"], "0x5208");
    assert_eq!(sent["value"], "0x3e8");
}

#[tokio::test]
async fn send_keeps_explicit_gas() {
    let (h, provider) = connected().await;

    let tx = TransactionRequest { to: Some(TxKind::Call(BOB)), gas: Some(50_000), ..Default::default() };
    h.manager.send_transaction(tx).await.unwrap();
    assert_eq!(provider.call_count("eth_estimateGas"), 0);
    assert_eq!(sent_tx(&provider)["gas"], "0xc350");
}

#[tokio::test]
async fn token_calls_go_through_send() {
    let (h, provider) = connected().await;
    let amount = U256::from(25_000_000u64);

    h.manager.approve_token(USDT, BOB, amount).await.unwrap();
    let sent = sent_tx(&provider);
    assert_eq!(sent["to"], json!(USDT));
    assert_eq!(sent["from"], json!(ALICE));
    let input: Bytes = serde_json::from_value(sent["input"].clone()).unwrap();
    assert_eq!(input[..4], hex!("095ea7b3"));
    assert_eq!(U256::from_be_slice(&input[36..]), amount);

    h.manager.transfer_token(USDT, CAROL, amount).await.unwrap();
    let input: Bytes = serde_json::from_value(sent_tx(&provider)["input"].clone()).unwrap();
    assert_eq!(input[..4], hex!("a9059cbb"));
    assert_eq!(input[16..36], CAROL[..]);
    assert_eq!(provider.call_count("eth_sendTransaction"), 2);
}

#[tokio::test]
async fn signs_messages() {
    let (h, provider) = connected().await;
    provider.respond("personal_sign", json!("0xdeadbeef"));

    let signature = h.manager.sign_message("I agree to the escrow terms").await.unwrap();
    assert_eq!(signature, bytes!("deadbeef"));
    let params = provider.last_call("personal_sign").unwrap().params;
    assert_eq!(params[0], json!(hex::encode_prefixed("I agree to the escrow terms")));
    assert_eq!(params[1], json!(ALICE));
}

#[tokio::test]
async fn signs_typed_data() {
    let (h, provider) = connected().await;
    provider.respond("eth_signTypedData_v4", json!("0x1234"));

    let typed_data: TypedData = serde_json::from_value(json!({
        "types": {
            "EIP712Domain": [
                { "name": "name", "type": "string" },
                { "name": "chainId", "type": "uint256" }
            ],
            "Release": [
                { "name": "tradeId", "type": "uint256" },
                { "name": "buyer", "type": "address" }
            ]
        },
        "primaryType": "Release",
        "domain": { "name": "Escrow", "chainId": "0xaa36a7" },
        "message": { "tradeId": 7, "buyer": "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC" }
    }))
    .unwrap();

    let signature = h.manager.sign_typed_data(&typed_data).await.unwrap();
    assert_eq!(signature, bytes!("1234"));
    let params = provider.last_call("eth_signTypedData_v4").unwrap().params;
    assert_eq!(params[0], json!(ALICE));
    let payload: Value = serde_json::from_str(params[1].as_str().unwrap()).unwrap();
    assert_eq!(payload["primaryType"], "Release");
}

#[tokio::test]
async fn reads_nonce_gas_price_and_estimates() {
    let (h, provider) = connected().await;
    provider.respond("eth_getTransactionCount", json!("0x2a"));
    // above 2^64 wei, exceeds any fixed width float
    provider.respond("eth_gasPrice", json!("0x1bc16d674ec800000"));

    assert_eq!(h.manager.get_nonce().await.unwrap(), U256::from(42));
    assert_eq!(
        provider.last_call("eth_getTransactionCount").unwrap().params,
        [json!(ALICE), json!("latest")]
    );
    assert_eq!(
        h.manager.get_gas_price().await.unwrap(),
        U256::from(32_000_000_000_000_000_000u128)
    );

    let gas = h
        .manager
        .estimate_gas(TransactionRequest { to: Some(TxKind::Call(BOB)), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(gas, U256::from(21_000));
}

#[tokio::test]
async fn failures_are_recorded_and_raised() {
    let (h, provider) = connected().await;
    provider.fail("eth_sendTransaction", ProviderError::user_rejected());

    let err = h.manager.transfer_token(USDT, BOB, U256::from(1)).await.unwrap_err();
    assert_eq!(err, WalletError::Provider(ProviderError::user_rejected()));
    assert_eq!(h.manager.last_error(), Some(err.to_string()));
    // not retried
    assert_eq!(provider.call_count("eth_sendTransaction"), 1);

    provider.respond("eth_gasPrice", json!("not hex"));
    let err = h.manager.get_gas_price().await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidResponse { method: "eth_gasPrice", .. }));
    // the session survives operation failures
    assert!(h.manager.is_connected());
}

#[tokio::test]
async fn operations_require_connection() {
    let provider = wallet(&[ALICE], SEPOLIA);
    let h = Harness::new(&[("w", "Wallet", &provider)]);

    let tx = TransactionRequest::default();
    assert_eq!(h.manager.send_transaction(tx).await, Err(WalletError::NotConnected));
    assert_eq!(h.manager.sign_message(b"hi").await, Err(WalletError::NotConnected));
    assert_eq!(h.manager.get_nonce().await, Err(WalletError::NotConnected));
    assert_eq!(h.manager.get_gas_price().await, Err(WalletError::NotConnected));
    assert!(provider.calls().is_empty());
    assert_eq!(h.manager.refresh_balance().await, None);
}

#[tokio::test]
async fn refreshes_balance() {
    let (h, provider) = connected().await;
    provider.respond("eth_getBalance", json!("0x0"));

    assert_eq!(h.manager.refresh_balance().await, Some(U256::ZERO));
    assert_eq!(h.manager.balance(), Some(U256::ZERO));

    provider.fail("eth_getBalance", ProviderError::internal_error_with("down"));
    assert_eq!(h.manager.refresh_balance().await, None);
    // last known balance is kept and nothing is recorded
    assert_eq!(h.manager.balance(), Some(U256::ZERO));
    assert_eq!(h.manager.last_error(), None);
}
