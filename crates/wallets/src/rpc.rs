//! Typed JSON-RPC calls against a single wallet provider.

use crate::{error::RpcError, provider::ProviderHandle};
use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, Bytes, TxHash, U256, hex};
use alloy_rpc_types_eth::{BlockNumberOrTag, TransactionRequest};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::fmt;

/// Parameters of `wallet_addEthereumChain`, see EIP-3085.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_explorer_urls: Vec<String>,
    pub native_currency: NativeCurrency,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Stateless wrapper around one provider.
///
/// Every method is a direct proxy to the corresponding JSON-RPC method. Quantities are decoded
/// from hex into [`U256`], provider errors are passed through untouched and nothing is retried.
#[derive(Clone)]
pub struct EthRpc {
    provider: ProviderHandle,
}

impl fmt::Debug for EthRpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthRpc").finish_non_exhaustive()
    }
}

impl EthRpc {
    pub fn new(provider: ProviderHandle) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &ProviderHandle {
        &self.provider
    }

    async fn raw(&self, method: &'static str, params: Vec<Value>) -> Result<Value, RpcError> {
        trace!(target: "wallets::rpc", method, "sending request");
        Ok(self.provider.request(method, params).await?)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Vec<Value>,
    ) -> Result<T, RpcError> {
        let value = self.raw(method, params).await?;
        serde_json::from_value(value).map_err(|err| RpcError::invalid_response(method, err))
    }

    async fn quantity(&self, method: &'static str, params: Vec<Value>) -> Result<U256, RpcError> {
        let value = self.raw(method, params).await?;
        parse_quantity(&value).map_err(|reason| RpcError::invalid_response(method, reason))
    }

    /// `eth_requestAccounts`, prompts the user for account access (EIP-1102).
    pub async fn request_accounts(&self) -> Result<Vec<Address>, RpcError> {
        self.call("eth_requestAccounts", vec![]).await
    }

    /// `eth_accounts`, the accounts already exposed to this origin. Never prompts.
    pub async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
        self.call("eth_accounts", vec![]).await
    }

    /// `eth_chainId`
    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let value = self.raw("eth_chainId", vec![]).await?;
        parse_chain_id(&value).map_err(|reason| RpcError::invalid_response("eth_chainId", reason))
    }

    /// `net_version`
    pub async fn net_version(&self) -> Result<String, RpcError> {
        self.call("net_version", vec![]).await
    }

    /// `eth_getBalance`
    pub async fn balance(&self, address: Address, block: BlockNumberOrTag) -> Result<U256, RpcError> {
        self.quantity("eth_getBalance", vec![json!(address), json!(block)]).await
    }

    /// `eth_getTransactionCount` at the latest block.
    pub async fn transaction_count(&self, address: Address) -> Result<U256, RpcError> {
        self.quantity("eth_getTransactionCount", vec![json!(address), json!(BlockNumberOrTag::Latest)])
            .await
    }

    /// `eth_estimateGas`
    pub async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256, RpcError> {
        self.quantity("eth_estimateGas", vec![to_param("eth_estimateGas", tx)?]).await
    }

    /// `eth_gasPrice`
    pub async fn gas_price(&self) -> Result<U256, RpcError> {
        self.quantity("eth_gasPrice", vec![]).await
    }

    /// `eth_sendTransaction`, the wallet signs and broadcasts.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, RpcError> {
        self.call("eth_sendTransaction", vec![to_param("eth_sendTransaction", tx)?]).await
    }

    /// `personal_sign`, the message is sent hex encoded.
    pub async fn personal_sign(&self, address: Address, message: &[u8]) -> Result<Bytes, RpcError> {
        self.call("personal_sign", vec![json!(hex::encode_prefixed(message)), json!(address)]).await
    }

    /// `eth_signTypedData_v4`, the typed data is sent as a JSON string (EIP-712).
    pub async fn sign_typed_data_v4(
        &self,
        address: Address,
        typed_data: &TypedData,
    ) -> Result<Bytes, RpcError> {
        let payload = serde_json::to_string(typed_data)
            .map_err(|err| RpcError::invalid_response("eth_signTypedData_v4", err))?;
        self.call("eth_signTypedData_v4", vec![json!(address), json!(payload)]).await
    }

    /// `wallet_switchEthereumChain` (EIP-3326).
    pub async fn switch_chain(&self, hex_chain_id: &str) -> Result<(), RpcError> {
        self.raw("wallet_switchEthereumChain", vec![json!({ "chainId": hex_chain_id })]).await?;
        Ok(())
    }

    /// `wallet_addEthereumChain` (EIP-3085).
    pub async fn add_chain(&self, params: &AddChainParams) -> Result<(), RpcError> {
        self.raw("wallet_addEthereumChain", vec![to_param("wallet_addEthereumChain", params)?])
            .await?;
        Ok(())
    }
}

fn to_param<T: Serialize>(method: &'static str, value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|err| RpcError::invalid_response(method, err))
}

/// Decodes a hex quantity (`"0x1bc16d674ec80000"`) into a [`U256`].
///
/// `"0x"` is accepted as zero, some wallets return it for empty accounts.
pub fn parse_quantity(value: &Value) -> Result<U256, String> {
    let s = value.as_str().ok_or_else(|| format!("expected hex string, got {value}"))?;
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| format!("missing 0x prefix: {s:?}"))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16).map_err(|err| format!("{s:?}: {err}"))
}

/// Decodes a chain id, accepting both the standard hex string and the plain numbers some
/// wallets still emit.
pub fn parse_chain_id(value: &Value) -> Result<u64, String> {
    if let Some(id) = value.as_u64() {
        return Ok(id);
    }
    let id = parse_quantity(value)?;
    u64::try_from(id).map_err(|_| format!("chain id out of range: {id}"))
}
