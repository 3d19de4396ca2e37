//! The EIP-1193 provider capability handed out by wallet extensions.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Shared handle to a wallet provider.
pub type ProviderHandle = Arc<dyn Eip1193Provider>;

/// Callback invoked by a provider when it emits an event.
pub type EventHandler = Arc<dyn Fn(ProviderEvent) + Send + Sync>;

/// An [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193) provider.
///
/// Implementations bridge to whatever the environment injects (a browser extension object, a
/// remote signer, a test double). The connection manager never constructs providers itself, it
/// only receives them from wallet discovery.
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// Sends a request with positional parameters and returns the raw JSON result.
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError>;

    /// Subscribes `handler` to `event`.
    ///
    /// Not every wallet exposes an event surface, the default reports the capability as
    /// unsupported.
    fn on(
        &self,
        event: ProviderEventKind,
        _handler: EventHandler,
    ) -> Result<ListenerId, ProviderError> {
        Err(ProviderError::unsupported_method(format_args!("on({event})")))
    }

    /// Removes a listener previously registered with [`Eip1193Provider::on`].
    fn remove_listener(
        &self,
        event: ProviderEventKind,
        _id: ListenerId,
    ) -> Result<(), ProviderError> {
        Err(ProviderError::unsupported_method(format_args!("removeListener({event})")))
    }

    /// Wallet specific markers (`isMetaMask` and friends).
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }
}

/// Identifies a registered event listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Provider events the connection manager listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
    Disconnect,
}

impl ProviderEventKind {
    pub const ALL: [Self; 3] = [Self::AccountsChanged, Self::ChainChanged, Self::Disconnect];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccountsChanged => "accountsChanged",
            Self::ChainChanged => "chainChanged",
            Self::Disconnect => "disconnect",
        }
    }
}

impl fmt::Display for ProviderEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event emitted by a provider, with its raw payload.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderEvent {
    /// The exposed accounts changed, first entry is the wallet's selected account.
    AccountsChanged(Vec<String>),
    /// The wallet switched chains, carries the hex chain id.
    ChainChanged(String),
    /// The provider lost its connection to all chains.
    Disconnect(Option<ProviderError>),
}

impl ProviderEvent {
    pub const fn kind(&self) -> ProviderEventKind {
        match self {
            Self::AccountsChanged(_) => ProviderEventKind::AccountsChanged,
            Self::ChainChanged(_) => ProviderEventKind::ChainChanged,
            Self::Disconnect(_) => ProviderEventKind::Disconnect,
        }
    }
}

/// Optional wallet markers.
///
/// Modelled as named flags plus an open map so new wallets need no code changes here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCapabilities {
    #[serde(default)]
    pub is_meta_mask: bool,
    #[serde(default)]
    pub is_trust: bool,
    #[serde(default, rename = "isOKExWallet")]
    pub is_okex_wallet: bool,
    #[serde(default)]
    pub is_bit_keep: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProviderCapabilities {
    /// Looks up a boolean marker, checking the named flags first.
    pub fn flag(&self, name: &str) -> bool {
        match name {
            "isMetaMask" => self.is_meta_mask,
            "isTrust" => self.is_trust,
            "isOKExWallet" => self.is_okex_wallet,
            "isBitKeep" => self.is_bit_keep,
            _ => self.extra.get(name).and_then(Value::as_bool).unwrap_or_default(),
        }
    }
}
