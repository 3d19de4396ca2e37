//! Wallet, provider and RPC error types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{borrow::Cow, fmt};

/// An error reported by a wallet provider, passed through unmodified.
///
/// See <https://eips.ethereum.org/EIPS/eip-1193#provider-errors>
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub code: ErrorCode,
    /// error message
    pub message: Cow<'static, str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ProviderError {
    /// New [`ProviderError`] with the given [`ErrorCode`] and its default message.
    pub const fn new(code: ErrorCode) -> Self {
        Self { message: Cow::Borrowed(code.message()), code, data: None }
    }

    /// New [`ProviderError`] with an explicit message.
    pub fn with_message<M>(code: impl Into<ErrorCode>, message: M) -> Self
    where
        M: Into<String>,
    {
        Self { code: code.into(), message: message.into().into(), data: None }
    }

    /// Creates a new `UserRejectedRequest` error.
    pub const fn user_rejected() -> Self {
        Self::new(ErrorCode::UserRejectedRequest)
    }

    /// Creates a new `UnsupportedMethod` error for the given method or capability.
    pub fn unsupported_method<M>(method: M) -> Self
    where
        M: fmt::Display,
    {
        Self::with_message(ErrorCode::UnsupportedMethod, format!("unsupported method: {method}"))
    }

    /// Creates a new `UnrecognizedChain` error.
    pub fn unrecognized_chain<M>(message: M) -> Self
    where
        M: Into<String>,
    {
        Self::with_message(ErrorCode::UnrecognizedChain, message)
    }

    /// Creates a new `InternalError` error with a message.
    pub fn internal_error_with<M>(message: M) -> Self
    where
        M: Into<String>,
    {
        Self::with_message(ErrorCode::InternalError, message)
    }

    /// Whether the user dismissed the wallet prompt.
    pub fn is_user_rejected(&self) -> bool {
        self.code == ErrorCode::UserRejectedRequest
    }

    /// Whether the wallet does not know the requested chain and it must be added first.
    ///
    /// Some wallets report this with a generic code, so the message is checked as well.
    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == ErrorCode::UnrecognizedChain ||
            self.message.to_ascii_lowercase().contains("unrecognized chain")
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code.message(), self.code.code(), self.message)
    }
}

impl std::error::Error for ProviderError {}

/// EIP-1193 provider error codes and the JSON-RPC codes wallets forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The user rejected the request.
    UserRejectedRequest,
    /// The requested method and/or account has not been authorized by the user.
    Unauthorized,
    /// The provider does not support the requested method.
    UnsupportedMethod,
    /// The provider is disconnected from all chains.
    Disconnected,
    /// The provider is not connected to the requested chain.
    ChainDisconnected,
    /// The chain has not been added to the wallet, see EIP-3085.
    UnrecognizedChain,
    /// invalid method parameter.
    InvalidParams,
    /// internal call error
    InternalError,
    /// Any other code.
    Other(i64),
}

impl ErrorCode {
    /// Returns the error code as `i64`
    pub const fn code(&self) -> i64 {
        match *self {
            Self::UserRejectedRequest => 4001,
            Self::Unauthorized => 4100,
            Self::UnsupportedMethod => 4200,
            Self::Disconnected => 4900,
            Self::ChainDisconnected => 4901,
            Self::UnrecognizedChain => 4902,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::Other(c) => c,
        }
    }

    /// Returns the message associated with the error
    pub const fn message(&self) -> &'static str {
        match *self {
            Self::UserRejectedRequest => "User rejected request",
            Self::Unauthorized => "Unauthorized",
            Self::UnsupportedMethod => "Unsupported method",
            Self::Disconnected => "Disconnected",
            Self::ChainDisconnected => "Chain disconnected",
            Self::UnrecognizedChain => "Unrecognized chain",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::Other(_) => "Provider error",
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.code())
    }
}

impl<'a> Deserialize<'a> for ErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'a>,
    {
        i64::deserialize(deserializer).map(Into::into)
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        match code {
            4001 => Self::UserRejectedRequest,
            4100 => Self::Unauthorized,
            4200 => Self::UnsupportedMethod,
            4900 => Self::Disconnected,
            4901 => Self::ChainDisconnected,
            4902 => Self::UnrecognizedChain,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            _ => Self::Other(code),
        }
    }
}

/// Errors returned by [`EthRpc`](crate::EthRpc).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RpcError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("invalid response to `{method}`: {reason}")]
    InvalidResponse { method: &'static str, reason: String },
}

impl RpcError {
    pub(crate) fn invalid_response(method: &'static str, reason: impl fmt::Display) -> Self {
        Self::InvalidResponse { method, reason: reason.to_string() }
    }

    /// Returns the provider error if this error came from the wallet.
    pub fn as_provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::Provider(err) => Some(err),
            Self::InvalidResponse { .. } => None,
        }
    }
}

/// Errors surfaced by the [`ConnectionManager`](crate::ConnectionManager).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet {0} not found. Please ensure it's installed.")]
    WalletNotFound(String),
    #[error(
        "No EIP-6963 wallet found. Please install a modern wallet like MetaMask, Trust Wallet, or Coinbase Wallet."
    )]
    NoWalletAvailable,
    #[error("User rejected wallet connection")]
    UserRejected,
    #[error("Failed to connect to wallet. Please ensure it is unlocked and try again.")]
    ConnectionFailed,
    #[error("Wallet not connected")]
    NotConnected,
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(u64),
    #[error("Failed to switch to chain {chain_id}: {source}")]
    ChainSwitchFailed {
        chain_id: u64,
        #[source]
        source: RpcError,
    },
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("invalid response to `{method}`: {reason}")]
    InvalidResponse { method: &'static str, reason: String },
}

impl From<RpcError> for WalletError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Provider(err) => Self::Provider(err),
            RpcError::InvalidResponse { method, reason } => Self::InvalidResponse { method, reason },
        }
    }
}

/// Errors of a [`DiscoveryChannel`](crate::DiscoveryChannel).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    #[error("discovery channel is closed")]
    Closed,
    #[error("failed to dispatch `{event}`: {reason}")]
    Dispatch { event: &'static str, reason: String },
}

/// Errors of a [`SessionStore`](crate::SessionStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access session store at {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed session store contents: {0}")]
    Json(#[from] serde_json::Error),
}

/// Represents a failed attempt to extract a [`WalletConfig`](crate::WalletConfig).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("failed to extract wallet config: {0}")]
pub struct ConfigError(#[from] pub figment::Error);
