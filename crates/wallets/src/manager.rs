//! The multi-account connection manager.
//!
//! Owns the connected accounts of every wallet the user connected, the active account pointer and
//! the persisted session, and keeps them in sync with the events providers emit after connecting.

use crate::{
    chains::{self, ChainConfig},
    config::WalletConfig,
    discovery::{WalletInfo, WalletRegistry},
    error::{RpcError, WalletError},
    provider::{
        EventHandler, ListenerId, ProviderCapabilities, ProviderEvent, ProviderEventKind,
        ProviderHandle,
    },
    rpc::{self, EthRpc},
    session::{ConnectedAccount, PersistedSession},
    store::SessionStore,
    tx,
};
use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_rpc_types_eth::{BlockNumberOrTag, TransactionRequest};
use parking_lot::Mutex;
use serde_json::Value;
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Weak},
};

/// Coarse connection state as shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Manages the connected accounts across wallets.
///
/// Cheap to clone, all clones share the same state. The externally visible single-account view
/// (`address`, `chain_id`, `balance`, `provider`) is always derived from the active entry.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    registry: WalletRegistry,
    store: Arc<dyn SessionStore>,
    config: WalletConfig,
    state: Mutex<ManagerState>,
}

#[derive(Default)]
struct ManagerState {
    accounts: Vec<ConnectedAccount>,
    active_index: usize,
    is_connecting: bool,
    error: Option<String>,
    /// Attached event listeners, keyed by wallet id.
    listeners: HashMap<String, ListenerSet>,
}

/// The listeners registered on one provider.
struct ListenerSet {
    provider: ProviderHandle,
    ids: Vec<(ProviderEventKind, ListenerId)>,
}

impl ManagerState {
    fn position(&self, address: Address) -> Option<usize> {
        self.accounts.iter().position(|account| account.address == address)
    }

    fn active(&self) -> Option<&ConnectedAccount> {
        self.accounts.get(self.active_index)
    }

    fn has_provider(&self, provider_id: &str) -> bool {
        self.accounts.iter().any(|account| account.provider_id == provider_id)
    }

    /// Points the active view at `index` and stamps the entry. No-op when out of range.
    fn activate(&mut self, index: usize) -> bool {
        let Some(account) = self.accounts.get_mut(index) else { return false };
        account.last_activated_at = chrono::Utc::now();
        self.active_index = index;
        true
    }

    fn session(&self) -> PersistedSession {
        PersistedSession {
            accounts: self.accounts.iter().map(ConnectedAccount::to_persisted).collect(),
            active_index: self.active_index,
        }
    }

    /// Clears everything and hands back the listeners that must be detached.
    fn reset(&mut self) -> Vec<ListenerSet> {
        self.accounts.clear();
        self.active_index = 0;
        self.error = None;
        self.listeners.drain().map(|(_, set)| set).collect()
    }
}

impl ManagerInner {
    fn persist(&self, state: &ManagerState) {
        if let Err(err) = state.session().save(&*self.store, &self.config) {
            warn!(target: "wallets::manager", %err, "failed to persist session");
        }
    }

    fn clear_persisted(&self) {
        if let Err(err) = PersistedSession::clear(&*self.store, &self.config) {
            warn!(target: "wallets::manager", %err, "failed to clear persisted session");
        }
    }

    fn disconnect(&self) {
        let detached = {
            let mut state = self.state.lock();
            let detached = state.reset();
            self.clear_persisted();
            detached
        };
        debug!(target: "wallets::manager", "disconnected all accounts");
        detach_all(detached);
    }

    /// Registers the drift listeners on `provider` unless they are already attached.
    ///
    /// Registration happens outside the state lock, providers may call back synchronously.
    fn attach_listeners(self: &Arc<Self>, wallet_id: &str, provider: &ProviderHandle) {
        {
            let mut state = self.state.lock();
            if state.listeners.contains_key(wallet_id) || !state.has_provider(wallet_id) {
                return;
            }
            state
                .listeners
                .insert(wallet_id.to_string(), ListenerSet { provider: provider.clone(), ids: Vec::new() });
        }

        let weak = Arc::downgrade(self);
        let mut ids = Vec::with_capacity(ProviderEventKind::ALL.len());
        for kind in ProviderEventKind::ALL {
            match provider.on(kind, event_handler(weak.clone(), wallet_id)) {
                Ok(id) => ids.push((kind, id)),
                Err(err) => {
                    warn!(target: "wallets::manager", wallet = %wallet_id, event = %kind, %err, "failed to attach listener");
                }
            }
        }

        let mut state = self.state.lock();
        if let Some(set) = state.listeners.get_mut(wallet_id) {
            debug!(target: "wallets::manager", wallet = %wallet_id, listeners = ids.len(), "attached event listeners");
            set.ids = ids;
            return;
        }
        // disconnected while registering
        drop(state);
        detach_all(vec![ListenerSet { provider: provider.clone(), ids }]);
    }

    fn handle_event(self: &Arc<Self>, wallet_id: &str, event: ProviderEvent) {
        if !self.state.lock().listeners.contains_key(wallet_id) {
            trace!(target: "wallets::manager", wallet = %wallet_id, event = %event.kind(), "ignoring event of detached provider");
            return;
        }
        debug!(target: "wallets::manager", wallet = %wallet_id, ?event, "provider event");
        match event {
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => self.disconnect(),
            ProviderEvent::AccountsChanged(accounts) => self.on_accounts_changed(wallet_id, &accounts),
            ProviderEvent::ChainChanged(chain_id) => self.on_chain_changed(wallet_id, chain_id),
            ProviderEvent::Disconnect(_) => self.disconnect(),
        }
    }

    /// Follows the wallet's selected account if the active entry belongs to this wallet and the
    /// wallet still exposes it.
    fn on_accounts_changed(self: &Arc<Self>, wallet_id: &str, accounts: &[String]) {
        let accounts: Vec<Address> = accounts
            .iter()
            .filter_map(|raw| match raw.parse() {
                Ok(address) => Some(address),
                Err(err) => {
                    warn!(target: "wallets::manager", wallet = %wallet_id, %raw, %err, "ignoring invalid address");
                    None
                }
            })
            .collect();
        let Some(&selected) = accounts.first() else { return };

        {
            let mut state = self.state.lock();
            let Some(active) = state.active() else { return };
            if active.provider_id != wallet_id ||
                !accounts.contains(&active.address) ||
                active.address == selected
            {
                return;
            }

            debug!(target: "wallets::manager", from = %active.address, to = %selected, "active account changed");
            match state.position(selected) {
                Some(index) => {
                    state.activate(index);
                }
                None => {
                    let index = state.active_index;
                    let account = &mut state.accounts[index];
                    account.address = selected;
                    account.balance = None;
                }
            }
            self.persist(&state);
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let manager = ConnectionManager { inner: self.clone() };
                handle.spawn(async move {
                    manager.refresh_balance().await;
                });
            }
            Err(_) => debug!(target: "wallets::manager", "no async runtime, skipping balance refresh"),
        }
    }

    fn on_chain_changed(&self, wallet_id: &str, chain_id: String) {
        let chain_id = match rpc::parse_chain_id(&Value::String(chain_id)) {
            Ok(chain_id) => chain_id,
            Err(err) => {
                warn!(target: "wallets::manager", wallet = %wallet_id, %err, "ignoring invalid chain id");
                return;
            }
        };

        let mut state = self.state.lock();
        let mut changed = false;
        for account in state.accounts.iter_mut().filter(|account| account.provider_id == wallet_id) {
            account.chain_id = chain_id;
            changed = true;
        }
        if changed {
            debug!(target: "wallets::manager", wallet = %wallet_id, chain_id, "chain changed");
            self.persist(&state);
        }
    }
}

fn event_handler(manager: Weak<ManagerInner>, wallet_id: &str) -> EventHandler {
    let wallet_id = wallet_id.to_string();
    Arc::new(move |event| {
        if let Some(inner) = manager.upgrade() {
            inner.handle_event(&wallet_id, event);
        }
    })
}

fn detach_all(sets: Vec<ListenerSet>) {
    for set in sets {
        for (kind, id) in set.ids {
            if let Err(err) = set.provider.remove_listener(kind, id) {
                debug!(target: "wallets::manager", event = %kind, %err, "failed to remove listener");
            }
        }
    }
}

/// Clears `is_connecting` when the connect attempt ends, however it ends.
struct ConnectingGuard<'a>(&'a ManagerInner);

impl<'a> ConnectingGuard<'a> {
    fn new(inner: &'a ManagerInner) -> Self {
        let mut state = inner.state.lock();
        state.is_connecting = true;
        state.error = None;
        Self(inner)
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.state.lock().is_connecting = false;
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ConnectionManager")
            .field("accounts", &state.accounts)
            .field("active_index", &state.active_index)
            .field("is_connecting", &state.is_connecting)
            .field("error", &state.error)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    pub fn new(registry: WalletRegistry, store: Arc<dyn SessionStore>, config: WalletConfig) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                registry,
                store,
                config,
                state: Mutex::new(ManagerState::default()),
            }),
        }
    }

    pub fn registry(&self) -> &WalletRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &WalletConfig {
        &self.inner.config
    }

    // --- accessors ---

    /// All connected accounts in connection order.
    pub fn accounts(&self) -> Vec<ConnectedAccount> {
        self.inner.state.lock().accounts.clone()
    }

    pub fn active_index(&self) -> usize {
        self.inner.state.lock().active_index
    }

    pub fn active_account(&self) -> Option<ConnectedAccount> {
        self.inner.state.lock().active().cloned()
    }

    /// Address of the active account.
    pub fn address(&self) -> Option<Address> {
        self.inner.state.lock().active().map(|account| account.address)
    }

    /// Chain of the active account.
    pub fn chain_id(&self) -> Option<u64> {
        self.inner.state.lock().active().map(|account| account.chain_id)
    }

    /// Last known balance of the active account.
    pub fn balance(&self) -> Option<U256> {
        self.inner.state.lock().active().and_then(|account| account.balance)
    }

    /// Provider of the active account.
    pub fn provider(&self) -> Option<ProviderHandle> {
        self.inner.state.lock().active().map(|account| account.provider.clone())
    }

    /// Wallet id of the active account.
    pub fn selected_wallet_id(&self) -> Option<String> {
        self.inner.state.lock().active().map(|account| account.provider_id.clone())
    }

    /// Wallet markers of the active account's provider, e.g. to pick wallet specific UI.
    pub fn capabilities(&self) -> Option<ProviderCapabilities> {
        self.provider().map(|provider| provider.capabilities())
    }

    pub fn is_connected(&self) -> bool {
        !self.inner.state.lock().accounts.is_empty()
    }

    pub fn is_connecting(&self) -> bool {
        self.inner.state.lock().is_connecting
    }

    /// Message of the last failed operation, cleared by a new connect attempt or a disconnect.
    pub fn last_error(&self) -> Option<String> {
        self.inner.state.lock().error.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        let state = self.inner.state.lock();
        if state.is_connecting {
            ConnectionStatus::Connecting
        } else if state.accounts.is_empty() {
            ConnectionStatus::Disconnected
        } else {
            ConnectionStatus::Connected
        }
    }

    // --- wallets and chains ---

    /// The wallets discovered so far.
    pub fn available_wallets(&self) -> Vec<WalletInfo> {
        self.inner.registry.snapshot()
    }

    /// Starts discovery if needed and waits for it, bounded by the discovery timeout.
    pub async fn discover_wallets(&self) -> Vec<WalletInfo> {
        let registry = &self.inner.registry;
        registry.initiate_discovery();
        let wallets = registry.await_discovery(self.inner.config.discovery_timeout()).await;
        if wallets.is_empty() {
            warn!(target: "wallets::manager", "no wallets discovered");
        } else {
            debug!(target: "wallets::manager", wallets = wallets.len(), "discovered wallets");
        }
        wallets
    }

    /// Config of the active account's chain, if it is a supported one.
    pub fn chain_info(&self) -> Option<&'static ChainConfig> {
        self.chain_id().and_then(chains::chain_config)
    }

    pub fn is_chain_supported(&self, chain_id: u64) -> bool {
        chains::is_supported(chain_id)
    }

    pub fn available_chains(&self) -> &'static [ChainConfig] {
        chains::supported_chains()
    }

    // --- connection lifecycle ---

    /// Connects the wallet with id `wallet_id`, or the first discovered wallet if `None`.
    ///
    /// Every address the wallet exposes that is not connected yet is appended. On failure the
    /// accounts connected before stay untouched. Returns the addresses the wallet exposed.
    pub async fn connect(&self, wallet_id: Option<&str>) -> Result<Vec<Address>, WalletError> {
        let result = self.try_connect(wallet_id).await;
        self.record(result)
    }

    async fn try_connect(&self, wallet_id: Option<&str>) -> Result<Vec<Address>, WalletError> {
        let wallet = match wallet_id {
            Some(id) => self
                .inner
                .registry
                .lookup(id)
                .ok_or_else(|| WalletError::WalletNotFound(id.to_string()))?,
            None => self.inner.registry.default_choice().ok_or(WalletError::NoWalletAvailable)?,
        };

        let _guard = ConnectingGuard::new(&self.inner);
        debug!(
            target: "wallets::manager",
            wallet = %wallet.id,
            name = %wallet.name,
            capabilities = ?wallet.provider.capabilities(),
            "connecting"
        );
        let rpc = EthRpc::new(wallet.provider.clone());

        let addresses = match rpc.request_accounts().await {
            Ok(addresses) => addresses,
            Err(RpcError::Provider(err)) if err.is_user_rejected() => {
                return Err(WalletError::UserRejected);
            }
            Err(err) => {
                warn!(target: "wallets::manager", %err, "eth_requestAccounts failed, falling back to eth_accounts");
                rpc.accounts().await.unwrap_or_else(|err| {
                    warn!(target: "wallets::manager", %err, "eth_accounts failed");
                    Vec::new()
                })
            }
        };
        if addresses.is_empty() {
            return Err(WalletError::ConnectionFailed);
        }

        let chain_id = match rpc.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(err) => {
                let fallback = self.inner.config.default_chain_id;
                warn!(target: "wallets::manager", %err, chain_id = fallback, "failed to get chain id, using default");
                fallback
            }
        };

        for &address in &addresses {
            if self.inner.state.lock().position(address).is_some() {
                debug!(target: "wallets::manager", %address, "account already connected");
                continue;
            }

            let mut account = ConnectedAccount::new(address, chain_id, &wallet);
            match rpc.balance(address, BlockNumberOrTag::Latest).await {
                Ok(balance) => account.balance = Some(balance),
                Err(err) => warn!(target: "wallets::manager", %address, %err, "failed to get balance"),
            }

            let mut state = self.inner.state.lock();
            // another flow may have added it while the balance was in flight
            if state.position(address).is_none() {
                state.accounts.push(account);
            }
        }

        {
            let mut state = self.inner.state.lock();
            if !state.activate(0) {
                return Err(WalletError::ConnectionFailed);
            }
            self.inner.persist(&state);
        }
        debug!(target: "wallets::manager", wallet = %wallet.id, accounts = addresses.len(), chain_id, "connected");

        self.inner.attach_listeners(&wallet.id, &wallet.provider);
        Ok(addresses)
    }

    /// Drops every account, forgets the persisted session and detaches all listeners.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Removes the account at `index`. Out of range indices are ignored.
    pub fn disconnect_account(&self, index: usize) {
        let detached = {
            let mut state = self.inner.state.lock();
            if index >= state.accounts.len() {
                debug!(target: "wallets::manager", index, "no account at index");
                return;
            }

            let removed = state.accounts.remove(index);
            debug!(target: "wallets::manager", address = %removed.address, "disconnected account");
            if state.accounts.is_empty() {
                let detached = state.reset();
                self.inner.clear_persisted();
                detached
            } else {
                let next = state.active_index.min(state.accounts.len() - 1);
                state.activate(next);
                self.inner.persist(&state);
                if state.has_provider(&removed.provider_id) {
                    Vec::new()
                } else {
                    state.listeners.remove(&removed.provider_id).into_iter().collect()
                }
            }
        };
        detach_all(detached);
    }

    /// Makes the account at `index` the active one. Out of range indices are ignored.
    pub fn set_active_account(&self, index: usize) {
        let mut state = self.inner.state.lock();
        if state.activate(index) {
            self.inner.persist(&state);
        }
    }

    /// Rebuilds the accounts from the persisted session, resolving each entry's wallet through
    /// the registry. Entries whose wallet is gone are dropped.
    ///
    /// Listeners are attached after [`WalletConfig::restore_listener_delay`]. Returns the number
    /// of restored accounts.
    pub fn restore_session(&self) -> usize {
        let Some(persisted) = PersistedSession::load(&*self.inner.store, &self.inner.config) else {
            debug!(target: "wallets::manager", "no persisted session");
            return 0;
        };

        let mut restored: Vec<ConnectedAccount> = Vec::with_capacity(persisted.accounts.len());
        for entry in &persisted.accounts {
            let Some(wallet) = self.inner.registry.lookup(&entry.provider_id) else {
                debug!(target: "wallets::manager", address = %entry.address, wallet = %entry.provider_id, "wallet unavailable, dropping account");
                continue;
            };
            if restored.iter().any(|account| account.address == entry.address) {
                continue;
            }
            restored.push(ConnectedAccount::restore(entry, &wallet));
        }
        if restored.is_empty() {
            return 0;
        }

        let mut providers: Vec<(String, ProviderHandle)> = Vec::new();
        for account in &restored {
            if !providers.iter().any(|(id, _)| *id == account.provider_id) {
                providers.push((account.provider_id.clone(), account.provider.clone()));
            }
        }

        let count = restored.len();
        {
            let mut state = self.inner.state.lock();
            if !state.accounts.is_empty() {
                debug!(target: "wallets::manager", "already connected, skipping restore");
                return 0;
            }
            state.accounts = restored;
            let index = persisted.active_index.min(count - 1);
            state.activate(index);
            self.inner.persist(&state);
        }
        debug!(target: "wallets::manager", accounts = count, "restored session");

        let inner = self.inner.clone();
        let delay = self.inner.config.restore_listener_delay();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    for (id, provider) in &providers {
                        inner.attach_listeners(id, provider);
                    }
                });
            }
            Err(_) => {
                for (id, provider) in &providers {
                    inner.attach_listeners(id, provider);
                }
            }
        }
        count
    }

    // --- chain ---

    /// Switches the active account's wallet to `chain_id`, adding the chain to the wallet first if
    /// it does not know it.
    pub async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let result = self.try_switch_chain(chain_id).await;
        self.record(result)
    }

    async fn try_switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let account = self.require_active()?;
        let chain = chains::chain_config(chain_id).ok_or(WalletError::UnsupportedChain(chain_id))?;
        let rpc = EthRpc::new(account.provider.clone());

        let switched = match rpc.switch_chain(chain.hex_id).await {
            Err(RpcError::Provider(err)) if err.is_unrecognized_chain() => {
                debug!(target: "wallets::manager", chain_id, "chain unknown to wallet, adding it");
                match rpc.add_chain(&chain.add_chain_params()).await {
                    Ok(()) => rpc.switch_chain(chain.hex_id).await,
                    Err(err) => Err(err),
                }
            }
            res => res,
        };
        switched.map_err(|source| WalletError::ChainSwitchFailed { chain_id, source })?;

        let mut state = self.inner.state.lock();
        if let Some(index) = state.position(account.address) {
            state.accounts[index].chain_id = chain_id;
            self.inner.persist(&state);
        }
        debug!(target: "wallets::manager", chain_id, "switched chain");
        Ok(())
    }

    // --- operations on the active account ---

    /// Re-fetches the active account's balance. Failures are logged.
    pub async fn refresh_balance(&self) -> Option<U256> {
        let account = self.active_account()?;
        match EthRpc::new(account.provider.clone()).balance(account.address, BlockNumberOrTag::Latest).await {
            Ok(balance) => {
                let mut state = self.inner.state.lock();
                if let Some(index) = state.position(account.address) {
                    state.accounts[index].balance = Some(balance);
                }
                Some(balance)
            }
            Err(err) => {
                warn!(target: "wallets::manager", address = %account.address, %err, "failed to refresh balance");
                None
            }
        }
    }

    /// Sends `tx` from the active account. The gas limit is estimated when not set.
    pub async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, WalletError> {
        let result = self.try_send_transaction(tx).await;
        self.record(result)
    }

    async fn try_send_transaction(&self, mut tx: TransactionRequest) -> Result<TxHash, WalletError> {
        let (account, rpc) = self.active_rpc()?;
        tx.from = Some(account.address);
        if tx.gas.is_none() {
            let estimate = rpc.estimate_gas(&tx).await?;
            let gas = u64::try_from(estimate).map_err(|_| WalletError::InvalidResponse {
                method: "eth_estimateGas",
                reason: format!("gas estimate out of range: {estimate}"),
            })?;
            tx.gas = Some(gas);
        }
        let hash = rpc.send_transaction(&tx).await?;
        debug!(target: "wallets::manager", %hash, "sent transaction");
        Ok(hash)
    }

    /// Sends an ERC-20 `approve(spender, amount)` on `token`.
    pub async fn approve_token(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, WalletError> {
        self.send_transaction(tx::approve(token, spender, amount)).await
    }

    /// Sends an ERC-20 `transfer(to, amount)` on `token`.
    pub async fn transfer_token(
        &self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<TxHash, WalletError> {
        self.send_transaction(tx::transfer(token, to, amount)).await
    }

    /// Estimates the gas of `tx` sent from the active account.
    pub async fn estimate_gas(&self, mut tx: TransactionRequest) -> Result<U256, WalletError> {
        let result = async {
            let (account, rpc) = self.active_rpc()?;
            tx.from.get_or_insert(account.address);
            Ok::<_, WalletError>(rpc.estimate_gas(&tx).await?)
        }
        .await;
        self.record(result)
    }

    /// `personal_sign` with the active account.
    pub async fn sign_message(&self, message: impl AsRef<[u8]>) -> Result<Bytes, WalletError> {
        let result = async {
            let (account, rpc) = self.active_rpc()?;
            Ok::<_, WalletError>(rpc.personal_sign(account.address, message.as_ref()).await?)
        }
        .await;
        self.record(result)
    }

    /// EIP-712 signature of `typed_data` with the active account.
    pub async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Bytes, WalletError> {
        let result = async {
            let (account, rpc) = self.active_rpc()?;
            Ok::<_, WalletError>(rpc.sign_typed_data_v4(account.address, typed_data).await?)
        }
        .await;
        self.record(result)
    }

    /// Transaction count of the active account.
    pub async fn get_nonce(&self) -> Result<U256, WalletError> {
        let result = async {
            let (account, rpc) = self.active_rpc()?;
            Ok::<_, WalletError>(rpc.transaction_count(account.address).await?)
        }
        .await;
        self.record(result)
    }

    pub async fn get_gas_price(&self) -> Result<U256, WalletError> {
        let result = async {
            let (_, rpc) = self.active_rpc()?;
            Ok::<_, WalletError>(rpc.gas_price().await?)
        }
        .await;
        self.record(result)
    }

    fn require_active(&self) -> Result<ConnectedAccount, WalletError> {
        self.active_account().ok_or(WalletError::NotConnected)
    }

    fn active_rpc(&self) -> Result<(ConnectedAccount, EthRpc), WalletError> {
        let account = self.require_active()?;
        let rpc = EthRpc::new(account.provider.clone());
        Ok((account, rpc))
    }

    /// Stores the message of a failed operation as the last error.
    fn record<T>(&self, result: Result<T, WalletError>) -> Result<T, WalletError> {
        if let Err(err) = &result {
            debug!(target: "wallets::manager", %err, "operation failed");
            self.inner.state.lock().error = Some(err.to_string());
        }
        result
    }
}
