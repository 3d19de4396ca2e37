//! A scriptable EIP-1193 provider.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use escrow_wallets::{
    Eip1193Provider, EventHandler, ListenerId, ProviderCapabilities, ProviderError, ProviderEvent,
    ProviderEventKind,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::{
    collections::{HashMap, VecDeque},
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};
use tokio::sync::oneshot;

type Response = Result<Value, ProviderError>;

/// A recorded request.
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub method: String,
    pub params: Vec<Value>,
}

/// Provider answering requests from scripted responses.
///
/// One-shot responses queued with [`MockProvider::respond_once`] win over the sticky ones set with
/// [`MockProvider::respond`] and [`MockProvider::fail`]. Unscripted methods fail with
/// `UnsupportedMethod`.
#[derive(Default)]
pub struct MockProvider {
    queued: Mutex<HashMap<String, VecDeque<Response>>>,
    sticky: Mutex<HashMap<String, Response>>,
    held: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    calls: Mutex<Vec<Call>>,
    listeners: Mutex<Vec<(ListenerId, ProviderEventKind, EventHandler)>>,
    next_listener: AtomicU64,
    no_events: AtomicBool,
    capabilities: Mutex<ProviderCapabilities>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider").field("calls", &*self.calls.lock()).finish_non_exhaustive()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// An unlocked wallet exposing `accounts` on `chain_id`, every account holding 1 ether.
    pub fn wallet(accounts: &[Address], chain_id: u64) -> Self {
        let provider = Self::new();
        provider.respond("eth_requestAccounts", json!(accounts));
        provider.respond("eth_accounts", json!(accounts));
        provider.respond("eth_chainId", json!(format!("{chain_id:#x}")));
        provider.respond("eth_getBalance", json!(U256::from(1_000_000_000_000_000_000u128)));
        provider
    }

    /// Makes `on` fail like wallets without an event surface.
    pub fn without_events(self) -> Self {
        self.no_events.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_capabilities(self, capabilities: ProviderCapabilities) -> Self {
        *self.capabilities.lock() = capabilities;
        self
    }

    /// Answers every `method` request with `value`.
    pub fn respond(&self, method: &str, value: Value) {
        self.sticky.lock().insert(method.to_string(), Ok(value));
    }

    /// Fails every `method` request with `err`.
    pub fn fail(&self, method: &str, err: ProviderError) {
        self.sticky.lock().insert(method.to_string(), Err(err));
    }

    /// Answers the next `method` request with `response`.
    pub fn respond_once(&self, method: &str, response: Response) {
        self.queued.lock().entry(method.to_string()).or_default().push_back(response);
    }

    /// Keeps the next `method` request pending until the returned sender fires or is dropped.
    ///
    /// The request is recorded as soon as it arrives, so [`MockProvider::call_count`] tells when
    /// it is in flight.
    pub fn hold(&self, method: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.held.lock().insert(method.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Methods requested so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().iter().map(|call| call.method.clone()).collect()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|call| call.method == method).count()
    }

    pub fn last_call(&self, method: &str) -> Option<Call> {
        self.calls.lock().iter().rev().find(|call| call.method == method).cloned()
    }

    pub fn listener_count(&self, kind: ProviderEventKind) -> usize {
        self.listeners.lock().iter().filter(|(_, k, _)| *k == kind).count()
    }

    /// Delivers `event` to its listeners. Returns how many were called.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<_> = self
            .listeners
            .lock()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        trace!(%kind, listeners = handlers.len(), "emitting event");
        for handler in &handlers {
            handler(event.clone());
        }
        handlers.len()
    }
}

#[async_trait]
impl Eip1193Provider for MockProvider {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError> {
        self.calls.lock().push(Call { method: method.to_string(), params });

        let held = self.held.lock().remove(method);
        if let Some(release) = held {
            trace!(method, "holding request");
            let _ = release.await;
        }

        if let Some(response) = self.queued.lock().get_mut(method).and_then(VecDeque::pop_front) {
            return response;
        }
        self.sticky
            .lock()
            .get(method)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::unsupported_method(method)))
    }

    fn on(&self, event: ProviderEventKind, handler: EventHandler) -> Result<ListenerId, ProviderError> {
        if self.no_events.load(Ordering::SeqCst) {
            return Err(ProviderError::unsupported_method(format_args!("on({event})")));
        }
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().push((id, event, handler));
        Ok(id)
    }

    fn remove_listener(&self, event: ProviderEventKind, id: ListenerId) -> Result<(), ProviderError> {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(lid, kind, _)| !(*lid == id && *kind == event));
        if listeners.len() == before {
            return Err(ProviderError::internal_error_with(format!("unknown listener {}", id.0)));
        }
        Ok(())
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.capabilities.lock().clone()
    }
}
