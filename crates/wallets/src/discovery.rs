//! [EIP-6963](https://eips.ethereum.org/EIPS/eip-6963) multi-wallet discovery.
//!
//! Wallet extensions answer an `eip6963:requestProvider` broadcast with one
//! `eip6963:announceProvider` event each. The [`WalletRegistry`] collects those announcements and
//! is the only source of providers: it never falls back to a shared injected provider, so two
//! extensions fighting over the same global binding cannot leak into the application.

use crate::{config::WalletConfig, error::DiscoveryError, provider::ProviderHandle};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::time::Instant;

/// Metadata part of an announcement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    /// Data URI of the wallet icon.
    #[serde(default)]
    pub icon: String,
    /// Reverse DNS identifier, e.g. `io.metamask`.
    #[serde(default)]
    pub rdns: String,
}

/// Raw `eip6963:announceProvider` payload as delivered by the environment.
///
/// Both parts are optional because announcements are untrusted input.
#[derive(Clone, Default)]
pub struct ProviderAnnouncement {
    pub info: Option<ProviderInfo>,
    pub provider: Option<ProviderHandle>,
}

impl ProviderAnnouncement {
    pub fn new(info: ProviderInfo, provider: ProviderHandle) -> Self {
        Self { info: Some(info), provider: Some(provider) }
    }
}

impl fmt::Debug for ProviderAnnouncement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderAnnouncement")
            .field("info", &self.info)
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

/// A discovered wallet.
#[derive(Clone)]
pub struct WalletInfo {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub rdns: String,
    pub provider: ProviderHandle,
}

impl fmt::Debug for WalletInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("rdns", &self.rdns)
            .finish_non_exhaustive()
    }
}

impl TryFrom<ProviderAnnouncement> for WalletInfo {
    type Error = ProviderAnnouncement;

    fn try_from(announcement: ProviderAnnouncement) -> Result<Self, Self::Error> {
        match announcement {
            ProviderAnnouncement { info: Some(info), provider: Some(provider) }
                if !info.uuid.is_empty() =>
            {
                Ok(Self { id: info.uuid, name: info.name, icon: info.icon, rdns: info.rdns, provider })
            }
            malformed => Err(malformed),
        }
    }
}

/// Callback receiving raw announcements from the environment.
pub type AnnouncementHandler = Box<dyn Fn(ProviderAnnouncement) + Send + Sync>;

/// The broadcast bus the discovery exchange runs over, e.g. `window` events in a browser.
pub trait DiscoveryChannel: Send + Sync {
    /// Registers the process-wide `eip6963:announceProvider` listener.
    fn on_announce(&self, handler: AnnouncementHandler) -> Result<(), DiscoveryError>;

    /// Dispatches `eip6963:requestProvider`.
    fn request_providers(&self) -> Result<(), DiscoveryError>;
}

type SnapshotListener = Arc<dyn Fn(&[WalletInfo]) + Send + Sync>;

/// Collects announced wallets and notifies subscribers of every change.
///
/// Cheap to clone, all clones share the same registry.
#[derive(Clone)]
pub struct WalletRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    channel: Arc<dyn DiscoveryChannel>,
    /// Wallets in announcement arrival order.
    wallets: RwLock<Vec<WalletInfo>>,
    listeners: Mutex<Vec<(u64, SnapshotListener)>>,
    next_listener: AtomicU64,
    started: AtomicBool,
    settled: AtomicBool,
    settle_timeout: Duration,
    poll_interval: Duration,
}

impl fmt::Debug for WalletRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRegistry")
            .field("wallets", &*self.inner.wallets.read())
            .field("settled", &self.is_settled())
            .finish_non_exhaustive()
    }
}

impl WalletRegistry {
    /// Creates an empty registry on top of `channel`. Discovery starts with
    /// [`WalletRegistry::initiate_discovery`].
    pub fn new(channel: Arc<dyn DiscoveryChannel>, config: &WalletConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                channel,
                wallets: RwLock::new(Vec::new()),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
                started: AtomicBool::new(false),
                settled: AtomicBool::new(false),
                settle_timeout: config.discovery_timeout(),
                poll_interval: config.discovery_poll_interval(),
            }),
        }
    }

    /// Creates the registry and immediately starts discovery.
    pub fn spawn(channel: Arc<dyn DiscoveryChannel>, config: &WalletConfig) -> Self {
        let registry = Self::new(channel, config);
        registry.initiate_discovery();
        registry
    }

    /// Registers the announcement listener, broadcasts the discovery request and arms the settle
    /// timer.
    ///
    /// Idempotent. Announcements keep updating the registry after the timer fired, the timer only
    /// decides when discovery counts as settled.
    pub fn initiate_discovery(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let handler: AnnouncementHandler = Box::new(move |announcement| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.handle_announcement(announcement);
            }
        });
        if let Err(err) = self.inner.channel.on_announce(handler) {
            warn!(target: "wallets::discovery", %err, "failed to register announcement listener");
        }

        debug!(target: "wallets::discovery", "dispatching wallet discovery request");
        if let Err(err) = self.inner.channel.request_providers() {
            warn!(target: "wallets::discovery", %err, "failed to dispatch discovery request");
        }

        self.arm_settle_timer();
    }

    fn arm_settle_timer(&self) {
        let weak: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        let timeout = self.inner.settle_timeout;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(timeout).await;
                    if let Some(inner) = weak.upgrade() {
                        let registry = Self { inner };
                        registry.inner.settled.store(true, Ordering::SeqCst);
                        debug!(
                            target: "wallets::discovery",
                            wallets = registry.len(),
                            "discovery timeout reached"
                        );
                        registry.notify();
                    }
                });
            }
            Err(_) => {
                warn!(target: "wallets::discovery", "no async runtime, discovery settles immediately");
                self.inner.settled.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Entry point for `eip6963:announceProvider` events.
    ///
    /// Malformed announcements are logged and dropped. A wallet announcing again under the same id
    /// replaces its previous entry.
    pub fn handle_announcement(&self, announcement: ProviderAnnouncement) {
        let wallet = match WalletInfo::try_from(announcement) {
            Ok(wallet) => wallet,
            Err(malformed) => {
                warn!(target: "wallets::discovery", ?malformed, "ignoring invalid wallet announcement");
                return;
            }
        };

        debug!(target: "wallets::discovery", wallet = %wallet.id, name = %wallet.name, "detected wallet");
        {
            let mut wallets = self.inner.wallets.write();
            match wallets.iter_mut().find(|w| w.id == wallet.id) {
                Some(existing) => *existing = wallet,
                None => wallets.push(wallet),
            }
        }
        self.notify();
    }

    /// Waits until at least one wallet is known or discovery settled, but never longer than
    /// `max_wait`. Returns the snapshot at that point.
    ///
    /// A `max_wait` too large to be represented as a deadline waits for discovery to settle.
    pub async fn await_discovery(&self, max_wait: Duration) -> Vec<WalletInfo> {
        let deadline = Instant::now().checked_add(max_wait);
        while !self.is_settled() {
            let mut interval = self.inner.poll_interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                interval = interval.min(deadline - now);
            }
            tokio::time::sleep(interval).await;
        }
        self.snapshot()
    }

    /// Whether the settle timer fired or any wallet has announced itself.
    pub fn is_settled(&self) -> bool {
        self.inner.settled.load(Ordering::SeqCst) || !self.is_empty()
    }

    /// All known wallets in announcement order.
    pub fn snapshot(&self) -> Vec<WalletInfo> {
        self.inner.wallets.read().clone()
    }

    pub fn lookup(&self, id: &str) -> Option<WalletInfo> {
        self.inner.wallets.read().iter().find(|w| w.id == id).cloned()
    }

    /// The first discovered wallet.
    pub fn default_choice(&self) -> Option<WalletInfo> {
        let wallet = self.inner.wallets.read().first().cloned();
        match &wallet {
            Some(wallet) => debug!(target: "wallets::discovery", wallet = %wallet.name, "using default wallet"),
            None => debug!(target: "wallets::discovery", "no wallets discovered"),
        }
        wallet
    }

    pub fn len(&self) -> usize {
        self.inner.wallets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.wallets.read().is_empty()
    }

    /// Calls `callback` with the current snapshot now and after every change.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[WalletInfo]) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        let callback: SnapshotListener = Arc::new(callback);
        self.inner.listeners.lock().push((id, callback.clone()));
        callback(&self.snapshot());
        Subscription { id, registry: Arc::downgrade(&self.inner) }
    }

    fn notify(&self) {
        let wallets = self.snapshot();
        let listeners: Vec<_> =
            self.inner.listeners.lock().iter().map(|(_, listener)| listener.clone()).collect();
        for listener in listeners {
            listener(&wallets);
        }
    }
}

/// Handle returned by [`WalletRegistry::subscribe`].
#[must_use = "the listener stays registered until `unsubscribe` is called"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    /// Removes the listener.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
