//! An in-process EIP-6963 announcement bus.

use escrow_wallets::{
    DiscoveryChannel, DiscoveryError, ProviderAnnouncement, ProviderHandle, ProviderInfo,
    discovery::AnnouncementHandler,
};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Builds a well-formed announcement for `provider`.
pub fn announcement(uuid: &str, name: &str, provider: ProviderHandle) -> ProviderAnnouncement {
    ProviderAnnouncement::new(
        ProviderInfo {
            uuid: uuid.to_string(),
            name: name.to_string(),
            icon: "data:image/svg+xml;base64,PHN2Zy8+".to_string(),
            rdns: format!("io.{}", name.to_lowercase().replace(' ', "")),
        },
        provider,
    )
}

/// Discovery channel driven by the test.
///
/// Wallets registered with [`MockDiscovery::with_wallet`] answer every discovery request, like
/// installed extensions do. [`MockDiscovery::announce`] delivers an announcement at any time.
#[derive(Default)]
pub struct MockDiscovery {
    handler: Mutex<Option<Arc<AnnouncementHandler>>>,
    installed: Mutex<Vec<ProviderAnnouncement>>,
    requests: AtomicUsize,
}

impl std::fmt::Debug for MockDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDiscovery")
            .field("installed", &*self.installed.lock())
            .field("requests", &self.request_count())
            .finish_non_exhaustive()
    }
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a wallet that announces itself on every discovery request.
    pub fn with_wallet(self, uuid: &str, name: &str, provider: ProviderHandle) -> Self {
        self.installed.lock().push(announcement(uuid, name, provider));
        self
    }

    /// Delivers `announcement` to the registered listener. Returns whether anyone listened.
    pub fn announce(&self, announcement: ProviderAnnouncement) -> bool {
        let Some(handler) = self.handler.lock().clone() else { return false };
        handler(announcement);
        true
    }

    pub fn is_listening(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Number of `eip6963:requestProvider` dispatches seen.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl DiscoveryChannel for MockDiscovery {
    fn on_announce(&self, handler: AnnouncementHandler) -> Result<(), DiscoveryError> {
        *self.handler.lock() = Some(Arc::new(handler));
        Ok(())
    }

    fn request_providers(&self) -> Result<(), DiscoveryError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let installed = self.installed.lock().clone();
        for wallet in installed {
            self.announce(wallet);
        }
        Ok(())
    }
}
