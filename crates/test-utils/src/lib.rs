//! Test doubles for the wallet environment.

#![warn(unused_crate_dependencies, unreachable_pub)]

#[macro_use]
extern crate tracing;

mod discovery;
pub use discovery::{MockDiscovery, announcement};

mod provider;
pub use provider::{Call, MockProvider};

/// Initializes tracing for tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
