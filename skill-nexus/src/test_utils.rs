// SPDX-License-Identifier: MIT OR Apache-2.0

use nexus_store::{MemoryIdentityProvider, MemoryStore};
use rand::Rng;

use crate::Nexus;

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

/// Service on fresh in-memory collaborators, drawing access codes from the given generator.
pub fn memory_nexus<R: Rng>(rng: R) -> Nexus<MemoryStore, MemoryIdentityProvider, R> {
    Nexus::builder(MemoryStore::new(), MemoryIdentityProvider::new())
        .code_rng(rng)
        .build()
}
