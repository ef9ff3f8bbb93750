// SPDX-License-Identifier: MIT OR Apache-2.0

use nexus_auth::{CodeGenerator, Config};
use nexus_store::{DocumentStore, IdentityProvider};
use rand::Rng;
use rand::rngs::StdRng;

use crate::Nexus;

#[derive(Debug)]
pub struct NexusBuilder<S, I, R = StdRng> {
    store: S,
    identity: I,
    codes: CodeGenerator<R>,
    config: Config,
}

impl<S, I> NexusBuilder<S, I>
where
    S: DocumentStore,
    I: IdentityProvider,
{
    pub(crate) fn new(store: S, identity: I) -> Self {
        Self {
            store,
            identity,
            codes: CodeGenerator::new(),
            config: Config::default(),
        }
    }
}

impl<S, I, R> NexusBuilder<S, I, R>
where
    S: DocumentStore,
    I: IdentityProvider,
    R: Rng,
{
    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn code_attempts(mut self, attempts: usize) -> Self {
        self.config.code_attempts = attempts;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn message_limit(mut self, limit: usize) -> Self {
        self.config.message_limit = limit;
        self
    }

    /// Draw access codes from the given random number generator, for example a seeded one in
    /// tests.
    pub fn code_rng<T: Rng>(self, rng: T) -> NexusBuilder<S, I, T> {
        NexusBuilder {
            store: self.store,
            identity: self.identity,
            codes: CodeGenerator::from_rng(rng),
            config: self.config,
        }
    }

    pub fn build(self) -> Nexus<S, I, R> {
        Nexus::from_parts(self.store, self.identity, self.codes, self.config)
    }
}
