// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generating access codes at creation time and resolving them at join time.
use std::sync::{Arc, Mutex, PoisonError};

use nexus_core::{AccessCode, CodeFormat, Entity, EntityKind};
use nexus_store::EntityStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::NexusError;

/// Source of random access codes.
///
/// Clones share the same random number generator.
#[derive(Clone, Debug)]
pub struct CodeGenerator<R = StdRng> {
    rng: Arc<Mutex<R>>,
}

impl CodeGenerator<StdRng> {
    /// Generator seeded from the operating system.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }
}

impl Default for CodeGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> CodeGenerator<R> {
    pub fn from_rng(rng: R) -> Self {
        Self {
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn generate(&self, format: CodeFormat) -> AccessCode {
        // A panic while generating can not leave the generator in an invalid state.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        AccessCode::generate(format, &mut *rng)
    }
}

/// Resolve user input to the entity of the given kind using that access code.
///
/// Input is trimmed and uppercased first. Empty input and unknown codes result in
/// [`NexusError::NotFound`].
pub async fn resolve<S>(store: &S, kind: EntityKind, input: &str) -> Result<Entity, NexusError>
where
    S: EntityStore,
{
    let Some(code) = AccessCode::normalize(input) else {
        return Err(NexusError::NotFound);
    };

    match store.find_by_code(kind, &code).await? {
        Some(entity) => {
            debug!(%kind, %code, id = %entity.id, "resolved access code");
            Ok(entity)
        }
        None => Err(NexusError::NotFound),
    }
}
