// SPDX-License-Identifier: MIT OR Apache-2.0

use nexus_store::MAX_BATCH_SIZE;
use serde::{Deserialize, Serialize};

/// Default number of attempts to find a free access code when creating an entity.
pub const DEFAULT_CODE_ATTEMPTS: usize = 8;

/// Default number of project messages returned when listing a chat.
pub const DEFAULT_MESSAGE_LIMIT: usize = 50;

/// Tunables of the membership and content components.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How often a fresh access code is generated after a collision before giving up.
    pub code_attempts: usize,

    /// Number of ids fetched per batched get. Capped at the store's maximum batch size.
    pub batch_size: usize,

    /// Messages returned by a chat listing without explicit limit.
    pub message_limit: usize,
}

impl Config {
    /// Batch size actually used for requests, between one and the store's maximum.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            code_attempts: DEFAULT_CODE_ATTEMPTS,
            batch_size: MAX_BATCH_SIZE,
            message_limit: DEFAULT_MESSAGE_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn batch_size_is_capped() {
        let config = Config {
            batch_size: 50,
            ..Default::default()
        };
        assert_eq!(config.effective_batch_size(), 10);

        let config = Config {
            batch_size: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_batch_size(), 1);
    }
}
