// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use crate::transactions::Write;

/// Errors surfaced by document store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Batched reads are limited in size, callers need to split larger requests.
    #[error("batch of {0} ids exceeds the maximum of {1}")]
    BatchTooLarge(usize, usize),

    /// A field-level update targeted a document which does not exist.
    #[error("document {0} does not exist")]
    MissingDocument(String),

    /// Another thread panicked while holding the lock of the store.
    #[error("store lock was poisoned")]
    Poisoned,

    /// The store could not be reached or did not respond in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors occurring when committing a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// A staged write required a change which did not happen, no write of the transaction was
    /// applied.
    #[error("transaction aborted, write did not apply: {0:?}")]
    Conflict(Box<Write>),

    #[error(transparent)]
    Store(#[from] StoreError),
}
