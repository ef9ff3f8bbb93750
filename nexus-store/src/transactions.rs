// SPDX-License-Identifier: MIT OR Apache-2.0

//! Traits to group writes spanning multiple documents into one atomic transaction.
use std::future::Future;

use nexus_core::{
    Collaborator, ContentId, Counter, EntityId, EntityKind, MembershipSet, MilestoneStatus,
    NewEntity, PrincipalId,
};

use crate::error::{StoreError, TransactionError};

/// Single write staged inside a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Write {
    /// Insert a new entity under the given id.
    ///
    /// The transaction aborts when the id or the access code is already taken.
    InsertEntity { id: EntityId, entity: NewEntity },

    /// Add an entity id to a principal's set.
    ///
    /// With `must_change` set the whole transaction aborts when the id was already contained.
    AddToSet {
        principal: PrincipalId,
        set: MembershipSet,
        entity: EntityId,
        must_change: bool,
    },

    /// Remove an entity id from a principal's set.
    ///
    /// With `must_change` set the whole transaction aborts when the id was not contained.
    RemoveFromSet {
        principal: PrincipalId,
        set: MembershipSet,
        entity: EntityId,
        must_change: bool,
    },

    /// Add a delta to an entity counter. Counters never go below zero.
    Increment {
        kind: EntityKind,
        entity: EntityId,
        counter: Counter,
        delta: i64,
    },

    /// Append an entry to a project's collaborator roster unless the principal is already listed.
    AddCollaborator {
        project: EntityId,
        collaborator: Collaborator,
    },

    /// Drop a principal from a project's collaborator roster.
    RemoveCollaborator {
        project: EntityId,
        principal: PrincipalId,
    },

    /// Change the status of a project milestone and recompute the project's progress.
    SetMilestoneStatus {
        project: EntityId,
        index: usize,
        status: MilestoneStatus,
    },

    /// Delete an entity and release its access code.
    ///
    /// The id is dropped from the sets of every principal and content posted on the entity is
    /// deleted, as seen at commit time.
    DeleteEntity { kind: EntityKind, entity: EntityId },

    /// Delete a content item and the items referring to it.
    DeleteContent { id: ContentId },
}

/// Writes staged inside a transaction are applied all together on commit, or not at all.
///
/// Staged writes are not visible to reads before the transaction committed.
pub trait Transaction: Send + Sized {
    /// Stage a write to be applied on commit.
    fn stage(&mut self, write: Write);

    /// Number of staged writes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check all preconditions and apply all staged writes atomically.
    ///
    /// Fails with [`TransactionError::Conflict`] without applying anything when a write marked
    /// with `must_change` would not change its target, or when a targeted document does not
    /// exist.
    fn commit(self) -> impl Future<Output = Result<(), TransactionError>> + Send;

    /// Discard all staged writes.
    fn rollback(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Store which can begin write transactions.
pub trait WritableStore {
    type Transaction: Transaction;

    /// Begins a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, StoreError>> + Send;
}
