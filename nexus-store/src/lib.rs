// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces and implementations of the collaborators Skill Nexus delegates all state to: a
//! document store and an identity provider.
//!
//! ## Document store
//!
//! The document store keeps one collection per entity kind (resources, courses, projects), a
//! collection of principal records and a collection of owned content. The interfaces offer the
//! primitives typically found in managed document databases: get-by-id, create with a
//! generated id, field level updates, atomic counter increments, atomic set union and removal,
//! equality queries with ordering and limit and batched gets of a bounded number of ids.
//!
//! Read and single-document write operations are split into [`EntityStore`],
//! [`PrincipalStore`] and [`ContentStore`]. [`DocumentStore`] is implemented for every type
//! offering all of them plus transactions.
//!
//! ## Write transactions
//!
//! A membership is represented redundantly: as an entity id inside a principal's membership
//! set and as a member counter on the entity. Both documents need to change together, otherwise
//! a failure in between leaves the counter out of sync with the sets. Writes touching more than
//! one document are therefore grouped into one atomic transaction using [`WritableStore`] and
//! [`Transaction`]:
//!
//! ```rust
//! # use nexus_core::{EntityId, EntityKind, MembershipSet, PrincipalId, Counter};
//! # use nexus_store::{MemoryStore, Transaction, WritableStore, Write};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! # let store = MemoryStore::new();
//! # let student = PrincipalId::from("student");
//! # let entity = EntityId::from_bytes([1; 16]);
//! let mut tx = store.begin().await?;
//!
//! tx.stage(Write::AddToSet {
//!     principal: student,
//!     set: MembershipSet::Joined(EntityKind::Resource),
//!     entity,
//!     must_change: true,
//! });
//! tx.stage(Write::Increment {
//!     kind: EntityKind::Resource,
//!     entity,
//!     counter: Counter::Members,
//!     delta: 1,
//! });
//!
//! // Either both writes are applied or none of them.
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Identity provider
//!
//! [`IdentityProvider`] authenticates users and hands out stable principal ids which are used
//! as foreign keys for all ownership and membership fields.
//!
//! ## Store implementations
//!
//! An in-memory document store ([`MemoryStore`]) and identity provider
//! ([`MemoryIdentityProvider`]) are gated by the `memory` feature flag which is enabled by
//! default. They do not persist anything and are meant for development and testing.
mod content;
mod entities;
mod error;
pub mod identity;
#[cfg(feature = "memory")]
pub mod memory;
mod principals;
mod query;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
mod transactions;

pub use content::ContentStore;
pub use entities::{EntityStore, MAX_BATCH_SIZE};
pub use error::{StoreError, TransactionError};
pub use identity::{AuthUser, FederatedProvider, IdentityError, IdentityProvider};
#[cfg(feature = "memory")]
pub use memory::{MemoryIdentityProvider, MemoryStore};
pub use principals::PrincipalStore;
pub use query::{ContentQuery, EntityQuery, Order};
pub use transactions::{Transaction, WritableStore, Write};

/// Document store offering all collections and transactions.
pub trait DocumentStore:
    EntityStore + PrincipalStore + ContentStore + WritableStore + Clone + Send + Sync
{
}

impl<T> DocumentStore for T where
    T: EntityStore + PrincipalStore + ContentStore + WritableStore + Clone + Send + Sync
{
}
