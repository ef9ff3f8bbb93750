// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for content owned by entities.
use nexus_core::{Content, ContentBody, ContentId, NewContent};

use crate::error::StoreError;
use crate::query::ContentQuery;

/// Interface for storing and querying announcements, materials, assignments, submissions and
/// messages.
///
/// Two variants of the trait are provided: one which is thread-safe (implementing `Sync`) and one
/// which is purely intended for single-threaded execution contexts.
#[trait_variant::make(ContentStore: Send)]
pub trait LocalContentStore {
    /// Insert content under a store-generated id and creation timestamp.
    async fn insert_content(&self, content: NewContent) -> Result<Content, StoreError>;

    async fn get_content(&self, id: &ContentId) -> Result<Option<Content>, StoreError>;

    /// Replace the body of a content item and bump its update timestamp.
    ///
    /// Returns `false` when the item does not exist.
    async fn replace_body(&self, id: &ContentId, body: ContentBody) -> Result<bool, StoreError>;

    /// Delete a content item and everything referring to it, like submissions to an assignment
    /// or comments on an announcement.
    ///
    /// Returns `true` when the removal occurred and `false` when the item was not found.
    async fn delete_content(&self, id: &ContentId) -> Result<bool, StoreError>;

    async fn query_content(&self, query: &ContentQuery) -> Result<Vec<Content>, StoreError>;
}
