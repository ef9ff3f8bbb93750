// SPDX-License-Identifier: MIT OR Apache-2.0

use nexus_store::{IdentityError, StoreError};
use thiserror::Error;

use crate::access::DenyReason;

/// Errors returned by all membership, access and content operations.
///
/// All of them are recoverable. Apart from regenerating colliding access codes nothing is
/// retried.
#[derive(Debug, Error)]
pub enum NexusError {
    #[error("requested entity or content does not exist")]
    NotFound,

    #[error("principal is already a member")]
    AlreadyMember,

    #[error("owners can not join their own entity")]
    SelfJoinForbidden,

    #[error("principal is not a member")]
    NotMember,

    #[error("owners can not leave their own project")]
    OwnerCannotLeave,

    #[error("project is not open for new collaborators")]
    NotOpen,

    #[error("access denied: {0}")]
    Denied(DenyReason),

    #[error("no principal is signed in")]
    Unauthenticated,

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("could not find a free access code")]
    CodeSpaceExhausted,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(#[from] StoreError),
}
