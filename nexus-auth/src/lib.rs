// SPDX-License-Identifier: MIT OR Apache-2.0

//! Membership ledger, access codes and role-gated access control for Skill Nexus.
//!
//! Principals join resources, courses and projects either by typing the entity's access code or
//! by being enrolled by the owner. Each membership is written to the principal's joined set and
//! to the entity's member counter inside one store transaction, joining twice is rejected with
//! [`NexusError::AlreadyMember`] and never counted twice.
//!
//! Mutations are gated by [`authorize`]: owners manage their entities and the content below
//! them, only teachers create resources and courses and only members edit projects, post to
//! project chat and comment on announcements.
//!
//! All components receive the document store (and identity provider) they work on as
//! constructor arguments.
pub mod access;
mod accessor;
mod codes;
mod config;
mod content;
mod error;
mod favourites;
mod gradebook;
mod identity;
mod ledger;

pub use access::{Action, Decision, DenyReason, authorize, require};
pub use accessor::EntityAccessor;
pub use codes::{CodeGenerator, resolve};
pub use config::{Config, DEFAULT_CODE_ATTEMPTS, DEFAULT_MESSAGE_LIMIT};
pub use content::ContentBoard;
pub use error::NexusError;
pub use favourites::Favourites;
pub use gradebook::{GradeEntry, StudentGrades, average_grade};
pub use identity::IdentityResolver;
pub use ledger::{DEFAULT_COLLABORATOR_ROLE, MembershipLedger};
