// SPDX-License-Identifier: MIT OR Apache-2.0

//! Skill Nexus brings students together in classroom resources, courses and projects.
//!
//! A [`Nexus`] wires the identity resolver, entity accessor, membership ledger, content board and
//! favourites to one document store and one identity provider. Convenience methods act on behalf
//! of the currently signed in principal, the components can also be used directly.
//!
//! ```rust
//! # use skill_nexus::{EntityDetails, EntityKind, MemoryIdentityProvider, MemoryStore, Nexus};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let nexus = Nexus::builder(MemoryStore::new(), MemoryIdentityProvider::new())
//!     .code_attempts(4)
//!     .build();
//!
//! nexus.sign_up("sam@example.org", "correct horse", Some("Sam")).await?;
//!
//! let project = nexus
//!     .create(EntityDetails::Project(Default::default()))
//!     .await?;
//! println!("share this code: {}", project.access_code);
//! # Ok(())
//! # }
//! ```
mod builder;
mod nexus;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use builder::NexusBuilder;
pub use nexus::{DashboardEntry, Nexus};

pub use nexus_auth::{
    Action, CodeGenerator, Config, ContentBoard, Decision, DenyReason, EntityAccessor,
    Favourites, GradeEntry, IdentityResolver, MembershipLedger, NexusError, StudentGrades,
    authorize,
};
pub use nexus_core::{
    AccessCode, AssignmentPatch, Content, ContentBody, ContentId, ContentKind, Entity,
    EntityDetails, EntityId, EntityKind, EntityPatch, Milestone, MilestoneStatus, Principal,
    PrincipalId, PrincipalPatch, ProjectDetails, ProjectStatus, Role, Timestamp,
};
pub use nexus_store::{
    DocumentStore, EntityQuery, FederatedProvider, IdentityProvider, MemoryIdentityProvider,
    MemoryStore, Order,
};
