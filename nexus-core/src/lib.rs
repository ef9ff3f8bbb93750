// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data types shared by all Skill Nexus crates.
//!
//! Three kinds of entities can be joined by principals: classroom resources, courses and
//! projects. Every entity has exactly one owner, a short human-typable access code and a member
//! counter. Principals keep the ids of the entities they own, joined, starred or liked in
//! membership sets, which together with the counter form a denormalised membership ledger.
//!
//! All types in this crate are plain data and can be serialized with `serde`. Identifiers are
//! encoded as hex strings in human readable formats (JSON) and as raw bytes otherwise (CBOR).
pub mod code;
pub mod content;
pub mod entity;
pub mod id;
pub mod principal;
mod serde;
pub mod timestamp;

pub use code::{AccessCode, CodeFormat};
pub use content::{AssignmentPatch, Content, ContentBody, ContentKind, NewContent};
pub use entity::{
    Collaborator, Counter, Counters, Entity, EntityDetails, EntityKind, EntityPatch, Milestone,
    MilestoneStatus, NewEntity, PROJECT_LEAD_ROLE, ProjectDetails, ProjectStatus,
};
pub use id::{ContentId, DOCUMENT_ID_LEN, EntityId, IdError, PrincipalId};
pub use principal::{MembershipSet, Memberships, Principal, PrincipalPatch, Role};
pub use timestamp::Timestamp;
