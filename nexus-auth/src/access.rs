// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owner, teacher and collaborator checks performed before gated mutations.
use std::fmt;

use nexus_core::{Entity, EntityKind, Principal};
use tracing::warn;

use crate::error::NexusError;

/// Operations guarded by the role gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    // Owner actions.
    DeleteEntity,
    UpdateEntity,
    CreateMaterial,
    RemoveMaterial,
    GradeSubmission,
    ViewSubmissions,
    PostAnnouncement,
    CreateAssignment,
    ManageAssignment,
    ModerateComments,
    EnrollStudent,

    // Teacher surfaces.
    CreateEntity(EntityKind),
    InstructorDashboard,

    // Member actions: collaborators on projects, enrolled students elsewhere.
    EditProject,
    PostMessage,
    UpdateMilestone,
    PostComment,
    ViewOwnGrades,

    Read,
}

impl Action {
    pub fn is_owner_action(&self) -> bool {
        matches!(
            self,
            Action::DeleteEntity
                | Action::UpdateEntity
                | Action::CreateMaterial
                | Action::RemoveMaterial
                | Action::GradeSubmission
                | Action::ViewSubmissions
                | Action::PostAnnouncement
                | Action::CreateAssignment
                | Action::ManageAssignment
                | Action::ModerateComments
                | Action::EnrollStudent
        )
    }

    /// Returns `true` for actions only principals with the teacher role may perform.
    ///
    /// Anyone can create projects.
    pub fn is_teacher_surface(&self) -> bool {
        match self {
            Action::CreateEntity(kind) => *kind != EntityKind::Project,
            Action::InstructorDashboard => true,
            _ => false,
        }
    }

    pub fn is_collaborator_action(&self) -> bool {
        matches!(
            self,
            Action::EditProject
                | Action::PostMessage
                | Action::UpdateMilestone
                | Action::PostComment
                | Action::ViewOwnGrades
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DenyReason {
    NotOwner,
    NotInstructor,
    NotMember,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DenyReason::NotOwner => "not owner",
            DenyReason::NotInstructor => "not instructor",
            DenyReason::NotMember => "not a member",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// Decide if a principal may perform an action, optionally on an entity.
///
/// Rules are evaluated in order:
///
/// 1. Owner actions are allowed iff the principal owns the entity.
/// 2. Teacher surfaces are allowed iff the principal has the teacher role.
/// 3. Collaborator actions are allowed iff the principal owns or joined the entity.
/// 4. Everything else (reads, creating projects) is allowed.
///
/// Owner and collaborator actions without an entity are denied.
pub fn authorize(principal: &Principal, entity: Option<&Entity>, action: Action) -> Decision {
    if action.is_owner_action() {
        return match entity {
            Some(entity) if entity.is_owner(&principal.id) => Decision::Allowed,
            _ => Decision::Denied(DenyReason::NotOwner),
        };
    }

    if action.is_teacher_surface() {
        return if principal.is_teacher() {
            Decision::Allowed
        } else {
            Decision::Denied(DenyReason::NotInstructor)
        };
    }

    if action.is_collaborator_action() {
        return match entity {
            Some(entity)
                if entity.is_owner(&principal.id)
                    || principal.is_member_of(entity.kind(), &entity.id) =>
            {
                Decision::Allowed
            }
            _ => Decision::Denied(DenyReason::NotMember),
        };
    }

    Decision::Allowed
}

/// Like [`authorize`] but returns denials as [`NexusError::Denied`].
pub fn require(
    principal: &Principal,
    entity: Option<&Entity>,
    action: Action,
) -> Result<(), NexusError> {
    match authorize(principal, entity, action) {
        Decision::Allowed => Ok(()),
        Decision::Denied(reason) => {
            warn!(
                principal = %principal.id,
                entity = ?entity.map(|entity| entity.id),
                ?action,
                %reason,
                "access denied"
            );
            Err(NexusError::Denied(reason))
        }
    }
}
