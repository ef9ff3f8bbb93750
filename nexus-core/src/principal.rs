// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated users and the sets of entities they belong to.
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::id::{EntityId, PrincipalId};
use crate::timestamp::Timestamp;

/// Role stored with every principal. Greater roles are assumed to contain the lower ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can join entities and create projects.
    #[default]
    Student,

    /// Can additionally create classroom resources and courses.
    Teacher,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            other => Err(format!("unknown role \"{other}\"")),
        }
    }
}

/// Names one of the entity id sets embedded in a principal record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MembershipSet {
    /// Entities created by the principal.
    Owned(EntityKind),

    /// Entities the principal enrolled in or collaborates on.
    Joined(EntityKind),

    /// Classroom resources bookmarked by the principal.
    StarredResources,

    /// Projects liked by the principal.
    LikedProjects,
}

/// Entity ids a principal belongs to, grouped by relation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memberships {
    pub owned_resources: BTreeSet<EntityId>,
    pub enrolled_resources: BTreeSet<EntityId>,
    pub owned_courses: BTreeSet<EntityId>,
    pub enrolled_courses: BTreeSet<EntityId>,
    pub projects: BTreeSet<EntityId>,
    pub collaborating_projects: BTreeSet<EntityId>,
    pub starred_resources: BTreeSet<EntityId>,
    pub liked_projects: BTreeSet<EntityId>,
}

impl Memberships {
    pub fn get(&self, set: MembershipSet) -> &BTreeSet<EntityId> {
        match set {
            MembershipSet::Owned(EntityKind::Resource) => &self.owned_resources,
            MembershipSet::Owned(EntityKind::Course) => &self.owned_courses,
            MembershipSet::Owned(EntityKind::Project) => &self.projects,
            MembershipSet::Joined(EntityKind::Resource) => &self.enrolled_resources,
            MembershipSet::Joined(EntityKind::Course) => &self.enrolled_courses,
            MembershipSet::Joined(EntityKind::Project) => &self.collaborating_projects,
            MembershipSet::StarredResources => &self.starred_resources,
            MembershipSet::LikedProjects => &self.liked_projects,
        }
    }

    pub fn get_mut(&mut self, set: MembershipSet) -> &mut BTreeSet<EntityId> {
        match set {
            MembershipSet::Owned(EntityKind::Resource) => &mut self.owned_resources,
            MembershipSet::Owned(EntityKind::Course) => &mut self.owned_courses,
            MembershipSet::Owned(EntityKind::Project) => &mut self.projects,
            MembershipSet::Joined(EntityKind::Resource) => &mut self.enrolled_resources,
            MembershipSet::Joined(EntityKind::Course) => &mut self.enrolled_courses,
            MembershipSet::Joined(EntityKind::Project) => &mut self.collaborating_projects,
            MembershipSet::StarredResources => &mut self.starred_resources,
            MembershipSet::LikedProjects => &mut self.liked_projects,
        }
    }

    pub fn contains(&self, set: MembershipSet, entity_id: &EntityId) -> bool {
        self.get(set).contains(entity_id)
    }

    /// Drop an entity from every set it can appear in. Returns `true` if any set changed.
    pub fn forget(&mut self, kind: EntityKind, entity_id: &EntityId) -> bool {
        let favourite = match kind {
            EntityKind::Resource => Some(MembershipSet::StarredResources),
            EntityKind::Project => Some(MembershipSet::LikedProjects),
            EntityKind::Course => None,
        };

        let mut changed = false;
        for set in [MembershipSet::Owned(kind), MembershipSet::Joined(kind)]
            .into_iter()
            .chain(favourite)
        {
            changed |= self.get_mut(set).remove(entity_id);
        }
        changed
    }
}

/// An authenticated user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub role: Role,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub memberships: Memberships,
}

impl Principal {
    /// Record for a principal seen for the first time. New principals are students.
    pub fn new(id: PrincipalId, display_name: Option<String>, email: Option<String>) -> Self {
        Self {
            id,
            display_name,
            email,
            photo_url: None,
            role: Role::default(),
            created_at: Timestamp::now(),
            updated_at: None,
            memberships: Memberships::default(),
        }
    }

    /// Role-changing builder, mostly useful when seeding records.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Name shown to other principals: display name, falling back to email and id.
    pub fn name(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.to_string())
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    /// Returns `true` if the principal joined the given entity (enrolled or collaborating).
    pub fn is_member_of(&self, kind: EntityKind, entity_id: &EntityId) -> bool {
        self.memberships
            .contains(MembershipSet::Joined(kind), entity_id)
    }
}

/// Profile attributes a principal may change on their own record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalPatch {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub role: Option<Role>,
}

impl PrincipalPatch {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.email.is_none()
            && self.photo_url.is_none()
            && self.role.is_none()
    }

    /// Apply all set attributes onto the principal.
    pub fn apply(&self, principal: &mut Principal) {
        if let Some(display_name) = &self.display_name {
            principal.display_name = Some(display_name.clone());
        }
        if let Some(email) = &self.email {
            principal.email = Some(email.clone());
        }
        if let Some(photo_url) = &self.photo_url {
            principal.photo_url = Some(photo_url.clone());
        }
        if let Some(role) = self.role {
            principal.role = role;
        }
    }
}
