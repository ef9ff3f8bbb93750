// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resources, courses and projects.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::code::{AccessCode, CodeFormat};
use crate::id::{EntityId, PrincipalId};
use crate::timestamp::Timestamp;

/// Role given to the owner in the collaborator roster of a project.
pub const PROJECT_LEAD_ROLE: &str = "Project Lead";

/// The three kinds of joinable entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Classroom with a stream of announcements, materials and assignments.
    Resource,

    /// Course with teaching materials.
    Course,

    /// Student project looking for collaborators.
    Project,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Resource, EntityKind::Course, EntityKind::Project];

    /// Format of access codes generated for entities of this kind.
    pub fn code_format(&self) -> CodeFormat {
        match self {
            EntityKind::Resource | EntityKind::Project => CodeFormat::Alphanumeric(6),
            EntityKind::Course => CodeFormat::LettersDigits,
        }
    }

    /// Returns `true` if members can leave entities of this kind again.
    ///
    /// Only project collaborators can leave, enrollments in resources and courses are
    /// permanent.
    pub fn supports_leave(&self) -> bool {
        matches!(self, EntityKind::Project)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Resource => "resource",
            EntityKind::Course => "course",
            EntityKind::Project => "project",
        };

        write!(f, "{}", s)
    }
}

/// Names one of the counters of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Counter {
    Members,
    Likes,
    Views,
}

/// Denormalised counters of an entity.
///
/// `members` mirrors the number of principals whose joined set contains the entity. The owner
/// is never counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub members: u64,
    pub likes: u64,
    pub views: u64,
}

impl Counters {
    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Members => self.members,
            Counter::Likes => self.likes,
            Counter::Views => self.views,
        }
    }

    pub fn set(&mut self, counter: Counter, value: u64) {
        *self.get_mut(counter) = value;
    }

    /// Add a (possibly negative) delta to a counter, never going below zero.
    pub fn apply(&mut self, counter: Counter, delta: i64) -> u64 {
        let value = self.get_mut(counter);
        *value = value.saturating_add_signed(delta);
        *value
    }

    fn get_mut(&mut self, counter: Counter) -> &mut u64 {
        match counter {
            Counter::Members => &mut self.members,
            Counter::Likes => &mut self.likes,
            Counter::Views => &mut self.views,
        }
    }
}

/// Lifecycle of a project. Only open projects accept new collaborators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    Open,
    InProgress,
    Completed,
}

/// Entry in a project's collaborator roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub principal_id: PrincipalId,
    pub name: String,
    pub role: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// Planned step of a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    pub status: MilestoneStatus,
    pub date: Option<Timestamp>,
}

impl Milestone {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: MilestoneStatus::default(),
            date: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub title: String,
    pub description: String,
    pub category: String,
    pub tech: Vec<String>,
    pub status: ProjectStatus,
    pub collaborators: Vec<Collaborator>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Share of completed milestones in percent.
    #[serde(default)]
    pub progress: u8,
}

impl ProjectDetails {
    pub fn collaborator(&self, principal_id: &PrincipalId) -> Option<&Collaborator> {
        self.collaborators
            .iter()
            .find(|collaborator| &collaborator.principal_id == principal_id)
    }

    /// Change the status of the milestone at `index` and recompute the progress.
    ///
    /// Returns `false` when there is no milestone at that position.
    pub fn set_milestone_status(&mut self, index: usize, status: MilestoneStatus) -> bool {
        let Some(milestone) = self.milestones.get_mut(index) else {
            return false;
        };
        milestone.status = status;
        self.progress = self.completed_percent();
        true
    }

    fn completed_percent(&self) -> u8 {
        let total = self.milestones.len();
        if total == 0 {
            return 0;
        }
        let completed = self
            .milestones
            .iter()
            .filter(|milestone| milestone.status == MilestoneStatus::Completed)
            .count();
        // Rounded half up, at most 100.
        ((completed * 200 + total) / (total * 2)) as u8
    }
}

/// Kind-specific attributes of an entity. The variant determines the entity's kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityDetails {
    Resource {
        name: String,
        subject: String,
        description: String,
    },
    Course {
        title: String,
        description: String,
    },
    Project(ProjectDetails),
}

impl EntityDetails {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityDetails::Resource { .. } => EntityKind::Resource,
            EntityDetails::Course { .. } => EntityKind::Course,
            EntityDetails::Project(_) => EntityKind::Project,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            EntityDetails::Resource { name, .. } => name,
            EntityDetails::Course { title, .. } => title,
            EntityDetails::Project(project) => &project.title,
        }
    }

    pub fn as_project(&self) -> Option<&ProjectDetails> {
        match self {
            EntityDetails::Project(project) => Some(project),
            _ => None,
        }
    }

    pub fn as_project_mut(&mut self) -> Option<&mut ProjectDetails> {
        match self {
            EntityDetails::Project(project) => Some(project),
            _ => None,
        }
    }
}

/// A resource, course or project as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub owner_id: PrincipalId,
    pub owner_name: String,
    pub access_code: AccessCode,
    pub counters: Counters,
    pub details: EntityDetails,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        self.details.kind()
    }

    pub fn is_owner(&self, principal_id: &PrincipalId) -> bool {
        &self.owner_id == principal_id
    }

    pub fn member_count(&self) -> u64 {
        self.counters.members
    }
}

/// Entity which was not written to the store yet. Identifier and timestamps are assigned by
/// the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntity {
    pub owner_id: PrincipalId,
    pub owner_name: String,
    pub access_code: AccessCode,
    pub details: EntityDetails,
}

impl NewEntity {
    pub fn kind(&self) -> EntityKind {
        self.details.kind()
    }

    /// Finalise the entity with the identifier and creation time handed out by the store.
    pub fn into_entity(self, id: EntityId, created_at: Timestamp) -> Entity {
        Entity {
            id,
            owner_id: self.owner_id,
            owner_name: self.owner_name,
            access_code: self.access_code,
            counters: Counters::default(),
            details: self.details,
            created_at,
            updated_at: None,
        }
    }
}

/// Partial update of an entity's attributes.
///
/// Owner, access code and counters can not be changed through a patch. Fields which do not
/// exist for the entity's kind are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPatch {
    /// Name of a resource or title of a course or project.
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub category: Option<String>,
    pub tech: Option<Vec<String>>,
    pub status: Option<ProjectStatus>,
}

impl EntityPatch {
    pub fn is_empty(&self) -> bool {
        self == &EntityPatch::default()
    }

    /// Returns `true` if the patch touches fields only the owner of a project may change.
    pub fn touches_owner_fields(&self) -> bool {
        self.category.is_some()
    }

    pub fn apply(&self, details: &mut EntityDetails) {
        match details {
            EntityDetails::Resource {
                name,
                subject,
                description,
            } => {
                set(name, &self.title);
                set(subject, &self.subject);
                set(description, &self.description);
            }
            EntityDetails::Course { title, description } => {
                set(title, &self.title);
                set(description, &self.description);
            }
            EntityDetails::Project(project) => {
                set(&mut project.title, &self.title);
                set(&mut project.description, &self.description);
                set(&mut project.category, &self.category);
                set(&mut project.tech, &self.tech);
                set(&mut project.status, &self.status);
            }
        }
    }
}

fn set<T: Clone>(field: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use crate::{AccessCode, CodeFormat, EntityId, PrincipalId, Timestamp};

    use super::{
        Counter, Counters, EntityDetails, EntityKind, EntityPatch, Milestone, MilestoneStatus,
        NewEntity, ProjectDetails, ProjectStatus,
    };

    #[test]
    fn code_formats_per_kind() {
        assert_eq!(EntityKind::Resource.code_format(), CodeFormat::Alphanumeric(6));
        assert_eq!(EntityKind::Project.code_format(), CodeFormat::Alphanumeric(6));
        assert_eq!(EntityKind::Course.code_format(), CodeFormat::LettersDigits);
    }

    #[test]
    fn only_projects_can_be_left() {
        assert!(EntityKind::Project.supports_leave());
        assert!(!EntityKind::Resource.supports_leave());
        assert!(!EntityKind::Course.supports_leave());
    }

    #[test]
    fn counters_never_go_negative() {
        let mut counters = Counters::default();
        assert_eq!(counters.apply(Counter::Members, 1), 1);
        assert_eq!(counters.apply(Counter::Members, -5), 0);
        assert_eq!(counters.apply(Counter::Views, 3), 3);
        assert_eq!(counters.get(Counter::Likes), 0);
    }

    #[test]
    fn patch_keeps_unset_fields() {
        let mut details = EntityDetails::Resource {
            name: "Algebra".into(),
            subject: "Maths".into(),
            description: "Linear algebra for first years".into(),
        };
        EntityPatch {
            title: Some("Linear Algebra".into()),
            status: Some(ProjectStatus::Completed),
            ..Default::default()
        }
        .apply(&mut details);

        assert_eq!(
            details,
            EntityDetails::Resource {
                name: "Linear Algebra".into(),
                subject: "Maths".into(),
                description: "Linear algebra for first years".into(),
            }
        );
    }

    #[test]
    fn new_entities_start_without_members() {
        let new_entity = NewEntity {
            owner_id: PrincipalId::from("teacher"),
            owner_name: "Teacher".into(),
            access_code: AccessCode::normalize("abc123").unwrap(),
            details: EntityDetails::Project(ProjectDetails::default()),
        };
        assert_eq!(new_entity.kind(), EntityKind::Project);

        let entity = new_entity.into_entity(EntityId::from_bytes([1; 16]), Timestamp::now());
        assert_eq!(entity.member_count(), 0);
        assert!(entity.is_owner(&PrincipalId::from("teacher")));
        assert_eq!(entity.access_code.as_str(), "ABC123");
    }

    #[test]
    fn milestones_drive_progress() {
        let mut project = ProjectDetails {
            milestones: vec![
                Milestone::new("Design"),
                Milestone::new("Prototype"),
                Milestone::new("Release"),
            ],
            ..Default::default()
        };
        assert_eq!(project.progress, 0);

        assert!(project.set_milestone_status(0, MilestoneStatus::Completed));
        assert_eq!(project.progress, 33);
        assert!(project.set_milestone_status(1, MilestoneStatus::Completed));
        assert_eq!(project.progress, 67);
        assert!(project.set_milestone_status(1, MilestoneStatus::InProgress));
        assert_eq!(project.progress, 33);
        assert!(project.set_milestone_status(2, MilestoneStatus::Completed));
        assert!(project.set_milestone_status(1, MilestoneStatus::Completed));
        assert_eq!(project.progress, 100);

        assert!(!project.set_milestone_status(3, MilestoneStatus::Completed));
        assert_eq!(project.milestones[1].status, MilestoneStatus::Completed);
    }
}
