// SPDX-License-Identifier: MIT OR Apache-2.0

//! Equality filters with ordering and limit for listing documents.
use nexus_core::{
    Content, ContentId, ContentKind, Entity, EntityDetails, EntityId, PrincipalId, ProjectStatus,
};

/// Sort direction by creation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    Ascending,
    #[default]
    Descending,
}

/// Filter for listing entities of one kind.
///
/// All set fields need to match. Results are ordered by creation time, newest first unless
/// requested otherwise.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityQuery {
    pub owner: Option<PrincipalId>,
    pub subject: Option<String>,
    pub category: Option<String>,
    pub status: Option<ProjectStatus>,
    pub order: Order,
    pub limit: Option<usize>,
}

impl EntityQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner: PrincipalId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if the entity passes all set filters.
    ///
    /// Filters on fields the entity's kind does not have never match.
    pub fn matches(&self, entity: &Entity) -> bool {
        if let Some(owner) = &self.owner {
            if &entity.owner_id != owner {
                return false;
            }
        }

        if let Some(expected) = &self.subject {
            match &entity.details {
                EntityDetails::Resource { subject, .. } if subject == expected => (),
                _ => return false,
            }
        }

        if self.category.is_some() || self.status.is_some() {
            let Some(project) = entity.details.as_project() else {
                return false;
            };

            if let Some(category) = &self.category {
                if &project.category != category {
                    return false;
                }
            }

            if let Some(status) = self.status {
                if project.status != status {
                    return false;
                }
            }
        }

        true
    }
}

/// Filter for listing content items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentQuery {
    pub parent: Option<EntityId>,
    pub kind: Option<ContentKind>,
    pub author: Option<PrincipalId>,
    /// Item the content answers, see [`Content::refers_to`].
    pub refers_to: Option<ContentId>,
    pub order: Order,
    pub limit: Option<usize>,
}

impl ContentQuery {
    /// Query all content of the given kind below one parent entity.
    pub fn new(parent: EntityId, kind: ContentKind) -> Self {
        Self {
            parent: Some(parent),
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn author(mut self, author: PrincipalId) -> Self {
        self.author = Some(author);
        self
    }

    pub fn refers_to(mut self, id: ContentId) -> Self {
        self.refers_to = Some(id);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, content: &Content) -> bool {
        if let Some(parent) = &self.parent {
            if &content.parent != parent {
                return false;
            }
        }

        if let Some(kind) = self.kind {
            if content.kind() != kind {
                return false;
            }
        }

        if let Some(author) = &self.author {
            if &content.author_id != author {
                return false;
            }
        }

        if let Some(refers_to) = &self.refers_to {
            if content.refers_to() != Some(refers_to) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use nexus_core::{
        AccessCode, EntityDetails, EntityId, NewEntity, PrincipalId, ProjectDetails,
        ProjectStatus, Timestamp,
    };

    use super::EntityQuery;

    fn project(owner: &str, category: &str, status: ProjectStatus) -> nexus_core::Entity {
        NewEntity {
            owner_id: PrincipalId::from(owner),
            owner_name: owner.to_string(),
            access_code: AccessCode::normalize("ABC123").unwrap(),
            details: EntityDetails::Project(ProjectDetails {
                title: "Rover".into(),
                category: category.into(),
                status,
                ..Default::default()
            }),
        }
        .into_entity(EntityId::from_bytes([7; 16]), Timestamp::from_micros(1))
    }

    #[test]
    fn filters_by_project_fields() {
        let entity = project("ada", "robotics", ProjectStatus::Open);

        assert!(EntityQuery::new().matches(&entity));
        assert!(EntityQuery::new().category("robotics").matches(&entity));
        assert!(!EntityQuery::new().category("web").matches(&entity));
        assert!(
            EntityQuery::new()
                .status(ProjectStatus::Open)
                .owner(PrincipalId::from("ada"))
                .matches(&entity)
        );
        assert!(!EntityQuery::new().status(ProjectStatus::Completed).matches(&entity));
    }

    #[test]
    fn subject_filter_never_matches_projects() {
        let entity = project("ada", "robotics", ProjectStatus::Open);
        assert!(!EntityQuery::new().subject("robotics").matches(&entity));
    }
}
