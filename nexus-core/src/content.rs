// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content owned by an entity: materials, announcements with their comments, assignments,
//! submissions and project chat messages.
use serde::{Deserialize, Serialize};

use crate::id::{ContentId, EntityId, PrincipalId};
use crate::timestamp::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    Material,
    Announcement,
    Assignment,
    Submission,
    Message,
    Comment,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentBody {
    Material {
        title: String,
        description: String,
        url: Option<String>,
    },
    Announcement {
        text: String,
    },
    Assignment {
        title: String,
        description: String,
        due_at: Timestamp,
        points: u32,
    },
    Submission {
        assignment_id: ContentId,
        text: String,
        grade: Option<u32>,
        feedback: Option<String>,
        graded_by: Option<PrincipalId>,
        graded_at: Option<Timestamp>,
    },
    Message {
        text: String,
    },
    Comment {
        announcement_id: ContentId,
        text: String,
    },
}

impl ContentBody {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentBody::Material { .. } => ContentKind::Material,
            ContentBody::Announcement { .. } => ContentKind::Announcement,
            ContentBody::Assignment { .. } => ContentKind::Assignment,
            ContentBody::Submission { .. } => ContentKind::Submission,
            ContentBody::Message { .. } => ContentKind::Message,
            ContentBody::Comment { .. } => ContentKind::Comment,
        }
    }
}

/// Stored content item. Always carries a back-reference to its parent entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    pub parent: EntityId,
    pub author_id: PrincipalId,
    pub author_name: String,
    pub body: ContentBody,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

impl Content {
    pub fn kind(&self) -> ContentKind {
        self.body.kind()
    }

    /// Content item this one answers: the assignment of a submission or the announcement of a
    /// comment.
    pub fn refers_to(&self) -> Option<&ContentId> {
        match &self.body {
            ContentBody::Submission { assignment_id, .. } => Some(assignment_id),
            ContentBody::Comment {
                announcement_id, ..
            } => Some(announcement_id),
            _ => None,
        }
    }
}

/// Changes to an assignment. Unset fields are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_at: Option<Timestamp>,
    pub points: Option<u32>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        self == &AssignmentPatch::default()
    }

    /// Apply the patch to an assignment body. Returns `false` for any other kind of content.
    pub fn apply(&self, body: &mut ContentBody) -> bool {
        let ContentBody::Assignment {
            title,
            description,
            due_at,
            points,
        } = body
        else {
            return false;
        };

        if let Some(value) = &self.title {
            title.clone_from(value);
        }
        if let Some(value) = &self.description {
            description.clone_from(value);
        }
        if let Some(value) = self.due_at {
            *due_at = value;
        }
        if let Some(value) = self.points {
            *points = value;
        }
        true
    }
}

/// Content which was not written to the store yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContent {
    pub parent: EntityId,
    pub author_id: PrincipalId,
    pub author_name: String,
    pub body: ContentBody,
}

impl NewContent {
    pub fn into_content(self, id: ContentId, created_at: Timestamp) -> Content {
        Content {
            id,
            parent: self.parent,
            author_id: self.author_id,
            author_name: self.author_name,
            body: self.body,
            created_at,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::id::ContentId;
    use crate::timestamp::Timestamp;

    use super::{AssignmentPatch, ContentBody};

    #[test]
    fn assignment_patch() {
        let mut body = ContentBody::Assignment {
            title: "Essay".into(),
            description: "B-trees".into(),
            due_at: Timestamp::from_micros(10),
            points: 10,
        };
        let patch = AssignmentPatch {
            points: Some(20),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert!(patch.apply(&mut body));
        assert_eq!(
            body,
            ContentBody::Assignment {
                title: "Essay".into(),
                description: "B-trees".into(),
                due_at: Timestamp::from_micros(10),
                points: 20,
            }
        );

        let mut comment = ContentBody::Comment {
            announcement_id: ContentId::from_bytes([1; 16]),
            text: "Thanks".into(),
        };
        assert!(!patch.apply(&mut comment));
    }
}
