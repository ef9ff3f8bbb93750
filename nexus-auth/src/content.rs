// SPDX-License-Identifier: MIT OR Apache-2.0

//! Announcements with their comments, materials, assignments, submissions, project messages
//! and milestones.
use nexus_core::{
    AssignmentPatch, Content, ContentBody, ContentId, ContentKind, Entity, EntityId, EntityKind,
    MilestoneStatus, NewContent, Principal, Timestamp,
};
use nexus_store::{ContentQuery, DocumentStore, Order, Transaction, TransactionError, Write};
use tracing::debug;

use crate::access::{Action, DenyReason, require};
use crate::accessor::fetch_entity;
use crate::config::DEFAULT_MESSAGE_LIMIT;
use crate::error::NexusError;

fn ensure_not_blank(value: &str, field: &str) -> Result<(), NexusError> {
    if value.trim().is_empty() {
        return Err(NexusError::Invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct ContentBoard<S> {
    pub(crate) store: S,
    message_limit: usize,
}

impl<S> ContentBoard<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            message_limit: DEFAULT_MESSAGE_LIMIT,
        }
    }

    /// Number of messages returned by [`Self::messages`] when no limit is given.
    pub fn with_message_limit(mut self, limit: usize) -> Self {
        self.message_limit = limit;
        self
    }

    async fn publish(
        &self,
        actor: &Principal,
        entity: &Entity,
        body: ContentBody,
    ) -> Result<Content, NexusError> {
        let content = self
            .store
            .insert_content(NewContent {
                parent: entity.id,
                author_id: actor.id.clone(),
                author_name: actor.name(),
                body,
            })
            .await?;

        debug!(
            kind = ?content.kind(),
            id = %content.id,
            parent = %entity.id,
            author = %actor.id,
            "published content"
        );

        Ok(content)
    }

    pub(crate) async fn fetch_content(&self, id: &ContentId) -> Result<Content, NexusError> {
        self.store
            .get_content(id)
            .await?
            .ok_or(NexusError::NotFound)
    }

    /// Fetch an assignment and check it belongs to the entity.
    async fn fetch_assignment(
        &self,
        entity: &Entity,
        id: &ContentId,
    ) -> Result<(Content, Timestamp, u32), NexusError> {
        let content = self.fetch_content(id).await?;
        match content.body {
            ContentBody::Assignment {
                due_at, points, ..
            } if content.parent == entity.id => Ok((content, due_at, points)),
            _ => Err(NexusError::NotFound),
        }
    }

    pub async fn post_announcement(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
        text: &str,
    ) -> Result<Content, NexusError> {
        ensure_not_blank(text, "announcement")?;
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        require(actor, Some(&entity), Action::PostAnnouncement)?;

        self.publish(
            actor,
            &entity,
            ContentBody::Announcement {
                text: text.to_string(),
            },
        )
        .await
    }

    pub async fn add_material(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
        title: &str,
        description: &str,
        url: Option<&str>,
    ) -> Result<Content, NexusError> {
        ensure_not_blank(title, "title")?;
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        require(actor, Some(&entity), Action::CreateMaterial)?;

        self.publish(
            actor,
            &entity,
            ContentBody::Material {
                title: title.to_string(),
                description: description.to_string(),
                url: url.map(str::to_string),
            },
        )
        .await
    }

    /// Change the text of an announcement. Only its author may.
    pub async fn update_announcement(
        &self,
        actor: &Principal,
        announcement_id: &ContentId,
        text: &str,
    ) -> Result<Content, NexusError> {
        ensure_not_blank(text, "announcement")?;
        let announcement = self.fetch_content(announcement_id).await?;
        if announcement.kind() != ContentKind::Announcement {
            return Err(NexusError::NotFound);
        }
        if announcement.author_id != actor.id {
            return Err(NexusError::Denied(DenyReason::NotOwner));
        }

        let body = ContentBody::Announcement {
            text: text.to_string(),
        };
        if !self.store.replace_body(announcement_id, body).await? {
            return Err(NexusError::NotFound);
        }

        debug!(id = %announcement_id, "updated announcement");
        self.fetch_content(announcement_id).await
    }

    /// Remove an announcement or material. Allowed for its author and the entity's owner.
    ///
    /// Comments on a removed announcement are removed with it.
    pub async fn remove(
        &self,
        actor: &Principal,
        kind: EntityKind,
        content_id: &ContentId,
    ) -> Result<(), NexusError> {
        let content = self.fetch_content(content_id).await?;
        if !matches!(
            content.kind(),
            ContentKind::Announcement | ContentKind::Material
        ) {
            return Err(NexusError::Invalid(format!(
                "{:?} can not be removed",
                content.kind()
            )));
        }

        if content.author_id != actor.id {
            let entity = fetch_entity(&self.store, kind, &content.parent).await?;
            require(actor, Some(&entity), Action::RemoveMaterial)?;
        }

        if !self.store.delete_content(content_id).await? {
            return Err(NexusError::NotFound);
        }

        debug!(id = %content_id, actor = %actor.id, "removed content");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_assignment(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
        title: &str,
        description: &str,
        due_at: Timestamp,
        points: u32,
    ) -> Result<Content, NexusError> {
        ensure_not_blank(title, "title")?;
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        require(actor, Some(&entity), Action::CreateAssignment)?;

        self.publish(
            actor,
            &entity,
            ContentBody::Assignment {
                title: title.to_string(),
                description: description.to_string(),
                due_at,
                points,
            },
        )
        .await
    }

    /// Change an assignment. Allowed for its author and the entity's owner.
    pub async fn update_assignment(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
        assignment_id: &ContentId,
        patch: &AssignmentPatch,
    ) -> Result<Content, NexusError> {
        if patch.is_empty() {
            return Err(NexusError::Invalid("update without any changes".into()));
        }
        if let Some(title) = &patch.title {
            ensure_not_blank(title, "title")?;
        }

        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        let (assignment, _, _) = self.fetch_assignment(&entity, assignment_id).await?;
        if assignment.author_id != actor.id {
            require(actor, Some(&entity), Action::ManageAssignment)?;
        }

        let mut body = assignment.body;
        patch.apply(&mut body);
        if !self.store.replace_body(assignment_id, body).await? {
            return Err(NexusError::NotFound);
        }

        debug!(id = %assignment_id, actor = %actor.id, "updated assignment");
        self.fetch_content(assignment_id).await
    }

    /// Delete an assignment together with all its submissions. Allowed for its author and the
    /// entity's owner.
    pub async fn delete_assignment(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
        assignment_id: &ContentId,
    ) -> Result<(), NexusError> {
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        let (assignment, _, _) = self.fetch_assignment(&entity, assignment_id).await?;
        if assignment.author_id != actor.id {
            require(actor, Some(&entity), Action::ManageAssignment)?;
        }

        if !self.store.delete_content(assignment_id).await? {
            return Err(NexusError::NotFound);
        }

        debug!(id = %assignment_id, actor = %actor.id, "deleted assignment");
        Ok(())
    }

    /// Content of one kind below an entity, newest first.
    pub async fn list(
        &self,
        entity_id: &EntityId,
        kind: ContentKind,
    ) -> Result<Vec<Content>, NexusError> {
        Ok(self
            .store
            .query_content(&ContentQuery::new(*entity_id, kind))
            .await?)
    }

    /// Submit work for an assignment.
    ///
    /// Only members of the entity can submit, and only before the due date. Submitting again
    /// replaces the text of the earlier submission and clears its grade.
    pub async fn submit(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
        assignment_id: &ContentId,
        text: &str,
    ) -> Result<Content, NexusError> {
        ensure_not_blank(text, "submission")?;
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        if !actor.is_member_of(kind, entity_id) {
            return Err(NexusError::Denied(DenyReason::NotMember));
        }

        let (_, due_at, _) = self.fetch_assignment(&entity, assignment_id).await?;
        if Timestamp::now() > due_at {
            return Err(NexusError::Invalid("assignment is past its due date".into()));
        }

        let body = ContentBody::Submission {
            assignment_id: *assignment_id,
            text: text.to_string(),
            grade: None,
            feedback: None,
            graded_by: None,
            graded_at: None,
        };

        match self.own_submission(actor, entity_id, assignment_id).await? {
            Some(previous) => {
                if !self.store.replace_body(&previous.id, body).await? {
                    return Err(NexusError::NotFound);
                }
                debug!(id = %previous.id, assignment = %assignment_id, "resubmitted");
                self.fetch_content(&previous.id).await
            }
            None => self.publish(actor, &entity, body).await,
        }
    }

    /// The actor's submission for an assignment, if any.
    pub async fn own_submission(
        &self,
        actor: &Principal,
        entity_id: &EntityId,
        assignment_id: &ContentId,
    ) -> Result<Option<Content>, NexusError> {
        let query = ContentQuery::new(*entity_id, ContentKind::Submission)
            .author(actor.id.clone())
            .refers_to(*assignment_id)
            .limit(1);
        Ok(self.store.query_content(&query).await?.into_iter().next())
    }

    /// All submissions for an assignment. Only the owner of the entity may see them.
    pub async fn submissions(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
        assignment_id: &ContentId,
    ) -> Result<Vec<Content>, NexusError> {
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        require(actor, Some(&entity), Action::ViewSubmissions)?;

        let query = ContentQuery::new(*entity_id, ContentKind::Submission)
            .refers_to(*assignment_id)
            .order(Order::Ascending);
        Ok(self.store.query_content(&query).await?)
    }

    /// Grade a submission. The grade has to be between zero and the assignment's points.
    pub async fn grade(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
        submission_id: &ContentId,
        grade: u32,
        feedback: Option<&str>,
    ) -> Result<Content, NexusError> {
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        require(actor, Some(&entity), Action::GradeSubmission)?;

        let submission = self.fetch_content(submission_id).await?;
        let ContentBody::Submission {
            assignment_id,
            text,
            ..
        } = submission.body
        else {
            return Err(NexusError::NotFound);
        };
        if submission.parent != entity.id {
            return Err(NexusError::NotFound);
        }

        let (_, _, points) = self.fetch_assignment(&entity, &assignment_id).await?;
        if grade > points {
            return Err(NexusError::Invalid(format!(
                "grade {grade} exceeds the maximum of {points} points"
            )));
        }

        let body = ContentBody::Submission {
            assignment_id,
            text,
            grade: Some(grade),
            feedback: feedback.map(str::to_string),
            graded_by: Some(actor.id.clone()),
            graded_at: Some(Timestamp::now()),
        };
        if !self.store.replace_body(submission_id, body).await? {
            return Err(NexusError::NotFound);
        }

        debug!(id = %submission_id, grade, points, "graded submission");
        self.fetch_content(submission_id).await
    }

    /// Post a chat message to a project. Only the owner and collaborators may post.
    pub async fn post_message(
        &self,
        actor: &Principal,
        project_id: &EntityId,
        text: &str,
    ) -> Result<Content, NexusError> {
        ensure_not_blank(text, "message")?;
        let project = fetch_entity(&self.store, EntityKind::Project, project_id).await?;
        require(actor, Some(&project), Action::PostMessage)?;

        self.publish(
            actor,
            &project,
            ContentBody::Message {
                text: text.to_string(),
            },
        )
        .await
    }

    /// Project messages, oldest first.
    pub async fn messages(
        &self,
        project_id: &EntityId,
        limit: Option<usize>,
    ) -> Result<Vec<Content>, NexusError> {
        let query = ContentQuery::new(*project_id, ContentKind::Message)
            .order(Order::Ascending)
            .limit(limit.unwrap_or(self.message_limit));
        Ok(self.store.query_content(&query).await?)
    }

    /// Comment on an announcement. The owner and members of the entity may comment.
    pub async fn add_comment(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
        announcement_id: &ContentId,
        text: &str,
    ) -> Result<Content, NexusError> {
        ensure_not_blank(text, "comment")?;
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        require(actor, Some(&entity), Action::PostComment)?;

        let announcement = self.fetch_content(announcement_id).await?;
        if announcement.kind() != ContentKind::Announcement || announcement.parent != entity.id {
            return Err(NexusError::NotFound);
        }

        self.publish(
            actor,
            &entity,
            ContentBody::Comment {
                announcement_id: *announcement_id,
                text: text.to_string(),
            },
        )
        .await
    }

    /// Comments on an announcement, oldest first.
    pub async fn comments(&self, announcement_id: &ContentId) -> Result<Vec<Content>, NexusError> {
        let query = ContentQuery {
            kind: Some(ContentKind::Comment),
            refers_to: Some(*announcement_id),
            order: Order::Ascending,
            ..Default::default()
        };
        Ok(self.store.query_content(&query).await?)
    }

    /// Delete a comment. Allowed for the comment's author, the announcement's author and the
    /// entity's owner.
    pub async fn delete_comment(
        &self,
        actor: &Principal,
        kind: EntityKind,
        comment_id: &ContentId,
    ) -> Result<(), NexusError> {
        let comment = self.fetch_content(comment_id).await?;
        let ContentBody::Comment {
            announcement_id, ..
        } = &comment.body
        else {
            return Err(NexusError::NotFound);
        };

        if comment.author_id != actor.id {
            let announcement_author = self
                .store
                .get_content(announcement_id)
                .await?
                .map(|announcement| announcement.author_id);
            if announcement_author.as_ref() != Some(&actor.id) {
                let entity = fetch_entity(&self.store, kind, &comment.parent).await?;
                require(actor, Some(&entity), Action::ModerateComments)?;
            }
        }

        if !self.store.delete_content(comment_id).await? {
            return Err(NexusError::NotFound);
        }

        debug!(id = %comment_id, actor = %actor.id, "deleted comment");
        Ok(())
    }

    /// Set the status of a project milestone and return the project with recomputed progress.
    ///
    /// The owner and collaborators may update milestones.
    pub async fn update_milestone(
        &self,
        actor: &Principal,
        project_id: &EntityId,
        index: usize,
        status: MilestoneStatus,
    ) -> Result<Entity, NexusError> {
        let project = fetch_entity(&self.store, EntityKind::Project, project_id).await?;
        require(actor, Some(&project), Action::UpdateMilestone)?;

        let milestones = project
            .details
            .as_project()
            .map_or(0, |details| details.milestones.len());
        if index >= milestones {
            return Err(NexusError::NotFound);
        }

        let mut tx = self.store.begin().await?;
        tx.stage(Write::SetMilestoneStatus {
            project: *project_id,
            index,
            status,
        });
        match tx.commit().await {
            Ok(()) => (),
            // Project or milestone vanished in the meantime.
            Err(TransactionError::Conflict(_)) => return Err(NexusError::NotFound),
            Err(TransactionError::Store(err)) => return Err(err.into()),
        }

        debug!(project = %project_id, index, ?status, actor = %actor.id, "updated milestone");
        fetch_entity(&self.store, EntityKind::Project, project_id).await
    }
}
