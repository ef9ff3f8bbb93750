// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grades of enrolled students across all assignments of a resource or course.
use std::collections::HashMap;

use nexus_core::{
    Content, ContentBody, ContentId, ContentKind, EntityId, EntityKind, MembershipSet, Principal,
};
use nexus_store::{ContentQuery, DocumentStore, Order};
use tracing::debug;

use crate::access::{Action, require};
use crate::accessor::fetch_entity;
use crate::content::ContentBoard;
use crate::error::NexusError;

/// An assignment next to one student's submission for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GradeEntry {
    pub assignment: Content,
    pub submission: Option<Content>,
}

impl GradeEntry {
    /// Maximum points of the assignment.
    pub fn points(&self) -> u32 {
        match self.assignment.body {
            ContentBody::Assignment { points, .. } => points,
            _ => 0,
        }
    }

    /// Grade of the submission, if it was submitted and graded.
    pub fn grade(&self) -> Option<u32> {
        match self.submission.as_ref().map(|submission| &submission.body) {
            Some(ContentBody::Submission { grade, .. }) => *grade,
            _ => None,
        }
    }
}

/// All grades of one student.
#[derive(Clone, Debug, PartialEq)]
pub struct StudentGrades {
    pub student: Principal,
    pub grades: Vec<GradeEntry>,

    /// Points received over points possible of all graded assignments in percent. `None` while
    /// nothing was graded.
    pub average: Option<f64>,
}

/// Share of received points over possible points of the graded entries, in percent.
pub fn average_grade(grades: &[GradeEntry]) -> Option<f64> {
    let (received, possible) = grades
        .iter()
        .filter_map(|entry| entry.grade().map(|grade| (grade, entry.points())))
        .fold((0u64, 0u64), |(received, possible), (grade, points)| {
            (received + u64::from(grade), possible + u64::from(points))
        });

    if possible == 0 {
        return None;
    }
    Some(received as f64 / possible as f64 * 100.0)
}

impl<S> ContentBoard<S>
where
    S: DocumentStore,
{
    async fn assignments(&self, entity_id: &EntityId) -> Result<Vec<Content>, NexusError> {
        let query =
            ContentQuery::new(*entity_id, ContentKind::Assignment).order(Order::Ascending);
        Ok(self.store.query_content(&query).await?)
    }

    /// The actor's submitted assignments with their grades, oldest assignment first.
    ///
    /// Only members of the entity have grades.
    pub async fn student_grades(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
    ) -> Result<Vec<GradeEntry>, NexusError> {
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        require(actor, Some(&entity), Action::ViewOwnGrades)?;

        let query =
            ContentQuery::new(*entity_id, ContentKind::Submission).author(actor.id.clone());
        let mut submissions = by_assignment(self.store.query_content(&query).await?);

        let grades = self
            .assignments(entity_id)
            .await?
            .into_iter()
            .filter_map(|assignment| {
                let submission = submissions.remove(&assignment.id)?;
                Some(GradeEntry {
                    assignment,
                    submission: Some(submission),
                })
            })
            .collect();
        Ok(grades)
    }

    /// Grades of every enrolled student across all assignments. Only the owner may see them.
    pub async fn gradebook(
        &self,
        actor: &Principal,
        kind: EntityKind,
        entity_id: &EntityId,
    ) -> Result<Vec<StudentGrades>, NexusError> {
        let entity = fetch_entity(&self.store, kind, entity_id).await?;
        require(actor, Some(&entity), Action::ViewSubmissions)?;

        let assignments = self.assignments(entity_id).await?;
        let submissions = self
            .store
            .query_content(&ContentQuery::new(*entity_id, ContentKind::Submission))
            .await?;
        let students = self
            .store
            .principals_with(MembershipSet::Joined(kind), entity_id)
            .await?;

        let mut gradebook = Vec::with_capacity(students.len());
        for student in students {
            let mut own = by_assignment(
                submissions
                    .iter()
                    .filter(|submission| submission.author_id == student.id)
                    .cloned(),
            );
            let grades: Vec<GradeEntry> = assignments
                .iter()
                .map(|assignment| GradeEntry {
                    assignment: assignment.clone(),
                    submission: own.remove(&assignment.id),
                })
                .collect();
            let average = average_grade(&grades);
            gradebook.push(StudentGrades {
                student,
                grades,
                average,
            });
        }

        debug!(
            entity = %entity_id,
            students = gradebook.len(),
            assignments = assignments.len(),
            "built gradebook"
        );
        Ok(gradebook)
    }
}

fn by_assignment(submissions: impl IntoIterator<Item = Content>) -> HashMap<ContentId, Content> {
    submissions
        .into_iter()
        .filter_map(|submission| Some((*submission.refers_to()?, submission)))
        .collect()
}
