// SPDX-License-Identifier: MIT OR Apache-2.0

use nexus_core::{Content, ContentBody, ContentId, NewContent};

use crate::content::ContentStore;
use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::query::{ContentQuery, Order};

impl ContentStore for MemoryStore {
    async fn insert_content(&self, content: NewContent) -> Result<Content, StoreError> {
        let mut store = self.write_store()?;

        let mut rng = rand::rng();
        let id = loop {
            let id = ContentId::random(&mut rng);
            if !store.content.contains_key(&id) {
                break id;
            }
        };

        let created_at = store.next_timestamp();
        let content = content.into_content(id, created_at);
        store.content.insert(id, content.clone());
        Ok(content)
    }

    async fn get_content(&self, id: &ContentId) -> Result<Option<Content>, StoreError> {
        Ok(self.read_store()?.content.get(id).cloned())
    }

    async fn replace_body(&self, id: &ContentId, body: ContentBody) -> Result<bool, StoreError> {
        let mut store = self.write_store()?;
        let updated_at = store.next_timestamp();
        let Some(content) = store.content.get_mut(id) else {
            return Ok(false);
        };

        content.body = body;
        content.updated_at = Some(updated_at);
        Ok(true)
    }

    async fn delete_content(&self, id: &ContentId) -> Result<bool, StoreError> {
        Ok(self.write_store()?.remove_content(id).is_some())
    }

    async fn query_content(&self, query: &ContentQuery) -> Result<Vec<Content>, StoreError> {
        let store = self.read_store()?;
        let mut result: Vec<Content> = store
            .content
            .values()
            .filter(|content| query.matches(content))
            .cloned()
            .collect();
        result.sort_by_key(|content| content.created_at);
        if query.order == Order::Descending {
            result.reverse();
        }
        if let Some(limit) = query.limit {
            result.truncate(limit);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use nexus_core::{ContentBody, ContentKind, EntityId, NewContent, PrincipalId};

    use crate::{ContentQuery, ContentStore, MemoryStore, Order};

    fn message(parent: EntityId, text: &str) -> NewContent {
        NewContent {
            parent,
            author_id: PrincipalId::from("ada"),
            author_name: "Ada".into(),
            body: ContentBody::Message { text: text.into() },
        }
    }

    #[tokio::test]
    async fn query_by_parent_and_kind() {
        let store = MemoryStore::new();
        let project = EntityId::from_bytes([1; 16]);
        let other = EntityId::from_bytes([2; 16]);

        for text in ["first", "second", "third"] {
            store.insert_content(message(project, text)).await.unwrap();
        }
        store.insert_content(message(other, "elsewhere")).await.unwrap();

        let query = ContentQuery::new(project, ContentKind::Message)
            .order(Order::Ascending)
            .limit(2);
        let messages = store.query_content(&query).await.unwrap();
        let texts: Vec<_> = messages
            .iter()
            .map(|content| match &content.body {
                ContentBody::Message { text } => text.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(texts, vec!["first", "second"]);

        let announcements = store
            .query_content(&ContentQuery::new(project, ContentKind::Announcement))
            .await
            .unwrap();
        assert!(announcements.is_empty());
    }

    #[tokio::test]
    async fn replace_and_delete() {
        let store = MemoryStore::new();
        let content = store
            .insert_content(message(EntityId::from_bytes([1; 16]), "hello"))
            .await
            .unwrap();

        let body = ContentBody::Message {
            text: "edited".into(),
        };
        assert!(store.replace_body(&content.id, body.clone()).await.unwrap());

        let stored = store.get_content(&content.id).await.unwrap().unwrap();
        assert_eq!(stored.body, body);
        assert!(stored.updated_at.is_some());

        assert!(store.delete_content(&content.id).await.unwrap());
        assert!(!store.delete_content(&content.id).await.unwrap());
        assert!(!store.replace_body(&content.id, body).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_an_announcement_removes_its_comments() {
        let store = MemoryStore::new();
        let parent = EntityId::from_bytes([1; 16]);
        let announcement = store
            .insert_content(NewContent {
                body: ContentBody::Announcement {
                    text: "No lecture on Friday".into(),
                },
                ..message(parent, "")
            })
            .await
            .unwrap();
        for text in ["Thanks", "Noted"] {
            store
                .insert_content(NewContent {
                    body: ContentBody::Comment {
                        announcement_id: announcement.id,
                        text: text.into(),
                    },
                    ..message(parent, "")
                })
                .await
                .unwrap();
        }
        store.insert_content(message(parent, "unrelated")).await.unwrap();

        let query = ContentQuery::new(parent, ContentKind::Comment).refers_to(announcement.id);
        assert_eq!(store.query_content(&query).await.unwrap().len(), 2);

        assert!(store.delete_content(&announcement.id).await.unwrap());
        assert!(store.query_content(&query).await.unwrap().is_empty());
        let messages = store
            .query_content(&ContentQuery::new(parent, ContentKind::Message))
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
    }
}
