/// Comment model
///
/// Threaded comments on tasks. Replies reference their parent through
/// `parent_comment_id`; traversal is an explicit per-level fetch
/// ([`Comment::list_replies`]), never an eagerly loaded graph, so reply
/// depth is bounded by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::lifecycle::impl_lifecycle;
use crate::schema::EntityKind;
use crate::store::{Filter, Store};

use super::Entity;

/// Comment on a task, optionally replying to another comment.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,

    /// Commented task
    pub task_id: Uuid,

    /// Authoring user
    pub author_id: Uuid,

    /// Parent comment for threaded replies
    pub parent_comment_id: Option<Uuid>,

    pub content: String,

    /// Set once the content has been edited after creation
    pub is_edited: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_lifecycle!(Comment);

impl Entity for Comment {
    const KIND: EntityKind = EntityKind::Comment;
}

/// Input for creating a new comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
}

impl Comment {
    /// Builds a new comment with a fresh ID.
    pub fn new(data: CreateComment) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            task_id: data.task_id,
            author_id: data.author_id,
            parent_comment_id: data.parent_comment_id,
            content: data.content,
            is_edited: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Replaces the content and flags the comment as edited.
    pub fn edit(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.is_edited = true;
    }

    /// Lists visible comments of a task, oldest first.
    pub async fn list_by_task(store: &Store, task_id: Uuid) -> StoreResult<Vec<Self>> {
        store
            .query::<Comment>(Filter::new().eq("task_id", task_id).order_by("created_at ASC"))
            .await
    }

    /// Lists visible direct replies to a comment, oldest first. Deeper
    /// levels are fetched by calling this again per reply.
    pub async fn list_replies(store: &Store, parent_comment_id: Uuid) -> StoreResult<Vec<Self>> {
        store
            .query::<Comment>(
                Filter::new()
                    .eq("parent_comment_id", parent_comment_id)
                    .order_by("created_at ASC"),
            )
            .await
    }

    pub(crate) async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, task_id, author_id, parent_comment_id, content,
                                  is_edited, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, task_id, author_id, parent_comment_id, content, is_edited,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(self.task_id)
        .bind(self.author_id)
        .bind(self.parent_comment_id)
        .bind(&self.content)
        .bind(self.is_edited)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }

    pub(crate) async fn update(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET task_id = $2, author_id = $3, parent_comment_id = $4, content = $5,
                is_edited = $6, updated_at = $7, deleted_at = COALESCE(deleted_at, $8)
            WHERE id = $1
            RETURNING id, task_id, author_id, parent_comment_id, content, is_edited,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(self.task_id)
        .bind(self.author_id)
        .bind(self.parent_comment_id)
        .bind(&self.content)
        .bind(self.is_edited)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_comment_is_unedited() {
        let comment = Comment::new(CreateComment {
            task_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            parent_comment_id: None,
            content: "First".to_string(),
        });

        assert!(!comment.is_edited);
        assert!(comment.parent_comment_id.is_none());
    }

    #[test]
    fn test_edit_flags_comment() {
        let mut comment = Comment::new(CreateComment {
            task_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            parent_comment_id: None,
            content: "First".to_string(),
        });

        comment.edit("First, actually");
        assert!(comment.is_edited);
        assert_eq!(comment.content, "First, actually");
    }
}
