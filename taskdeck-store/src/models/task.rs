/// Task model
///
/// Tasks belong to exactly one project and carry a denormalized
/// `organization_id` so organization-wide listings avoid a join. The
/// visibility filter still walks the real chain (task → project →
/// organization), so the denormalized column is for scoping only.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE RESTRICT,
///     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE RESTRICT,
///     title VARCHAR(150) NOT NULL,
///     description TEXT,
///     status VARCHAR(20) NOT NULL DEFAULT 'todo',
///     priority VARCHAR(20) NOT NULL DEFAULT 'medium',
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     assigned_to UUID REFERENCES users(id) ON DELETE RESTRICT,
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL,
///     deleted_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::lifecycle::impl_lifecycle;
use crate::schema::EntityKind;
use crate::store::{Filter, Store};

use super::Entity;

/// Task workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Archived,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            "archived" => Some(TaskStatus::Archived),
            _ => None,
        }
    }

    /// Whether the task no longer counts as open work.
    pub fn is_closed(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Archived)
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            "critical" => Some(TaskPriority::Critical),
            _ => None,
        }
    }
}

/// Task within a project.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// Denormalized organization for fast scoping
    pub organization_id: Uuid,

    pub title: String,
    pub description: Option<String>,

    /// Stored status string; parse with [`TaskStatus::from_str`]
    pub status: String,

    /// Stored priority string; parse with [`TaskPriority::from_str`]
    pub priority: String,

    /// Creating user
    pub created_by: Uuid,

    /// Assignee, if any
    pub assigned_to: Option<Uuid>,

    pub due_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_lifecycle!(Task);

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;
}

/// Input for creating a new task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

impl Task {
    /// Builds a new task in `todo` status with a fresh ID.
    pub fn new(data: CreateTask) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            organization_id: data.organization_id,
            title: data.title,
            description: data.description,
            status: TaskStatus::Todo.as_str().to_string(),
            priority: data.priority.as_str().to_string(),
            created_by: data.created_by,
            assigned_to: data.assigned_to,
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Parsed status, if the stored string is recognized.
    pub fn get_status(&self) -> Option<TaskStatus> {
        TaskStatus::from_str(&self.status)
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status.as_str().to_string();
    }

    /// Parsed priority, if the stored string is recognized.
    pub fn get_priority(&self) -> Option<TaskPriority> {
        TaskPriority::from_str(&self.priority)
    }

    /// A task is overdue when its due date has passed and it is still
    /// open.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match (self.due_date, self.get_status()) {
            (Some(due), Some(status)) => due < now && !status.is_closed(),
            (Some(due), None) => due < now,
            (None, _) => false,
        }
    }

    /// Lists visible tasks of a project, newest first.
    pub async fn list_by_project(
        store: &Store,
        project_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Self>> {
        store
            .query::<Task>(
                Filter::new()
                    .eq("project_id", project_id)
                    .limit(limit)
                    .offset(offset),
            )
            .await
    }

    /// Lists visible tasks of an organization filtered by status (uses the
    /// denormalized organization column and its composite index).
    pub async fn list_by_organization_status(
        store: &Store,
        organization_id: Uuid,
        status: TaskStatus,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Self>> {
        store
            .query::<Task>(
                Filter::new()
                    .eq("organization_id", organization_id)
                    .eq("status", status.as_str())
                    .limit(limit)
                    .offset(offset),
            )
            .await
    }

    /// Lists visible tasks assigned to a user, newest first.
    pub async fn list_by_assignee(store: &Store, user_id: Uuid) -> StoreResult<Vec<Self>> {
        store
            .query::<Task>(Filter::new().eq("assigned_to", user_id))
            .await
    }

    /// Counts visible tasks in a project.
    pub async fn count_by_project(store: &Store, project_id: Uuid) -> StoreResult<i64> {
        store
            .count(EntityKind::Task, Filter::new().eq("project_id", project_id))
            .await
    }

    pub(crate) async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, project_id, organization_id, title, description, status,
                               priority, created_by, assigned_to, due_date,
                               created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, project_id, organization_id, title, description, status, priority,
                      created_by, assigned_to, due_date, created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(self.project_id)
        .bind(self.organization_id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.status)
        .bind(&self.priority)
        .bind(self.created_by)
        .bind(self.assigned_to)
        .bind(self.due_date)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }

    pub(crate) async fn update(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET project_id = $2, organization_id = $3, title = $4, description = $5,
                status = $6, priority = $7, created_by = $8, assigned_to = $9,
                due_date = $10, updated_at = $11, deleted_at = COALESCE(deleted_at, $12)
            WHERE id = $1
            RETURNING id, project_id, organization_id, title, description, status, priority,
                      created_by, assigned_to, due_date, created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(self.project_id)
        .bind(self.organization_id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.status)
        .bind(&self.priority)
        .bind(self.created_by)
        .bind(self.assigned_to)
        .bind(self.due_date)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Task {
        Task::new(CreateTask {
            project_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            title: "Write tests".to_string(),
            description: None,
            priority: TaskPriority::High,
            created_by: Uuid::new_v4(),
            assigned_to: None,
            due_date: None,
        })
    }

    #[test]
    fn test_new_task_defaults() {
        let task = sample();
        assert_eq!(task.get_status(), Some(TaskStatus::Todo));
        assert_eq!(task.get_priority(), Some(TaskPriority::High));
        assert!(task.deleted_at.is_none());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Done,
            TaskStatus::Archived,
        ] {
            assert_eq!(TaskStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::from_str("blocked"), None);
    }

    #[test]
    fn test_closed_statuses() {
        assert!(!TaskStatus::Todo.is_closed());
        assert!(!TaskStatus::InProgress.is_closed());
        assert!(TaskStatus::Done.is_closed());
        assert!(TaskStatus::Archived.is_closed());
    }

    #[test]
    fn test_is_overdue() {
        let now = Utc::now();
        let mut task = sample();

        // No due date: never overdue
        assert!(!task.is_overdue(now));

        task.due_date = Some(now - Duration::hours(1));
        assert!(task.is_overdue(now));

        // Closing the task clears the overdue state
        task.set_status(TaskStatus::Done);
        assert!(!task.is_overdue(now));

        task.set_status(TaskStatus::InProgress);
        task.due_date = Some(now + Duration::hours(1));
        assert!(!task.is_overdue(now));
    }
}
