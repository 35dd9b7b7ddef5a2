/// Project membership model
///
/// Join rows between users and projects, unique per (project_id, user_id)
/// pair. Visibility requires the row, the project (and transitively its
/// organization), and the user to all be live.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::lifecycle::impl_lifecycle;
use crate::schema::EntityKind;
use crate::store::{Filter, Store};

use super::Entity;

/// Role within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Lead,
    Member,
    Viewer,
}

impl ProjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Lead => "lead",
            ProjectRole::Member => "member",
            ProjectRole::Viewer => "viewer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "lead" => Some(ProjectRole::Lead),
            "member" => Some(ProjectRole::Member),
            "viewer" => Some(ProjectRole::Viewer),
            _ => None,
        }
    }

    /// Can assign tasks and manage project members.
    pub fn can_manage_project(&self) -> bool {
        matches!(self, ProjectRole::Lead)
    }
}

/// Membership join row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: Uuid,

    pub project_id: Uuid,
    pub user_id: Uuid,

    /// Stored role string; parse with [`ProjectRole::from_str`]
    pub role: String,

    pub joined_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_lifecycle!(ProjectMember);

impl Entity for ProjectMember {
    const KIND: EntityKind = EntityKind::ProjectMember;
}

/// Input for adding a user to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectMember {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: ProjectRole,
}

impl ProjectMember {
    /// Builds a new membership with a fresh ID and a join timestamp.
    pub fn new(data: CreateProjectMember) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            user_id: data.user_id,
            role: data.role.as_str().to_string(),
            joined_at: now,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Parsed role, if the stored string is recognized.
    pub fn get_role(&self) -> Option<ProjectRole> {
        ProjectRole::from_str(&self.role)
    }

    /// Finds the membership for a specific (project, user) pair.
    pub async fn find_pair(
        store: &Store,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Self>> {
        let mut rows = store
            .query::<ProjectMember>(
                Filter::new()
                    .eq("project_id", project_id)
                    .eq("user_id", user_id)
                    .limit(1),
            )
            .await?;
        Ok(rows.pop())
    }

    /// Lists visible members of a project, oldest first.
    pub async fn list_by_project(store: &Store, project_id: Uuid) -> StoreResult<Vec<Self>> {
        store
            .query::<ProjectMember>(
                Filter::new().eq("project_id", project_id).order_by("joined_at ASC"),
            )
            .await
    }

    /// Counts visible members of a project.
    pub async fn count_by_project(store: &Store, project_id: Uuid) -> StoreResult<i64> {
        store
            .count(
                EntityKind::ProjectMember,
                Filter::new().eq("project_id", project_id),
            )
            .await
    }

    pub(crate) async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (id, project_id, user_id, role, joined_at,
                                         created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, project_id, user_id, role, joined_at, created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(self.project_id)
        .bind(self.user_id)
        .bind(&self.role)
        .bind(self.joined_at)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }

    pub(crate) async fn update(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            UPDATE project_members
            SET project_id = $2, user_id = $3, role = $4, joined_at = $5,
                updated_at = $6, deleted_at = COALESCE(deleted_at, $7)
            WHERE id = $1
            RETURNING id, project_id, user_id, role, joined_at, created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(self.project_id)
        .bind(self.user_id)
        .bind(&self.role)
        .bind(self.joined_at)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }
}
