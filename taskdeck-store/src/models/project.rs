/// Project model
///
/// Projects belong to exactly one organization; the slug is unique within
/// that organization, not globally. A project's visibility folds in its
/// organization's liveness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::lifecycle::impl_lifecycle;
use crate::schema::EntityKind;
use crate::store::{Filter, Store};

use super::Entity;

/// Project status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Paused,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProjectStatus::Active),
            "paused" => Some(ProjectStatus::Paused),
            "completed" => Some(ProjectStatus::Completed),
            "archived" => Some(ProjectStatus::Archived),
            _ => None,
        }
    }
}

/// Project scoped to an organization.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    pub title: String,

    /// Slug unique within the organization
    pub slug: String,

    pub description: Option<String>,

    /// Stored status string; parse with [`ProjectStatus::from_str`]
    pub status: String,

    /// Creating user
    pub created_by: Uuid,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_lifecycle!(Project);

impl Entity for Project {
    const KIND: EntityKind = EntityKind::Project;
}

/// Input for creating a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub organization_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Project {
    /// Builds a new project in `active` status with a fresh ID.
    pub fn new(data: CreateProject) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id: data.organization_id,
            title: data.title,
            slug: data.slug,
            description: data.description,
            status: ProjectStatus::Active.as_str().to_string(),
            created_by: data.created_by,
            start_date: data.start_date,
            end_date: data.end_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Parsed status, if the stored string is recognized.
    pub fn get_status(&self) -> Option<ProjectStatus> {
        ProjectStatus::from_str(&self.status)
    }

    pub fn set_status(&mut self, status: ProjectStatus) {
        self.status = status.as_str().to_string();
    }

    /// Lists visible projects of an organization, newest first.
    ///
    /// With `include_deleted` the visibility filter is bypassed entirely
    /// (the administrative escape hatch).
    pub async fn list_by_organization(
        store: &Store,
        organization_id: Uuid,
        include_deleted: bool,
    ) -> StoreResult<Vec<Self>> {
        store
            .query::<Project>(
                Filter::new()
                    .eq("organization_id", organization_id)
                    .include_deleted(include_deleted),
            )
            .await
    }

    /// Finds a visible project by its organization-scoped slug.
    pub async fn find_by_slug(
        store: &Store,
        organization_id: Uuid,
        slug: &str,
    ) -> StoreResult<Option<Self>> {
        let mut rows = store
            .query::<Project>(
                Filter::new()
                    .eq("organization_id", organization_id)
                    .eq("slug", slug)
                    .limit(1),
            )
            .await?;
        Ok(rows.pop())
    }

    pub(crate) async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, organization_id, title, slug, description, status,
                                  created_by, start_date, end_date, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, organization_id, title, slug, description, status, created_by,
                      start_date, end_date, created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(self.organization_id)
        .bind(&self.title)
        .bind(&self.slug)
        .bind(&self.description)
        .bind(&self.status)
        .bind(self.created_by)
        .bind(self.start_date)
        .bind(self.end_date)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }

    pub(crate) async fn update(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET organization_id = $2, title = $3, slug = $4, description = $5, status = $6,
                created_by = $7, start_date = $8, end_date = $9, updated_at = $10,
                deleted_at = COALESCE(deleted_at, $11)
            WHERE id = $1
            RETURNING id, organization_id, title, slug, description, status, created_by,
                      start_date, end_date, created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(self.organization_id)
        .bind(&self.title)
        .bind(&self.slug)
        .bind(&self.description)
        .bind(&self.status)
        .bind(self.created_by)
        .bind(self.start_date)
        .bind(self.end_date)
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
    fn test_new_project_defaults_to_active() {
        let project = Project::new(CreateProject {
            organization_id: Uuid::new_v4(),
            title: "Engine".to_string(),
            slug: "engine".to_string(),
            description: None,
            created_by: Uuid::new_v4(),
            start_date: None,
            end_date: None,
        });

        assert_eq!(project.get_status(), Some(ProjectStatus::Active));
        assert!(project.deleted_at.is_none());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ProjectStatus::Active,
            ProjectStatus::Paused,
            ProjectStatus::Completed,
            ProjectStatus::Archived,
        ] {
            assert_eq!(ProjectStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ProjectStatus::from_str("cancelled"), None);
    }

    #[test]
    fn test_set_status() {
        let mut project = Project::new(CreateProject {
            organization_id: Uuid::new_v4(),
            title: "Engine".to_string(),
            slug: "engine".to_string(),
            description: None,
            created_by: Uuid::new_v4(),
            start_date: None,
            end_date: None,
        });

        project.set_status(ProjectStatus::Completed);
        assert_eq!(project.status, "completed");
    }
}
