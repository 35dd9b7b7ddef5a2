/// Organization model
///
/// Organizations are the tenant boundary: projects, tasks and the audit
/// trail all hang off one, and its deletion state gates the visibility of
/// everything below it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY,
///     name VARCHAR(150) NOT NULL,
///     slug VARCHAR(100) NOT NULL UNIQUE,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
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

/// Organization owning projects and memberships.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Unique URL slug
    pub slug: String,

    /// Owning user; the reference restricts, so the owner cannot be
    /// hard-deleted while the organization row exists
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_lifecycle!(Organization);

impl Entity for Organization {
    const KIND: EntityKind = EntityKind::Organization;
}

/// Input for creating a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub slug: String,
    pub owner_id: Uuid,
}

impl Organization {
    /// Builds a new organization record with a fresh ID.
    pub fn new(data: CreateOrganization) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: data.name,
            slug: data.slug,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Finds a live organization by slug.
    pub async fn find_by_slug(store: &Store, slug: &str) -> StoreResult<Option<Self>> {
        let mut rows = store
            .query::<Organization>(Filter::new().eq("slug", slug).limit(1))
            .await?;
        Ok(rows.pop())
    }

    /// Lists live organizations owned by a user.
    pub async fn list_by_owner(store: &Store, owner_id: Uuid) -> StoreResult<Vec<Self>> {
        store
            .query::<Organization>(Filter::new().eq("owner_id", owner_id))
            .await
    }

    pub(crate) async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (id, name, slug, owner_id, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, slug, owner_id, created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.slug)
        .bind(self.owner_id)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }

    pub(crate) async fn update(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = $2, slug = $3, owner_id = $4, updated_at = $5,
                deleted_at = COALESCE(deleted_at, $6)
            WHERE id = $1
            RETURNING id, name, slug, owner_id, created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.slug)
        .bind(self.owner_id)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Lifecycle;

    #[test]
    fn test_new_organization_is_live() {
        let org = Organization::new(CreateOrganization {
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            owner_id: Uuid::new_v4(),
        });

        assert!(!org.is_deleted());
        assert_eq!(org.created_at, org.updated_at);
    }
}
