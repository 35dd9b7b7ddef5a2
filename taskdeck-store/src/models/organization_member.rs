/// Organization membership model
///
/// Join rows between users and organizations, keyed by a surrogate ID
/// with a unique (organization_id, user_id) pair. A membership is visible
/// only while the row itself, the organization, and the user are all
/// live.
///
/// # Roles
///
/// - **owner**: full control, may delete the organization
/// - **admin**: manages members and projects
/// - **member**: works on projects and tasks
/// - **viewer**: read-only access

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::lifecycle::impl_lifecycle;
use crate::schema::EntityKind;
use crate::store::{Filter, Store};

use super::Entity;

/// Role within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationRole {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl OrganizationRole {
    /// Converts role to its stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationRole::Owner => "owner",
            OrganizationRole::Admin => "admin",
            OrganizationRole::Member => "member",
            OrganizationRole::Viewer => "viewer",
        }
    }

    /// Parses role from its stored string form.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(OrganizationRole::Owner),
            "admin" => Some(OrganizationRole::Admin),
            "member" => Some(OrganizationRole::Member),
            "viewer" => Some(OrganizationRole::Viewer),
            _ => None,
        }
    }

    /// Can add, remove and re-role members.
    pub fn can_manage_members(&self) -> bool {
        matches!(self, OrganizationRole::Owner | OrganizationRole::Admin)
    }

    /// Can create projects in the organization.
    pub fn can_create_projects(&self) -> bool {
        !matches!(self, OrganizationRole::Viewer)
    }
}

/// Membership join row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrganizationMember {
    pub id: Uuid,

    /// Organization side of the pair
    pub organization_id: Uuid,

    /// User side of the pair
    pub user_id: Uuid,

    /// Stored role string; parse with [`OrganizationRole::from_str`]
    pub role: String,

    /// When the user joined
    pub joined_at: DateTime<Utc>,

    /// When the user left, if they did; distinct from soft deletion so
    /// membership history survives
    pub left_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_lifecycle!(OrganizationMember);

impl Entity for OrganizationMember {
    const KIND: EntityKind = EntityKind::OrganizationMember;
}

/// Input for adding a user to an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganizationMember {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: OrganizationRole,
}

impl OrganizationMember {
    /// Builds a new membership with a fresh ID and a join timestamp.
    pub fn new(data: CreateOrganizationMember) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id: data.organization_id,
            user_id: data.user_id,
            role: data.role.as_str().to_string(),
            joined_at: now,
            left_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Parsed role, if the stored string is recognized.
    pub fn get_role(&self) -> Option<OrganizationRole> {
        OrganizationRole::from_str(&self.role)
    }

    /// Marks the member as having left without deleting the row.
    pub fn leave(&mut self, at: DateTime<Utc>) {
        self.left_at = Some(at);
    }

    /// Finds the membership for a specific (organization, user) pair.
    pub async fn find_pair(
        store: &Store,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Self>> {
        let mut rows = store
            .query::<OrganizationMember>(
                Filter::new()
                    .eq("organization_id", organization_id)
                    .eq("user_id", user_id)
                    .limit(1),
            )
            .await?;
        Ok(rows.pop())
    }

    /// Lists visible members of an organization, oldest first.
    pub async fn list_by_organization(
        store: &Store,
        organization_id: Uuid,
    ) -> StoreResult<Vec<Self>> {
        store
            .query::<OrganizationMember>(
                Filter::new()
                    .eq("organization_id", organization_id)
                    .order_by("joined_at ASC"),
            )
            .await
    }

    /// Lists visible memberships of a user, oldest first.
    pub async fn list_by_user(store: &Store, user_id: Uuid) -> StoreResult<Vec<Self>> {
        store
            .query::<OrganizationMember>(
                Filter::new().eq("user_id", user_id).order_by("joined_at ASC"),
            )
            .await
    }

    pub(crate) async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, OrganizationMember>(
            r#"
            INSERT INTO organization_members (id, organization_id, user_id, role, joined_at,
                                              left_at, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, organization_id, user_id, role, joined_at, left_at,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(self.organization_id)
        .bind(self.user_id)
        .bind(&self.role)
        .bind(self.joined_at)
        .bind(self.left_at)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }

    pub(crate) async fn update(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, OrganizationMember>(
            r#"
            UPDATE organization_members
            SET organization_id = $2, user_id = $3, role = $4, joined_at = $5,
                left_at = $6, updated_at = $7, deleted_at = COALESCE(deleted_at, $8)
            WHERE id = $1
            RETURNING id, organization_id, user_id, role, joined_at, left_at,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(self.organization_id)
        .bind(self.user_id)
        .bind(&self.role)
        .bind(self.joined_at)
        .bind(self.left_at)
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
    fn test_role_round_trip() {
        for role in [
            OrganizationRole::Owner,
            OrganizationRole::Admin,
            OrganizationRole::Member,
            OrganizationRole::Viewer,
        ] {
            assert_eq!(OrganizationRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(OrganizationRole::from_str("intruder"), None);
    }

    #[test]
    fn test_role_permissions() {
        assert!(OrganizationRole::Owner.can_manage_members());
        assert!(OrganizationRole::Admin.can_manage_members());
        assert!(!OrganizationRole::Member.can_manage_members());
        assert!(!OrganizationRole::Viewer.can_manage_members());

        assert!(OrganizationRole::Member.can_create_projects());
        assert!(!OrganizationRole::Viewer.can_create_projects());
    }

    #[test]
    fn test_leave_keeps_row_live() {
        let mut member = OrganizationMember::new(CreateOrganizationMember {
            organization_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: OrganizationRole::Member,
        });

        member.leave(Utc::now());
        assert!(member.left_at.is_some());
        assert!(member.deleted_at.is_none());
    }
}
