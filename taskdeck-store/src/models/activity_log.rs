/// Activity log model
///
/// Append-only audit trail. Activity logs sit outside the lifecycle
/// contract: they carry identity and a creation timestamp only, are never
/// soft-deleted, and a delete reaches the engine as a physical delete
/// (still guarded by the restrict policy). Their visibility is entirely
/// derived from the owning organization's liveness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::schema::EntityKind;
use crate::store::{Filter, Store};

use super::Entity;

/// One audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityLog {
    pub id: Uuid,

    /// Owning organization; gates visibility
    pub organization_id: Uuid,

    /// Acting user, if the action was user-initiated
    pub user_id: Option<Uuid>,

    /// Short action description, e.g. "task.created"
    pub action: Option<String>,

    /// Entity the action touched, if any
    pub entity_id: Option<Uuid>,

    /// State snapshots around the change
    pub old_value: Option<JsonValue>,
    pub new_value: Option<JsonValue>,

    pub created_at: DateTime<Utc>,
}

impl Entity for ActivityLog {
    const KIND: EntityKind = EntityKind::ActivityLog;
}

impl ActivityLog {
    /// Builds a new audit entry, ready to be appended through the store.
    pub fn record(
        organization_id: Uuid,
        user_id: Option<Uuid>,
        action: impl Into<String>,
        entity_id: Option<Uuid>,
        old_value: Option<JsonValue>,
        new_value: Option<JsonValue>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            action: Some(action.into()),
            entity_id,
            old_value,
            new_value,
            created_at: Utc::now(),
        }
    }

    /// Lists entries for an organization, newest first. Entries of a
    /// soft-deleted organization are hidden along with it.
    pub async fn list_by_organization(
        store: &Store,
        organization_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Self>> {
        store
            .query::<ActivityLog>(
                Filter::new()
                    .eq("organization_id", organization_id)
                    .limit(limit)
                    .offset(offset),
            )
            .await
    }

    pub(crate) async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (id, organization_id, user_id, action, entity_id,
                                       old_value, new_value, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, organization_id, user_id, action, entity_id, old_value,
                      new_value, created_at
            "#,
        )
        .bind(self.id)
        .bind(self.organization_id)
        .bind(self.user_id)
        .bind(&self.action)
        .bind(self.entity_id)
        .bind(&self.old_value)
        .bind(&self.new_value)
        .bind(self.created_at)
        .fetch_one(&mut *conn)
        .await
    }

    // Audit entries are append-only by convention; this write path exists
    // for physical parity with the other records but is not reachable
    // through normal usage.
    pub(crate) async fn update(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            UPDATE activity_logs
            SET user_id = $2, action = $3, entity_id = $4, old_value = $5, new_value = $6
            WHERE id = $1
            RETURNING id, organization_id, user_id, action, entity_id, old_value,
                      new_value, created_at
            "#,
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(&self.action)
        .bind(self.entity_id)
        .bind(&self.old_value)
        .bind(&self.new_value)
        .fetch_one(&mut *conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_builds_entry() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        let task = Uuid::new_v4();

        let entry = ActivityLog::record(
            org,
            Some(user),
            "task.status_changed",
            Some(task),
            Some(json!({"status": "todo"})),
            Some(json!({"status": "in_progress"})),
        );

        assert_eq!(entry.organization_id, org);
        assert_eq!(entry.user_id, Some(user));
        assert_eq!(entry.action.as_deref(), Some("task.status_changed"));
        assert_eq!(entry.entity_id, Some(task));
    }
}
