/// Referential integrity policy
///
/// Restrict-only: no relationship in the schema cascades or nulls on
/// delete. Two checks enforce the policy inside the save transaction, with
/// the database-level `ON DELETE RESTRICT` constraints as backstop:
///
/// - [`check_references`]: every populated foreign key on a row being
///   written must resolve to an existing row. Existence is checked without
///   any visibility filter: a soft-deleted target still exists and still
///   satisfies the reference.
/// - [`check_restrict`]: a hard delete is rejected while referencing rows
///   exist. Soft-deleted referencing rows count too; removing their target
///   would leave them dangling (see DESIGN.md for the policy decision).

use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::Record;
use crate::schema::{self, EntityKind};

/// Verifies that every populated foreign key on `record` resolves.
pub(crate) async fn check_references(
    conn: &mut PgConnection,
    record: &Record,
) -> StoreResult<()> {
    for fk in record.references() {
        let Some(value) = fk.value else { continue };

        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            fk.references.table()
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_one(&mut *conn)
            .await
            .map_err(StoreError::from)?;

        if !exists {
            return Err(StoreError::ForeignKeyViolation {
                entity: record.kind(),
                column: fk.column,
                referenced: fk.references,
                value,
            });
        }
    }
    Ok(())
}

/// Verifies that no row still references `id` before a hard delete.
pub(crate) async fn check_restrict(
    conn: &mut PgConnection,
    kind: EntityKind,
    id: Uuid,
) -> StoreResult<()> {
    for rel in schema::referencing(kind) {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1)",
            rel.entity.table(),
            rel.column
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .map_err(StoreError::from)?;

        if exists {
            return Err(StoreError::ReferentialIntegrityViolation {
                entity: kind,
                id,
                referenced_by: rel.entity,
                column: rel.column,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // The checks themselves need a live database and are exercised by the
    // integration suites; what can be verified here is that the policy
    // metadata they walk is complete.

    #[test]
    fn test_restrict_covers_every_inbound_edge() {
        let inbound: Vec<_> = schema::referencing(EntityKind::Organization).collect();
        let tables: Vec<_> = inbound.iter().map(|r| r.entity.table()).collect();

        assert!(tables.contains(&"organization_members"));
        assert!(tables.contains(&"projects"));
        assert!(tables.contains(&"tasks"));
        assert!(tables.contains(&"activity_logs"));
    }

    #[test]
    fn test_nothing_references_the_audit_trail() {
        assert_eq!(schema::referencing(EntityKind::ActivityLog).count(), 0);
    }
}
