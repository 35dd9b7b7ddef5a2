/// Error types for the persistence layer
///
/// Every violation aborts the whole save batch: the store commits a batch
/// all-or-nothing, so a partially applied rewrite never persists. Errors
/// surface to the caller unmodified; the store performs no silent recovery
/// and no internal retries (transient [`StoreError::Storage`] faults are
/// the caller's retry decision).

use uuid::Uuid;

use crate::schema::EntityKind;

/// Result alias used throughout the store.
pub type StoreResult<T> = Result<T, StoreError>;

/// Unified error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A reference points at a row that does not exist (live or
    /// soft-deleted). Fatal to the batch; not retried.
    #[error("foreign key violation: {entity}.{column} references missing {referenced} row {value}")]
    ForeignKeyViolation {
        entity: EntityKind,
        column: &'static str,
        referenced: EntityKind,
        value: Uuid,
    },

    /// A hard delete was blocked because referencing rows still exist.
    /// Soft-deleted referencing rows count: they still resolve the
    /// reference. Fatal to the batch.
    #[error("referential integrity violation: {entity} row {id} is still referenced by {referenced_by}.{column}")]
    ReferentialIntegrityViolation {
        entity: EntityKind,
        id: Uuid,
        referenced_by: EntityKind,
        column: &'static str,
    },

    /// Duplicate slug / username / email / membership pair. Fatal to the
    /// batch.
    #[error("unique constraint violation: {constraint}")]
    UniqueConstraintViolation { constraint: String },

    /// Connectivity or engine fault. Caller-level retry is appropriate.
    #[error("storage error: {0}")]
    Storage(sqlx::Error),
}

/// PostgreSQL error class mapping.
///
/// The store's own checks normally catch integrity problems before the
/// engine does; this conversion is the backstop for anything that races
/// past them (and for the database-level RESTRICT constraints).
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            // unique_violation
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::UniqueConstraintViolation {
                    constraint: db_err
                        .constraint()
                        .unwrap_or("unknown")
                        .to_string(),
                };
            }
        }
        StoreError::Storage(err)
    }
}
