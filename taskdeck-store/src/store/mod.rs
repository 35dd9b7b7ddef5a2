/// Persistence gateway
///
/// [`Store`] is the single entry point for reads and writes. Every write
/// goes through [`Store::save`]: the change interceptor rewrites the
/// pending batch (soft deletes, audit timestamps), referential checks run,
/// and the whole batch commits as one transaction, or none of it does.
/// Every read goes through [`Store::query`], which ANDs the composed
/// visibility predicate with the caller's filter unless the
/// `include_deleted` escape hatch is set.
///
/// Concurrency: one save is one transaction; the store adds no locking of
/// its own. Batches from concurrent callers commit in arbitrary relative
/// order and conflicting row writes resolve last-committed-wins under the
/// engine's isolation.
///
/// # Example
///
/// ```no_run
/// use taskdeck_store::models::user::{CreateUser, User};
/// use taskdeck_store::store::{Filter, Mutation, Store};
///
/// # async fn example(store: Store) -> Result<(), taskdeck_store::error::StoreError> {
/// let user = User::new(CreateUser {
///     full_name: "Ada Lovelace".to_string(),
///     username: "ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     avatar_url: None,
/// });
///
/// store.save(vec![Mutation::insert(user)]).await?;
///
/// let users = store.query::<User>(Filter::new().eq("username", "ada")).await?;
/// # Ok(())
/// # }
/// ```

pub mod interceptor;
mod integrity;
pub mod visibility;

use chrono::Utc;
use sqlx::postgres::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::db::pool::create_pool;
use crate::error::{StoreError, StoreResult};
use crate::models::{Entity, Record};
use crate::schema::EntityKind;

pub use interceptor::Mutation;

/// A value bound into a caller condition.
#[derive(Debug, Clone)]
pub enum Bind {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
}

impl From<Uuid> for Bind {
    fn from(v: Uuid) -> Self {
        Bind::Uuid(v)
    }
}

impl From<String> for Bind {
    fn from(v: String) -> Self {
        Bind::Text(v)
    }
}

impl From<&str> for Bind {
    fn from(v: &str) -> Self {
        Bind::Text(v.to_string())
    }
}

impl From<bool> for Bind {
    fn from(v: bool) -> Self {
        Bind::Bool(v)
    }
}

/// Caller-side query filter, combined with the visibility predicate by
/// the store.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(&'static str, Bind)>,
    include_deleted: bool,
    order_by: Option<&'static str>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality condition on a column.
    pub fn eq(mut self, column: &'static str, value: impl Into<Bind>) -> Self {
        self.conditions.push((column, value.into()));
        self
    }

    /// Bypasses the visibility filter entirely (administrative reads).
    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    /// Overrides the default `created_at DESC` ordering.
    pub fn order_by(mut self, clause: &'static str) -> Self {
        self.order_by = Some(clause);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// The persistence gateway.
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Wraps an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a pool from configuration and wraps it.
    pub async fn connect(config: StoreConfig) -> Result<Self, sqlx::Error> {
        let pool = create_pool(config.database()).await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool, for infrastructure concerns (health checks,
    /// shutdown).
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        crate::db::migrations::run_migrations(&self.pool).await
    }

    /// Commits a batch of pending mutations atomically.
    ///
    /// The interceptor rewrite is applied first (one `now` for the whole
    /// batch), then each mutation is checked and written inside a single
    /// transaction. Any violation aborts the batch; nothing partial ever
    /// persists.
    ///
    /// Returns one committed record per mutation, as stored: a re-deleted
    /// row, for instance, comes back with its original `deleted_at`.
    pub async fn save(&self, batch: Vec<Mutation>) -> StoreResult<Vec<Record>> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        let now = Utc::now();
        let batch = interceptor::apply_audit(batch, now);
        debug!(mutations = batch.len(), "Committing rewritten batch");

        let mut committed = Vec::with_capacity(batch.len());
        for mutation in batch {
            match mutation {
                Mutation::Insert(record) => {
                    integrity::check_references(&mut tx, &record).await?;
                    let stored = record.insert(&mut tx).await.map_err(StoreError::from)?;
                    committed.push(stored);
                }
                Mutation::Update(record) => {
                    integrity::check_references(&mut tx, &record).await?;
                    let stored = record.update(&mut tx).await.map_err(StoreError::from)?;
                    committed.push(stored);
                }
                // Only records outside the lifecycle contract reach the
                // engine as deletes; everything else was rewritten above.
                Mutation::Delete(record) => {
                    integrity::check_restrict(&mut tx, record.kind(), record.id()).await?;
                    let sql = format!("DELETE FROM {} WHERE id = $1", record.kind().table());
                    sqlx::query(&sql)
                        .bind(record.id())
                        .execute(&mut *tx)
                        .await
                        .map_err(StoreError::from)?;
                    committed.push(record);
                }
            }
        }

        tx.commit().await.map_err(StoreError::from)?;
        Ok(committed)
    }

    /// Inserts a single record. Convenience over [`Store::save`].
    pub async fn insert(&self, record: impl Into<Record>) -> StoreResult<Record> {
        let mut committed = self.save(vec![Mutation::Insert(record.into())]).await?;
        // save returns exactly one committed record per mutation
        Ok(committed.remove(0))
    }

    /// Updates a single record. Convenience over [`Store::save`].
    pub async fn update(&self, record: impl Into<Record>) -> StoreResult<Record> {
        let mut committed = self.save(vec![Mutation::Update(record.into())]).await?;
        Ok(committed.remove(0))
    }

    /// Deletes a single record (soft for lifecycle entities). Convenience
    /// over [`Store::save`].
    pub async fn delete(&self, record: impl Into<Record>) -> StoreResult<Record> {
        let mut committed = self.save(vec![Mutation::Delete(record.into())]).await?;
        Ok(committed.remove(0))
    }

    /// Fetches rows of `E` matching the filter, with the visibility
    /// predicate applied unless the filter opts out.
    pub async fn query<E: Entity>(&self, filter: Filter) -> StoreResult<Vec<E>> {
        let sql = build_select(E::KIND, &filter);
        let mut query = sqlx::query_as::<_, E>(&sql);
        for (_, bind) in &filter.conditions {
            query = match bind {
                Bind::Uuid(v) => query.bind(*v),
                Bind::Text(v) => query.bind(v.clone()),
                Bind::Bool(v) => query.bind(*v),
            };
        }
        query.fetch_all(&self.pool).await.map_err(StoreError::from)
    }

    /// Fetches a single visible row of `E` by ID.
    pub async fn find<E: Entity>(&self, id: Uuid) -> StoreResult<Option<E>> {
        let mut rows = self.query::<E>(Filter::new().eq("id", id).limit(1)).await?;
        Ok(rows.pop())
    }

    /// Counts rows matching the filter under the same visibility rules as
    /// [`Store::query`].
    pub async fn count(&self, kind: EntityKind, filter: Filter) -> StoreResult<i64> {
        let sql = build_count(kind, &filter);
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for (_, bind) in &filter.conditions {
            query = match bind {
                Bind::Uuid(v) => query.bind(*v),
                Bind::Text(v) => query.bind(v.clone()),
                Bind::Bool(v) => query.bind(*v),
            };
        }
        query.fetch_one(&self.pool).await.map_err(StoreError::from)
    }

    /// Physically removes a row, bypassing soft deletion.
    ///
    /// This is the administrative path; the restrict policy still applies,
    /// and any referencing row (live or soft-deleted) blocks it.
    ///
    /// Returns whether a row was removed.
    pub async fn hard_delete(&self, kind: EntityKind, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        integrity::check_restrict(&mut tx, kind, id).await?;

        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(result.rows_affected() > 0)
    }
}

fn build_select(kind: EntityKind, filter: &Filter) -> String {
    let table = kind.table();
    let mut sql = format!(
        "SELECT {} FROM {} WHERE {}",
        kind.columns(),
        table,
        visibility::predicate(kind, filter.include_deleted)
    );

    for (i, (column, _)) in filter.conditions.iter().enumerate() {
        sql.push_str(&format!(" AND {table}.{column} = ${}", i + 1));
    }

    sql.push_str(" ORDER BY ");
    sql.push_str(filter.order_by.unwrap_or("created_at DESC"));

    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = filter.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    sql
}

fn build_count(kind: EntityKind, filter: &Filter) -> String {
    let table = kind.table();
    let mut sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        table,
        visibility::predicate(kind, filter.include_deleted)
    );

    for (i, (column, _)) in filter.conditions.iter().enumerate() {
        sql.push_str(&format!(" AND {table}.{column} = ${}", i + 1));
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_select_default_visibility() {
        let sql = build_select(EntityKind::User, &Filter::new());
        assert_eq!(
            sql,
            "SELECT id, full_name, username, email, password_hash, avatar_url, \
             last_login_at, created_at, updated_at, deleted_at \
             FROM users WHERE users.deleted_at IS NULL ORDER BY created_at DESC"
        );
    }

    #[test]
    fn test_build_select_numbers_placeholders() {
        let filter = Filter::new()
            .eq("organization_id", Uuid::nil())
            .eq("slug", "engine")
            .limit(1);
        let sql = build_select(EntityKind::Project, &filter);

        assert!(sql.contains("projects.organization_id = $1"));
        assert!(sql.contains("projects.slug = $2"));
        assert!(sql.ends_with("ORDER BY created_at DESC LIMIT 1"));
    }

    #[test]
    fn test_build_select_include_deleted_drops_predicate() {
        let filter = Filter::new().eq("id", Uuid::nil()).include_deleted(true);
        let sql = build_select(EntityKind::Task, &filter);

        assert!(sql.contains("WHERE TRUE AND tasks.id = $1"));
        assert!(!sql.contains("deleted_at IS NULL"));
    }

    #[test]
    fn test_build_select_visibility_and_caller_filter_compose() {
        let filter = Filter::new().eq("organization_id", Uuid::nil());
        let sql = build_select(EntityKind::Project, &filter);

        // Visibility first, caller conditions ANDed after
        assert!(sql.contains("projects.deleted_at IS NULL"));
        assert!(sql.contains("organizations.deleted_at IS NULL"));
        assert!(sql.contains(" AND projects.organization_id = $1"));
    }

    #[test]
    fn test_build_select_custom_order_and_offset() {
        let filter = Filter::new().order_by("joined_at ASC").limit(10).offset(20);
        let sql = build_select(EntityKind::OrganizationMember, &filter);

        assert!(sql.ends_with("ORDER BY joined_at ASC LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn test_build_count_has_no_ordering() {
        let filter = Filter::new().eq("project_id", Uuid::nil());
        let sql = build_count(EntityKind::ProjectMember, &filter);

        assert!(sql.starts_with("SELECT COUNT(*) FROM project_members WHERE"));
        assert!(sql.contains("project_members.project_id = $1"));
        assert!(!sql.contains("ORDER BY"));
    }
}
