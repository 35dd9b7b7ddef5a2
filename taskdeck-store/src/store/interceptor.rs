/// Change interceptor
///
/// Rewrites a pending mutation batch before it is flushed: stamps audit
/// timestamps and converts deletes of lifecycle entities into soft-delete
/// updates. The rewrite is a pure function over the in-memory batch (no
/// I/O), so it is testable without a storage engine, and the store runs it
/// unconditionally on every save; there is no per-call opt-out.
///
/// One `now` is captured per batch, before processing starts: every row in
/// a batch shares an identical timestamp, which keeps ordering inside a
/// batch trivial and tests deterministic.

use chrono::{DateTime, Utc};

use crate::models::Record;

/// A pending change to a single record.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// New row to be written
    Insert(Record),

    /// Existing row to be overwritten
    Update(Record),

    /// Row the caller asked to remove; the interceptor converts this to a
    /// soft-delete [`Mutation::Update`] for lifecycle entities
    Delete(Record),
}

impl Mutation {
    pub fn insert(record: impl Into<Record>) -> Self {
        Mutation::Insert(record.into())
    }

    pub fn update(record: impl Into<Record>) -> Self {
        Mutation::Update(record.into())
    }

    pub fn delete(record: impl Into<Record>) -> Self {
        Mutation::Delete(record.into())
    }

    /// The record carried by this mutation.
    pub fn record(&self) -> &Record {
        match self {
            Mutation::Insert(r) | Mutation::Update(r) | Mutation::Delete(r) => r,
        }
    }
}

/// Rewrites the batch with one shared timestamp.
///
/// - **Insert**: `created_at = updated_at = now`; `deleted_at` is forced
///   to null, whatever the caller put there.
/// - **Update**: `updated_at = now`; the caller's `deleted_at` is
///   discarded (deletion state only changes through a delete mutation),
///   and `created_at` never reaches the UPDATE statement.
/// - **Delete**: lifecycle entities are converted in place to an update
///   with `deleted_at = updated_at = now`. An already-set `deleted_at` is
///   preserved: first write wins.
///
/// Records outside the lifecycle contract are stamped on insert and
/// otherwise left untouched: their deletes reach the engine as physical
/// deletes, their updates pass through as-is.
pub fn apply_audit(batch: Vec<Mutation>, now: DateTime<Utc>) -> Vec<Mutation> {
    batch.into_iter().map(|m| rewrite(m, now)).collect()
}

fn rewrite(mutation: Mutation, now: DateTime<Utc>) -> Mutation {
    match mutation {
        Mutation::Insert(mut record) => {
            match record.lifecycle_mut() {
                Some(lc) => {
                    lc.set_created_at(now);
                    lc.set_updated_at(now);
                    lc.set_deleted_at(None);
                }
                None => record.stamp_append_only(now),
            }
            Mutation::Insert(record)
        }
        Mutation::Update(mut record) => {
            if let Some(lc) = record.lifecycle_mut() {
                lc.set_updated_at(now);
                lc.set_deleted_at(None);
            }
            Mutation::Update(record)
        }
        Mutation::Delete(mut record) => match record.lifecycle_mut() {
            Some(lc) => {
                if lc.deleted_at().is_none() {
                    lc.set_deleted_at(Some(now));
                }
                lc.set_updated_at(now);
                Mutation::Update(record)
            }
            None => Mutation::Delete(record),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Lifecycle;
    use crate::models::activity_log::ActivityLog;
    use crate::models::user::{CreateUser, User};
    use chrono::Duration;
    use uuid::Uuid;

    fn sample_user() -> User {
        User::new(CreateUser {
            full_name: "Ada Lovelace".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            avatar_url: None,
        })
    }

    fn unwrap_user(mutation: &Mutation) -> &User {
        match mutation.record() {
            crate::models::Record::User(u) => u,
            other => panic!("expected user record, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_insert_stamps_both_timestamps() {
        let now = Utc::now();
        let mut user = sample_user();
        // Caller-supplied values must not survive
        user.created_at = now - Duration::days(30);
        user.updated_at = now - Duration::days(30);

        let batch = apply_audit(vec![Mutation::insert(user)], now);
        let user = unwrap_user(&batch[0]);

        assert_eq!(user.created_at, now);
        assert_eq!(user.updated_at, now);
        assert!(matches!(batch[0], Mutation::Insert(_)));
    }

    #[test]
    fn test_insert_forces_deleted_at_to_null() {
        let now = Utc::now();
        let mut user = sample_user();
        user.deleted_at = Some(now - Duration::days(1));

        let batch = apply_audit(vec![Mutation::insert(user)], now);
        assert!(unwrap_user(&batch[0]).deleted_at.is_none());
    }

    #[test]
    fn test_update_stamps_updated_at_only() {
        let now = Utc::now();
        let created = now - Duration::days(7);
        let mut user = sample_user();
        user.created_at = created;

        let batch = apply_audit(vec![Mutation::update(user)], now);
        let user = unwrap_user(&batch[0]);

        assert_eq!(user.updated_at, now);
        // created_at is untouched in memory and excluded from the UPDATE
        // statement entirely
        assert_eq!(user.created_at, created);
    }

    #[test]
    fn test_update_discards_caller_deletion() {
        let now = Utc::now();
        let mut user = sample_user();
        user.deleted_at = Some(now - Duration::hours(1));

        let batch = apply_audit(vec![Mutation::update(user)], now);
        assert!(unwrap_user(&batch[0]).deleted_at.is_none());
    }

    #[test]
    fn test_delete_becomes_soft_delete_update() {
        let now = Utc::now();
        let user = sample_user();

        let batch = apply_audit(vec![Mutation::delete(user)], now);

        assert!(matches!(batch[0], Mutation::Update(_)));
        let user = unwrap_user(&batch[0]);
        assert_eq!(user.deleted_at, Some(now));
        assert_eq!(user.updated_at, now);
    }

    #[test]
    fn test_redelete_preserves_original_marker() {
        let first = Utc::now();
        let user = sample_user();

        let batch = apply_audit(vec![Mutation::delete(user)], first);
        let user = unwrap_user(&batch[0]).clone();

        let second = first + Duration::minutes(5);
        let batch = apply_audit(vec![Mutation::delete(user)], second);
        let user = unwrap_user(&batch[0]);

        // First write wins; the marker is never overwritten
        assert_eq!(user.deleted_at, Some(first));
    }

    #[test]
    fn test_whole_batch_shares_one_timestamp() {
        let now = Utc::now();
        let a = sample_user();
        let mut b = sample_user();
        b.username = "ada2".to_string();
        let c = sample_user();

        let batch = apply_audit(
            vec![Mutation::insert(a), Mutation::update(b), Mutation::delete(c)],
            now,
        );

        for mutation in &batch {
            let lc = mutation.record().lifecycle().expect("lifecycle record");
            assert_eq!(lc.updated_at(), now);
        }
    }

    #[test]
    fn test_append_only_insert_is_stamped() {
        let now = Utc::now();
        let mut log = ActivityLog::record(Uuid::new_v4(), None, "org.created", None, None, None);
        log.created_at = now - Duration::days(1);

        let batch = apply_audit(vec![Mutation::insert(log)], now);
        match batch[0].record() {
            crate::models::Record::ActivityLog(log) => assert_eq!(log.created_at, now),
            other => panic!("expected activity log, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_append_only_delete_passes_through() {
        let now = Utc::now();
        let log = ActivityLog::record(Uuid::new_v4(), None, "org.created", None, None, None);

        let batch = apply_audit(vec![Mutation::delete(log)], now);
        // No lifecycle contract: not converted, reaches the engine as a
        // physical delete
        assert!(matches!(batch[0], Mutation::Delete(_)));
    }
}
