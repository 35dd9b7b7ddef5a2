/// Entity lifecycle contract
///
/// Every soft-deletable entity shares four fields: an immutable `id`, the
/// audit pair `created_at` / `updated_at`, and the soft-delete marker
/// `deleted_at`. The contract is expressed as a trait over accessors so
/// the change interceptor can stamp any entity in a pending batch without
/// knowing its concrete type.
///
/// Activity logs deliberately do not implement this trait: they are
/// append-only and carry identity and a creation timestamp only.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Accessors over the shared lifecycle fields.
///
/// The store is the sole writer of the three timestamps; callers may read
/// them but any value a caller sets is overwritten before commit.
pub trait Lifecycle {
    /// Unique identifier, assigned on creation, immutable.
    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;
    fn set_created_at(&mut self, at: DateTime<Utc>);

    fn updated_at(&self) -> DateTime<Utc>;
    fn set_updated_at(&mut self, at: DateTime<Utc>);

    fn deleted_at(&self) -> Option<DateTime<Utc>>;
    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    /// Derived liveness flag; never stored.
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Implements [`Lifecycle`] for a model struct that declares the four
/// fields inline (`id`, `created_at`, `updated_at`, `deleted_at`).
macro_rules! impl_lifecycle {
    ($model:ty) => {
        impl $crate::lifecycle::Lifecycle for $model {
            fn id(&self) -> uuid::Uuid {
                self.id
            }

            fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
                self.created_at
            }

            fn set_created_at(&mut self, at: chrono::DateTime<chrono::Utc>) {
                self.created_at = at;
            }

            fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
                self.updated_at
            }

            fn set_updated_at(&mut self, at: chrono::DateTime<chrono::Utc>) {
                self.updated_at = at;
            }

            fn deleted_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
                self.deleted_at
            }

            fn set_deleted_at(&mut self, at: Option<chrono::DateTime<chrono::Utc>>) {
                self.deleted_at = at;
            }
        }
    };
}

pub(crate) use impl_lifecycle;

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        id: Uuid,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    }

    impl_lifecycle!(Probe);

    #[test]
    fn test_is_deleted_is_derived() {
        let mut probe = Probe {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        assert!(!probe.is_deleted());

        probe.set_deleted_at(Some(Utc::now()));
        assert!(probe.is_deleted());
    }

    #[test]
    fn test_accessors_round_trip() {
        let now = Utc::now();
        let mut probe = Probe {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let later = now + chrono::Duration::seconds(5);
        probe.set_updated_at(later);
        assert_eq!(probe.updated_at(), later);
        assert_eq!(probe.created_at(), now);
    }
}
