//! # Taskdeck Store
//!
//! Persistence layer for Taskdeck, a multi-tenant project/task tracker.
//!
//! The surface is plain CRUD over a relational schema; the substance is
//! the lifecycle subsystem the [`store::Store`] gateway enforces on every
//! call:
//!
//! - deletes of lifecycle entities become soft deletes,
//! - audit timestamps are stamped by the store, never by callers,
//! - reads exclude soft-deleted rows and rows whose structural ancestors
//!   are soft-deleted, unless the caller opts into `include_deleted`,
//! - every foreign key restricts: nothing cascades, nothing nulls.
//!
//! ## Module Organization
//!
//! - `config`: environment-driven configuration
//! - `db`: connection pool and migrations
//! - `error`: the store error taxonomy
//! - `lifecycle`: the shared entity lifecycle contract
//! - `models`: persisted entity types
//! - `schema`: declarative schema metadata (tables, ancestors, foreign keys)
//! - `store`: the persistence gateway, change interceptor and visibility
//!   filter composer

pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod schema;
pub mod store;

/// Current version of the Taskdeck store library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
