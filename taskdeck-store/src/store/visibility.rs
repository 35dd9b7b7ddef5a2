/// Visibility filter composer
///
/// Builds, per entity type, the SQL predicate that keeps soft-deleted rows
/// and rows with soft-deleted structural ancestors out of every read. The
/// predicate is an explicit value threaded into each query; there is no
/// ambient per-type filter state to toggle.
///
/// Composition rules:
///
/// - a leaf entity checks only its own `deleted_at`;
/// - an entity with structural ancestors additionally requires each
///   ancestor to satisfy *its* predicate, via a correlated `EXISTS`
///   applied recursively, so a task folds in its project and, through the
///   project, the organization;
/// - join rows conjoin both sides;
/// - the append-only audit trail has no liveness of its own and inherits
///   its predicate entirely from its organization.
///
/// `include_deleted` collapses the predicate to `TRUE`, the
/// administrative escape hatch for reads that must see everything.

use crate::schema::EntityKind;

/// Effective visibility predicate for `kind`, with columns qualified by
/// table name so the fragment composes with caller conditions and nested
/// subqueries without aliasing.
pub fn predicate(kind: EntityKind, include_deleted: bool) -> String {
    if include_deleted {
        return "TRUE".to_string();
    }
    compose(kind)
}

fn compose(kind: EntityKind) -> String {
    let table = kind.table();
    let mut parts = Vec::new();

    if kind.has_lifecycle() {
        parts.push(format!("{table}.deleted_at IS NULL"));
    }

    for ancestor in kind.visibility_ancestors() {
        let ancestor_table = ancestor.kind.table();
        parts.push(format!(
            "EXISTS (SELECT 1 FROM {ancestor_table} WHERE {ancestor_table}.id = {table}.{column} AND {inner})",
            column = ancestor.column,
            inner = compose(ancestor.kind),
        ));
    }

    parts.join(" AND ")
}
