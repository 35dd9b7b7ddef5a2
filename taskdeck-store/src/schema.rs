/// Declarative schema metadata
///
/// This module is the single source of truth for the logical schema: which
/// entity types exist, which of them carry the lifecycle contract, which
/// structural ancestors govern their visibility, and every foreign-key
/// relationship in the database.
///
/// The visibility composer and the referential-integrity checks are both
/// driven off this metadata, so adding an entity or a relationship is a
/// change in exactly one place.

use std::fmt;

/// Every persisted entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Organization,
    OrganizationMember,
    Project,
    ProjectMember,
    Task,
    Comment,
    ActivityLog,
}

/// A structural ancestor: a required relationship whose liveness gates the
/// visibility of the referencing entity.
#[derive(Debug, Clone, Copy)]
pub struct Ancestor {
    /// Foreign-key column on the child table
    pub column: &'static str,

    /// The ancestor entity type
    pub kind: EntityKind,
}

/// A foreign-key relationship. All relationships restrict on delete.
#[derive(Debug, Clone, Copy)]
pub struct Relationship {
    /// The referencing entity
    pub entity: EntityKind,

    /// Foreign-key column on the referencing table
    pub column: &'static str,

    /// The referenced entity
    pub references: EntityKind,

    /// Whether the column may be NULL
    pub nullable: bool,
}

/// Every foreign key in the schema, in declaration order.
///
/// Deletion of a referenced row is rejected while referencing rows exist
/// (live or soft-deleted); inserts and updates must resolve each populated
/// column against the referenced table.
pub const RELATIONSHIPS: &[Relationship] = &[
    Relationship { entity: EntityKind::Organization, column: "owner_id", references: EntityKind::User, nullable: false },
    Relationship { entity: EntityKind::OrganizationMember, column: "organization_id", references: EntityKind::Organization, nullable: false },
    Relationship { entity: EntityKind::OrganizationMember, column: "user_id", references: EntityKind::User, nullable: false },
    Relationship { entity: EntityKind::Project, column: "organization_id", references: EntityKind::Organization, nullable: false },
    Relationship { entity: EntityKind::Project, column: "created_by", references: EntityKind::User, nullable: false },
    Relationship { entity: EntityKind::ProjectMember, column: "project_id", references: EntityKind::Project, nullable: false },
    Relationship { entity: EntityKind::ProjectMember, column: "user_id", references: EntityKind::User, nullable: false },
    Relationship { entity: EntityKind::Task, column: "project_id", references: EntityKind::Project, nullable: false },
    Relationship { entity: EntityKind::Task, column: "organization_id", references: EntityKind::Organization, nullable: false },
    Relationship { entity: EntityKind::Task, column: "created_by", references: EntityKind::User, nullable: false },
    Relationship { entity: EntityKind::Task, column: "assigned_to", references: EntityKind::User, nullable: true },
    Relationship { entity: EntityKind::Comment, column: "task_id", references: EntityKind::Task, nullable: false },
    Relationship { entity: EntityKind::Comment, column: "author_id", references: EntityKind::User, nullable: false },
    Relationship { entity: EntityKind::Comment, column: "parent_comment_id", references: EntityKind::Comment, nullable: true },
    Relationship { entity: EntityKind::ActivityLog, column: "organization_id", references: EntityKind::Organization, nullable: false },
    Relationship { entity: EntityKind::ActivityLog, column: "user_id", references: EntityKind::User, nullable: true },
];

impl EntityKind {
    /// Table name in the physical schema.
    pub const fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Organization => "organizations",
            EntityKind::OrganizationMember => "organization_members",
            EntityKind::Project => "projects",
            EntityKind::ProjectMember => "project_members",
            EntityKind::Task => "tasks",
            EntityKind::Comment => "comments",
            EntityKind::ActivityLog => "activity_logs",
        }
    }

    /// Full column list, matching the physical schema order.
    pub const fn columns(&self) -> &'static str {
        match self {
            EntityKind::User => {
                "id, full_name, username, email, password_hash, avatar_url, \
                 last_login_at, created_at, updated_at, deleted_at"
            }
            EntityKind::Organization => {
                "id, name, slug, owner_id, created_at, updated_at, deleted_at"
            }
            EntityKind::OrganizationMember => {
                "id, organization_id, user_id, role, joined_at, left_at, \
                 created_at, updated_at, deleted_at"
            }
            EntityKind::Project => {
                "id, organization_id, title, slug, description, status, created_by, \
                 start_date, end_date, created_at, updated_at, deleted_at"
            }
            EntityKind::ProjectMember => {
                "id, project_id, user_id, role, joined_at, created_at, updated_at, deleted_at"
            }
            EntityKind::Task => {
                "id, project_id, organization_id, title, description, status, priority, \
                 created_by, assigned_to, due_date, created_at, updated_at, deleted_at"
            }
            EntityKind::Comment => {
                "id, task_id, author_id, parent_comment_id, content, is_edited, \
                 created_at, updated_at, deleted_at"
            }
            EntityKind::ActivityLog => {
                "id, organization_id, user_id, action, entity_id, old_value, new_value, created_at"
            }
        }
    }

    /// Whether this entity carries the lifecycle contract (soft delete plus
    /// audit timestamps). Activity logs are append-only and carry identity
    /// and a creation timestamp only.
    pub const fn has_lifecycle(&self) -> bool {
        !matches!(self, EntityKind::ActivityLog)
    }

    /// Structural ancestors whose liveness gates this entity's visibility.
    ///
    /// Transitive ancestors are not listed; the visibility composer folds
    /// them in by recursing through each ancestor's own list (a task checks
    /// its project, and through the project its organization).
    pub const fn visibility_ancestors(&self) -> &'static [Ancestor] {
        match self {
            EntityKind::User | EntityKind::Organization => &[],
            EntityKind::OrganizationMember => &[
                Ancestor { column: "organization_id", kind: EntityKind::Organization },
                Ancestor { column: "user_id", kind: EntityKind::User },
            ],
            EntityKind::Project => &[
                Ancestor { column: "organization_id", kind: EntityKind::Organization },
            ],
            EntityKind::ProjectMember => &[
                Ancestor { column: "project_id", kind: EntityKind::Project },
                Ancestor { column: "user_id", kind: EntityKind::User },
            ],
            EntityKind::Task => &[
                Ancestor { column: "project_id", kind: EntityKind::Project },
            ],
            EntityKind::Comment => &[
                Ancestor { column: "task_id", kind: EntityKind::Task },
            ],
            EntityKind::ActivityLog => &[
                Ancestor { column: "organization_id", kind: EntityKind::Organization },
            ],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Relationships that reference the given entity (used by the restrict
/// policy to find rows that would dangle after a hard delete).
pub fn referencing(kind: EntityKind) -> impl Iterator<Item = &'static Relationship> {
    RELATIONSHIPS.iter().filter(move |r| r.references == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_visibility_ancestor_is_a_declared_relationship() {
        let kinds = [
            EntityKind::User,
            EntityKind::Organization,
            EntityKind::OrganizationMember,
            EntityKind::Project,
            EntityKind::ProjectMember,
            EntityKind::Task,
            EntityKind::Comment,
            EntityKind::ActivityLog,
        ];

        for kind in kinds {
            for ancestor in kind.visibility_ancestors() {
                let declared = RELATIONSHIPS.iter().any(|r| {
                    r.entity == kind && r.column == ancestor.column && r.references == ancestor.kind
                });
                assert!(
                    declared,
                    "{}.{} is not in RELATIONSHIPS",
                    kind.table(),
                    ancestor.column
                );
            }
        }
    }

    #[test]
    fn test_visibility_ancestors_are_required_columns() {
        // A NULL foreign key cannot gate visibility; every ancestor edge
        // must be a NOT NULL column.
        for rel in RELATIONSHIPS {
            let is_ancestor = rel
                .entity
                .visibility_ancestors()
                .iter()
                .any(|a| a.column == rel.column);
            if is_ancestor {
                assert!(
                    !rel.nullable,
                    "{}.{} is nullable but used as a visibility ancestor",
                    rel.entity.table(),
                    rel.column
                );
            }
        }
    }

    #[test]
    fn test_users_are_referenced_from_every_corner() {
        let inbound: Vec<_> = referencing(EntityKind::User).collect();
        assert_eq!(inbound.len(), 8);
    }

    #[test]
    fn test_activity_log_is_append_only() {
        assert!(!EntityKind::ActivityLog.has_lifecycle());
        assert!(EntityKind::Task.has_lifecycle());
        assert!(EntityKind::User.has_lifecycle());
    }

    #[test]
    fn test_join_rows_have_two_ancestors() {
        assert_eq!(EntityKind::OrganizationMember.visibility_ancestors().len(), 2);
        assert_eq!(EntityKind::ProjectMember.visibility_ancestors().len(), 2);
    }

    #[test]
    fn test_display_matches_table_name() {
        assert_eq!(EntityKind::Project.to_string(), "projects");
        assert_eq!(EntityKind::ActivityLog.to_string(), "activity_logs");
    }
}
