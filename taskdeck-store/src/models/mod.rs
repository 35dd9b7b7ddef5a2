/// Database models for Taskdeck
///
/// This module contains all persisted entity types. Every model except
/// [`activity_log::ActivityLog`] implements the lifecycle contract
/// ([`crate::lifecycle::Lifecycle`]) and is therefore soft-deleted and
/// timestamp-audited by the store.
///
/// # Models
///
/// - `user`: user accounts
/// - `organization`: top-level tenant entity
/// - `organization_member`: user-organization join rows with roles
/// - `project`: projects scoped to an organization
/// - `project_member`: user-project join rows with roles
/// - `task`: tasks within a project
/// - `comment`: threaded task comments
/// - `activity_log`: append-only audit trail

pub mod activity_log;
pub mod comment;
pub mod organization;
pub mod organization_member;
pub mod project;
pub mod project_member;
pub mod task;
pub mod user;

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::lifecycle::Lifecycle;
use crate::schema::EntityKind;

pub use activity_log::ActivityLog;
pub use comment::Comment;
pub use organization::Organization;
pub use organization_member::OrganizationMember;
pub use project::Project;
pub use project_member::ProjectMember;
pub use task::Task;
pub use user::User;

/// A model that can be fetched through the store's query path.
pub trait Entity: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin {
    /// Schema-level kind of this model.
    const KIND: EntityKind;
}

/// A populated (or populatable) foreign key on a concrete record.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKeyRef {
    /// Column on the referencing table
    pub column: &'static str,

    /// Referenced entity type
    pub references: EntityKind,

    /// Current value; None for an unset optional reference
    pub value: Option<Uuid>,
}

/// A persisted record of any entity type.
///
/// The save path works over heterogeneous batches, so pending mutations
/// carry their record behind this enum; the interceptor reaches the
/// lifecycle fields through [`Record::lifecycle_mut`] without knowing the
/// concrete type.
#[derive(Debug, Clone)]
pub enum Record {
    User(User),
    Organization(Organization),
    OrganizationMember(OrganizationMember),
    Project(Project),
    ProjectMember(ProjectMember),
    Task(Task),
    Comment(Comment),
    ActivityLog(ActivityLog),
}

impl Record {
    /// Schema-level kind of the wrapped record.
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::User(_) => EntityKind::User,
            Record::Organization(_) => EntityKind::Organization,
            Record::OrganizationMember(_) => EntityKind::OrganizationMember,
            Record::Project(_) => EntityKind::Project,
            Record::ProjectMember(_) => EntityKind::ProjectMember,
            Record::Task(_) => EntityKind::Task,
            Record::Comment(_) => EntityKind::Comment,
            Record::ActivityLog(_) => EntityKind::ActivityLog,
        }
    }

    /// Identifier of the wrapped record.
    pub fn id(&self) -> Uuid {
        match self {
            Record::User(r) => r.id,
            Record::Organization(r) => r.id,
            Record::OrganizationMember(r) => r.id,
            Record::Project(r) => r.id,
            Record::ProjectMember(r) => r.id,
            Record::Task(r) => r.id,
            Record::Comment(r) => r.id,
            Record::ActivityLog(r) => r.id,
        }
    }

    /// Lifecycle view of the record, if it carries the contract.
    pub fn lifecycle(&self) -> Option<&dyn Lifecycle> {
        match self {
            Record::User(r) => Some(r),
            Record::Organization(r) => Some(r),
            Record::OrganizationMember(r) => Some(r),
            Record::Project(r) => Some(r),
            Record::ProjectMember(r) => Some(r),
            Record::Task(r) => Some(r),
            Record::Comment(r) => Some(r),
            Record::ActivityLog(_) => None,
        }
    }

    /// Mutable lifecycle view, used by the change interceptor.
    pub fn lifecycle_mut(&mut self) -> Option<&mut dyn Lifecycle> {
        match self {
            Record::User(r) => Some(r),
            Record::Organization(r) => Some(r),
            Record::OrganizationMember(r) => Some(r),
            Record::Project(r) => Some(r),
            Record::ProjectMember(r) => Some(r),
            Record::Task(r) => Some(r),
            Record::Comment(r) => Some(r),
            Record::ActivityLog(_) => None,
        }
    }

    /// Stamps the creation timestamp on records outside the lifecycle
    /// contract (the append-only audit trail).
    pub(crate) fn stamp_append_only(&mut self, now: DateTime<Utc>) {
        if let Record::ActivityLog(log) = self {
            log.created_at = now;
        }
    }

    /// The record's foreign keys with their current values, in the order
    /// declared by [`crate::schema::RELATIONSHIPS`].
    pub fn references(&self) -> Vec<ForeignKeyRef> {
        match self {
            Record::User(_) => vec![],
            Record::Organization(r) => vec![ForeignKeyRef {
                column: "owner_id",
                references: EntityKind::User,
                value: Some(r.owner_id),
            }],
            Record::OrganizationMember(r) => vec![
                ForeignKeyRef {
                    column: "organization_id",
                    references: EntityKind::Organization,
                    value: Some(r.organization_id),
                },
                ForeignKeyRef {
                    column: "user_id",
                    references: EntityKind::User,
                    value: Some(r.user_id),
                },
            ],
            Record::Project(r) => vec![
                ForeignKeyRef {
                    column: "organization_id",
                    references: EntityKind::Organization,
                    value: Some(r.organization_id),
                },
                ForeignKeyRef {
                    column: "created_by",
                    references: EntityKind::User,
                    value: Some(r.created_by),
                },
            ],
            Record::ProjectMember(r) => vec![
                ForeignKeyRef {
                    column: "project_id",
                    references: EntityKind::Project,
                    value: Some(r.project_id),
                },
                ForeignKeyRef {
                    column: "user_id",
                    references: EntityKind::User,
                    value: Some(r.user_id),
                },
            ],
            Record::Task(r) => vec![
                ForeignKeyRef {
                    column: "project_id",
                    references: EntityKind::Project,
                    value: Some(r.project_id),
                },
                ForeignKeyRef {
                    column: "organization_id",
                    references: EntityKind::Organization,
                    value: Some(r.organization_id),
                },
                ForeignKeyRef {
                    column: "created_by",
                    references: EntityKind::User,
                    value: Some(r.created_by),
                },
                ForeignKeyRef {
                    column: "assigned_to",
                    references: EntityKind::User,
                    value: r.assigned_to,
                },
            ],
            Record::Comment(r) => vec![
                ForeignKeyRef {
                    column: "task_id",
                    references: EntityKind::Task,
                    value: Some(r.task_id),
                },
                ForeignKeyRef {
                    column: "author_id",
                    references: EntityKind::User,
                    value: Some(r.author_id),
                },
                ForeignKeyRef {
                    column: "parent_comment_id",
                    references: EntityKind::Comment,
                    value: r.parent_comment_id,
                },
            ],
            Record::ActivityLog(r) => vec![
                ForeignKeyRef {
                    column: "organization_id",
                    references: EntityKind::Organization,
                    value: Some(r.organization_id),
                },
                ForeignKeyRef {
                    column: "user_id",
                    references: EntityKind::User,
                    value: r.user_id,
                },
            ],
        }
    }

    /// Writes the record as a new row. Returns the row as stored.
    pub(crate) async fn insert(&self, conn: &mut PgConnection) -> Result<Record, sqlx::Error> {
        match self {
            Record::User(r) => Ok(Record::User(r.insert(conn).await?)),
            Record::Organization(r) => Ok(Record::Organization(r.insert(conn).await?)),
            Record::OrganizationMember(r) => {
                Ok(Record::OrganizationMember(r.insert(conn).await?))
            }
            Record::Project(r) => Ok(Record::Project(r.insert(conn).await?)),
            Record::ProjectMember(r) => Ok(Record::ProjectMember(r.insert(conn).await?)),
            Record::Task(r) => Ok(Record::Task(r.insert(conn).await?)),
            Record::Comment(r) => Ok(Record::Comment(r.insert(conn).await?)),
            Record::ActivityLog(r) => Ok(Record::ActivityLog(r.insert(conn).await?)),
        }
    }

    /// Writes the record over its existing row. Returns the row as stored
    /// (which may differ from the record where monotonicity rules apply,
    /// e.g. an already-set `deleted_at` is preserved).
    pub(crate) async fn update(&self, conn: &mut PgConnection) -> Result<Record, sqlx::Error> {
        match self {
            Record::User(r) => Ok(Record::User(r.update(conn).await?)),
            Record::Organization(r) => Ok(Record::Organization(r.update(conn).await?)),
            Record::OrganizationMember(r) => {
                Ok(Record::OrganizationMember(r.update(conn).await?))
            }
            Record::Project(r) => Ok(Record::Project(r.update(conn).await?)),
            Record::ProjectMember(r) => Ok(Record::ProjectMember(r.update(conn).await?)),
            Record::Task(r) => Ok(Record::Task(r.update(conn).await?)),
            Record::Comment(r) => Ok(Record::Comment(r.update(conn).await?)),
            Record::ActivityLog(r) => Ok(Record::ActivityLog(r.update(conn).await?)),
        }
    }
}

impl From<User> for Record {
    fn from(r: User) -> Self {
        Record::User(r)
    }
}

impl From<Organization> for Record {
    fn from(r: Organization) -> Self {
        Record::Organization(r)
    }
}

impl From<OrganizationMember> for Record {
    fn from(r: OrganizationMember) -> Self {
        Record::OrganizationMember(r)
    }
}

impl From<Project> for Record {
    fn from(r: Project) -> Self {
        Record::Project(r)
    }
}

impl From<ProjectMember> for Record {
    fn from(r: ProjectMember) -> Self {
        Record::ProjectMember(r)
    }
}

impl From<Task> for Record {
    fn from(r: Task) -> Self {
        Record::Task(r)
    }
}

impl From<Comment> for Record {
    fn from(r: Comment) -> Self {
        Record::Comment(r)
    }
}

impl From<ActivityLog> for Record {
    fn from(r: ActivityLog) -> Self {
        Record::ActivityLog(r)
    }
}

/// Unwraps a [`Record`] back into its concrete model; the mismatched
/// record is handed back on failure.
macro_rules! impl_try_from_record {
    ($model:ty, $variant:ident) => {
        impl TryFrom<Record> for $model {
            type Error = Record;

            fn try_from(record: Record) -> Result<Self, Record> {
                match record {
                    Record::$variant(r) => Ok(r),
                    other => Err(other),
                }
            }
        }
    };
}

impl_try_from_record!(User, User);
impl_try_from_record!(Organization, Organization);
impl_try_from_record!(OrganizationMember, OrganizationMember);
impl_try_from_record!(Project, Project);
impl_try_from_record!(ProjectMember, ProjectMember);
impl_try_from_record!(Task, Task);
impl_try_from_record!(Comment, Comment);
impl_try_from_record!(ActivityLog, ActivityLog);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RELATIONSHIPS;

    fn sample_records() -> Vec<Record> {
        let user = User::new(user::CreateUser {
            full_name: "Ada Lovelace".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            avatar_url: None,
        });
        let org = Organization::new(organization::CreateOrganization {
            name: "Analytical Engines".to_string(),
            slug: "analytical-engines".to_string(),
            owner_id: user.id,
        });
        let project = Project::new(project::CreateProject {
            organization_id: org.id,
            title: "Engine".to_string(),
            slug: "engine".to_string(),
            description: None,
            created_by: user.id,
            start_date: None,
            end_date: None,
        });
        let task = Task::new(task::CreateTask {
            project_id: project.id,
            organization_id: org.id,
            title: "Punch cards".to_string(),
            description: None,
            priority: task::TaskPriority::Medium,
            created_by: user.id,
            assigned_to: None,
            due_date: None,
        });
        let comment = Comment::new(comment::CreateComment {
            task_id: task.id,
            author_id: user.id,
            parent_comment_id: None,
            content: "Looks good".to_string(),
        });
        let org_member = OrganizationMember::new(organization_member::CreateOrganizationMember {
            organization_id: org.id,
            user_id: user.id,
            role: organization_member::OrganizationRole::Member,
        });
        let project_member = ProjectMember::new(project_member::CreateProjectMember {
            project_id: project.id,
            user_id: user.id,
            role: project_member::ProjectRole::Member,
        });
        let log = ActivityLog::record(org.id, Some(user.id), "task.created", Some(task.id), None, None);

        vec![
            user.into(),
            org.into(),
            org_member.into(),
            project.into(),
            project_member.into(),
            task.into(),
            comment.into(),
            log.into(),
        ]
    }

    #[test]
    fn test_references_match_declared_relationships() {
        // Record::references must enumerate exactly the schema-declared
        // foreign keys for its kind, in order.
        for record in sample_records() {
            let declared: Vec<_> = RELATIONSHIPS
                .iter()
                .filter(|r| r.entity == record.kind())
                .collect();
            let actual = record.references();

            assert_eq!(declared.len(), actual.len(), "{}", record.kind());
            for (rel, fk) in declared.iter().zip(actual.iter()) {
                assert_eq!(rel.column, fk.column, "{}", record.kind());
                assert_eq!(rel.references, fk.references, "{}", record.kind());
                if !rel.nullable {
                    assert!(fk.value.is_some(), "{}.{}", record.kind(), fk.column);
                }
            }
        }
    }

    #[test]
    fn test_only_activity_log_lacks_lifecycle() {
        for record in sample_records() {
            match record.kind() {
                EntityKind::ActivityLog => assert!(record.lifecycle().is_none()),
                _ => assert!(record.lifecycle().is_some()),
            }
        }
    }

    #[test]
    fn test_record_id_matches_inner_model() {
        let user = User::new(user::CreateUser {
            full_name: "Grace Hopper".to_string(),
            username: "grace".to_string(),
            email: "grace@example.com".to_string(),
            password_hash: "hash".to_string(),
            avatar_url: None,
        });
        let id = user.id;
        let record: Record = user.into();
        assert_eq!(record.id(), id);
        assert_eq!(record.kind(), EntityKind::User);
    }
}
