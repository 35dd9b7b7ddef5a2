/// User model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     full_name VARCHAR(100) NOT NULL,
///     username VARCHAR(50) NOT NULL UNIQUE,
///     email VARCHAR(100) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     avatar_url VARCHAR(255),
///     last_login_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL,
///     deleted_at TIMESTAMPTZ
/// );
/// ```
///
/// Lifecycle timestamps are owned by the store: values set here are
/// overwritten by the change interceptor before commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::lifecycle::impl_lifecycle;
use crate::schema::EntityKind;
use crate::store::{Filter, Store};

use super::Entity;

/// User account.
///
/// Passwords arrive here already hashed; this layer treats the hash as an
/// opaque string.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub full_name: String,

    /// Unique login name
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Opaque credential hash
    pub password_hash: String,

    /// Optional avatar URL
    pub avatar_url: Option<String>,

    /// Last successful login, if any
    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_lifecycle!(User);

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
}

/// Input for creating a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
}

impl User {
    /// Builds a new user record with a fresh ID, ready to be inserted
    /// through [`Store::save`].
    pub fn new(data: CreateUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name: data.full_name,
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            avatar_url: data.avatar_url,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Marks a successful login. Persist with an update through the store
    /// so `updated_at` is stamped alongside.
    pub fn touch_last_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
    }

    /// Finds a live user by username.
    pub async fn find_by_username(store: &Store, username: &str) -> StoreResult<Option<Self>> {
        let mut rows = store
            .query::<User>(Filter::new().eq("username", username).limit(1))
            .await?;
        Ok(rows.pop())
    }

    /// Finds a live user by email.
    pub async fn find_by_email(store: &Store, email: &str) -> StoreResult<Option<Self>> {
        let mut rows = store
            .query::<User>(Filter::new().eq("email", email).limit(1))
            .await?;
        Ok(rows.pop())
    }

    /// Lists live users with pagination, newest first.
    pub async fn list(store: &Store, limit: i64, offset: i64) -> StoreResult<Vec<Self>> {
        store
            .query::<User>(Filter::new().limit(limit).offset(offset))
            .await
    }

    pub(crate) async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, full_name, username, email, password_hash, avatar_url,
                               last_login_at, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, full_name, username, email, password_hash, avatar_url,
                      last_login_at, created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(&self.full_name)
        .bind(&self.username)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(&self.avatar_url)
        .bind(self.last_login_at)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }

    // created_at is deliberately absent from the column list; deleted_at
    // is COALESCEd so a set marker can never be cleared or overwritten.
    pub(crate) async fn update(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = $2, username = $3, email = $4, password_hash = $5,
                avatar_url = $6, last_login_at = $7, updated_at = $8,
                deleted_at = COALESCE(deleted_at, $9)
            WHERE id = $1
            RETURNING id, full_name, username, email, password_hash, avatar_url,
                      last_login_at, created_at, updated_at, deleted_at
            "#,
        )
        .bind(self.id)
        .bind(&self.full_name)
        .bind(&self.username)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(&self.avatar_url)
        .bind(self.last_login_at)
        .bind(self.updated_at)
        .bind(self.deleted_at)
        .fetch_one(&mut *conn)
        .await
    }
}
