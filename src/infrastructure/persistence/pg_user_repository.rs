//! PostgreSQL implementation of the user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|reason: String| {
            AppError::internal("Corrupt user row", json!({ "id": row.id, "reason": reason }))
        })?;

        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role,
            created_at: row.created_at,
        })
    }
}

pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, name, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, role, created_at
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(new_user.role.as_str())
        .fetch_one(self.pool.as_ref())
        .await?;

        User::try_from(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, created_at FROM users ORDER BY id",
        )
        .fetch_all(self.pool.as_ref())
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
    }
}
