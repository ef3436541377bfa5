//! PostgreSQL token store. Only HMAC hashes are persisted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::{ApiToken, TokenRepository, TokenSelector};
use crate::error::AppError;

const SELECT_TOKENS: &str = r#"
    SELECT t.id, t.user_id, u.email AS owner_email, t.name,
           t.created_at, t.last_used_at, t.revoked_at
    FROM api_tokens t
    JOIN users u ON u.id = t.user_id
"#;

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i64,
    user_id: i64,
    owner_email: String,
    name: String,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<TokenRow> for ApiToken {
    fn from(row: TokenRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            owner_email: row.owner_email,
            name: row.name,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
            revoked_at: row.revoked_at,
        }
    }
}

pub struct PgTokenRepository {
    pool: Arc<PgPool>,
}

impl PgTokenRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn authenticate(&self, token_hash: &str) -> Result<Option<i64>, AppError> {
        let user_id = sqlx::query_scalar(
            r#"
            UPDATE api_tokens
            SET last_used_at = NOW()
            WHERE token_hash = $1 AND revoked_at IS NULL
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user_id)
    }

    async fn issue(
        &self,
        user_id: i64,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO api_tokens (user_id, name, token_hash) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(user_id)
        .bind(name)
        .bind(token_hash)
        .fetch_one(self.pool.as_ref())
        .await?;

        self.find(TokenSelector::Id(id)).await?.ok_or_else(|| {
            AppError::internal("Issued token vanished", serde_json::json!({ "id": id }))
        })
    }

    async fn list(&self) -> Result<Vec<ApiToken>, AppError> {
        let sql = format!("{SELECT_TOKENS} ORDER BY t.created_at DESC");
        let rows = sqlx::query_as::<_, TokenRow>(&sql)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(ApiToken::from).collect())
    }

    async fn find(&self, selector: TokenSelector) -> Result<Option<ApiToken>, AppError> {
        let row = match selector {
            TokenSelector::Id(id) => {
                sqlx::query_as::<_, TokenRow>(&format!("{SELECT_TOKENS} WHERE t.id = $1"))
                    .bind(id)
                    .fetch_optional(self.pool.as_ref())
                    .await?
            }
            TokenSelector::Name(name) => {
                sqlx::query_as::<_, TokenRow>(&format!("{SELECT_TOKENS} WHERE t.name = $1"))
                    .bind(name)
                    .fetch_optional(self.pool.as_ref())
                    .await?
            }
        };

        Ok(row.map(ApiToken::from))
    }

    async fn revoke(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE api_tokens SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn count_active(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL")
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count)
    }
}
