//! Repository trait for the bearer tokens of the admin API.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// An issued token as shown to operators. The stored hash is never exposed.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiToken {
    pub id: i64,
    pub user_id: i64,
    pub owner_email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}

/// How an operator refers to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSelector {
    Id(i64),
    Name(String),
}

impl TokenSelector {
    /// Numeric input is an id, anything else an exact name.
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<i64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(input.trim().to_string()),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Resolves an active token hash to its user and stamps `last_used_at`
    /// in the same statement.
    async fn authenticate(&self, token_hash: &str) -> Result<Option<i64>, AppError>;

    /// # Errors
    ///
    /// [`AppError::Conflict`] when the name or the hash is already taken.
    async fn issue(&self, user_id: i64, name: &str, token_hash: &str)
    -> Result<ApiToken, AppError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<ApiToken>, AppError>;

    async fn find(&self, selector: TokenSelector) -> Result<Option<ApiToken>, AppError>;

    /// Returns `false` if the token does not exist or was already revoked.
    async fn revoke(&self, id: i64) -> Result<bool, AppError>;

    async fn count_active(&self) -> Result<i64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse() {
        assert_eq!(TokenSelector::parse(" 12 "), TokenSelector::Id(12));
        assert_eq!(
            TokenSelector::parse("CMS"),
            TokenSelector::Name("CMS".to_string())
        );
    }
}
