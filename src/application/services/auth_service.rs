//! Request identity: who is calling the admin API.
//!
//! Production uses [`TokenIdentityProvider`]. [`DevIdentityProvider`] skips
//! authentication entirely and is only built when `BYPASS_AUTH=true` or by tests.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;

use crate::domain::entities::{User, UserRole};
use crate::domain::repositories::{TokenRepository, UserRepository};
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Resolves the bearer token of a request to a [`User`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] when the caller cannot be identified.
    async fn identify(&self, bearer: Option<&str>) -> Result<User, AppError>;

    /// Short name for logs and health output.
    fn name(&self) -> &'static str;
}

/// Hex HMAC-SHA256 of `token` keyed by the server signing secret.
///
/// Only this value is stored, so a database dump alone cannot be used to
/// authenticate.
pub fn hash_token(signing_secret: &str, token: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|e| AppError::internal("Invalid signing key", json!({ "reason": e.to_string() })))?;
    mac.update(token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Fresh random token: 32 bytes, hex encoded.
pub fn generate_raw_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn unauthorized(reason: &str) -> AppError {
    AppError::unauthorized("Unauthorized", json!({ "reason": reason }))
}

/// Bearer tokens checked against `api_tokens`; a hit also stamps `last_used_at`.
pub struct TokenIdentityProvider<T: TokenRepository + ?Sized, U: UserRepository + ?Sized> {
    tokens: Arc<T>,
    users: Arc<U>,
    signing_secret: String,
}

impl<T: TokenRepository + ?Sized, U: UserRepository + ?Sized> TokenIdentityProvider<T, U> {
    /// `signing_secret` must match the one used when tokens were issued.
    pub fn new(tokens: Arc<T>, users: Arc<U>, signing_secret: String) -> Self {
        Self {
            tokens,
            users,
            signing_secret,
        }
    }
}

#[async_trait]
impl<T: TokenRepository + ?Sized, U: UserRepository + ?Sized> IdentityProvider
    for TokenIdentityProvider<T, U>
{
    async fn identify(&self, bearer: Option<&str>) -> Result<User, AppError> {
        let token = bearer
            .filter(|t| !t.is_empty())
            .ok_or_else(|| unauthorized("Authorization header is missing or invalid"))?;

        let token_hash = hash_token(&self.signing_secret, token)?;

        let user_id = self
            .tokens
            .authenticate(&token_hash)
            .await?
            .ok_or_else(|| unauthorized("Invalid or revoked token"))?;

        let user = self.users.find_by_id(user_id).await?.ok_or_else(|| {
            tracing::warn!(user_id, "Active token belongs to a missing user");
            unauthorized("Token owner no longer exists")
        })?;

        Ok(user)
    }

    fn name(&self) -> &'static str {
        "token"
    }
}

/// Accepts every request as a fixed administrator.
pub struct DevIdentityProvider {
    user: User,
}

impl DevIdentityProvider {
    pub const DEV_USER_ID: i64 = 1;
    pub const DEV_USER_EMAIL: &'static str = "dev@localhost";
    pub const DEV_USER_NAME: &'static str = "Development Admin";

    pub fn new() -> Self {
        Self::with_user(User {
            id: Self::DEV_USER_ID,
            email: Self::DEV_USER_EMAIL.to_string(),
            name: Self::DEV_USER_NAME.to_string(),
            role: UserRole::Admin,
            created_at: Utc::now(),
        })
    }

    pub fn with_user(user: User) -> Self {
        Self { user }
    }
}

impl Default for DevIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for DevIdentityProvider {
    async fn identify(&self, _bearer: Option<&str>) -> Result<User, AppError> {
        Ok(self.user.clone())
    }

    fn name(&self) -> &'static str {
        "development"
    }
}
