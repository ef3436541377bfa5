//! CLI administration tool for the SmartLink service.
//!
//! Manages users and their API tokens, shows catalogue statistics and runs
//! database diagnostics without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create an owner account
//! cargo run --bin admin -- user create --email aria@label.test --name Aria --role artist
//!
//! # Issue a token for that user (raw value is printed once)
//! cargo run --bin admin -- token create --user aria@label.test --name "CMS"
//!
//! # Revoke it later
//! cargo run --bin admin -- token revoke CMS
//!
//! # SmartLinks per status, total views and clicks
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or its `DB_*` parts, read the same way as the server
//! - `TOKEN_SIGNING_SECRET` (required for `token create`): must match the server's

use smartlink::application::services::auth_service::{generate_raw_token, hash_token};
use smartlink::config::DatabaseConfig;
use smartlink::domain::entities::{NewUser, User, UserRole};
use smartlink::domain::repositories::{
    SmartLinkRepository, TokenRepository, TokenSelector, UserRepository,
};
use smartlink::infrastructure::persistence::{
    PgSmartLinkRepository, PgTokenRepository, PgUserRepository,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

/// CLI tool for managing the SmartLink service.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user
    Create {
        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        name: Option<String>,

        /// admin, artist or user
        #[arg(short, long, default_value = "user")]
        role: UserRole,
    },

    /// List all users
    List,
}

#[derive(Subcommand)]
enum TokenAction {
    /// Create a new API token bound to a user
    Create {
        /// User id or email
        #[arg(short, long)]
        user: String,

        /// Token name (e.g., "CMS", "Release pipeline")
        #[arg(short, long)]
        name: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token
    Revoke {
        /// Token name or ID to revoke
        name_or_id: String,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database = DatabaseConfig::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(database.acquire_timeout)
        .connect(&database.url)
        .await
        .context("Failed to connect to database")?;
    let pool = Arc::new(pool);

    match cli.command {
        Commands::User { action } => handle_user_action(action, &pool).await?,
        Commands::Token { action } => handle_token_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

async fn handle_user_action(action: UserAction, pool: &Arc<PgPool>) -> Result<()> {
    let repo = PgUserRepository::new(pool.clone());

    match action {
        UserAction::Create { email, name, role } => {
            let email = match email {
                Some(e) => e,
                None => Input::new().with_prompt("Email").interact_text()?,
            };
            let name = match name {
                Some(n) => n,
                None => Input::new().with_prompt("Display name").interact_text()?,
            };

            let user = repo
                .create(NewUser {
                    email: email.trim().to_lowercase(),
                    name: name.trim().to_string(),
                    role,
                })
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create user: {}", e))?;

            println!(
                "{} {} ({}, id {})",
                "✅ Created user".green().bold(),
                user.email.cyan(),
                user.role,
                user.id
            );
        }
        UserAction::List => {
            let users = repo
                .list()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list users: {}", e))?;

            if users.is_empty() {
                println!("{}", "  No users found".yellow());
                return Ok(());
            }

            println!(
                "  {:<5} {:<32} {:<24} {:<8}",
                "ID".bright_white().bold(),
                "Email".bright_white().bold(),
                "Name".bright_white().bold(),
                "Role".bright_white().bold()
            );
            println!("  {}", "─".repeat(72).bright_black());
            for user in &users {
                println!(
                    "  {:<5} {:<32} {:<24} {:<8}",
                    user.id.to_string().bright_black(),
                    user.email.cyan(),
                    user.name,
                    user.role.as_str()
                );
            }
            println!();
        }
    }

    Ok(())
}

async fn find_user(repo: &PgUserRepository, id_or_email: &str) -> Result<User> {
    let user = match id_or_email.parse::<i64>() {
        Ok(id) => repo.find_by_id(id).await,
        Err(_) => repo.find_by_email(&id_or_email.trim().to_lowercase()).await,
    }
    .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    user.with_context(|| format!("User '{}' not found", id_or_email))
}

async fn handle_token_action(action: TokenAction, pool: &Arc<PgPool>) -> Result<()> {
    let repo = PgTokenRepository::new(pool.clone());

    match action {
        TokenAction::Create { user, name, yes } => {
            let users = PgUserRepository::new(pool.clone());
            let owner = find_user(&users, &user).await?;
            create_token(&repo, &owner, name, yes).await?;
        }
        TokenAction::List => list_tokens(&repo).await?,
        TokenAction::Revoke { name_or_id } => revoke_token(&repo, &name_or_id).await?,
    }

    Ok(())
}

/// Issues a token for `owner`.
///
/// Only the HMAC of the token is stored; the raw value is shown once.
async fn create_token(
    repo: &PgTokenRepository,
    owner: &User,
    name: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    let secret = std::env::var("TOKEN_SIGNING_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .context("TOKEN_SIGNING_SECRET must be set")?;

    println!("{}", "🔑 Create API Token".bright_blue().bold());
    println!();

    let token_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name")
            .with_initial_text("CMS")
            .interact_text()?,
    };

    println!("  Owner: {} ({})", owner.email.cyan(), owner.role);
    println!("  Name:  {}", token_name.cyan());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let token_value = generate_raw_token();
    let token_hash = hash_token(&secret, &token_value)?;

    repo.issue(owner.id, &token_name, &token_hash)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!("{}", "✅ Token created".green().bold());
    println!();
    println!("  {}", token_value.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  Save this token now. It cannot be shown again.".red().bold()
    );
    println!();
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/smartlinks",
        token_value.bright_yellow()
    );
    println!();

    Ok(())
}

async fn list_tokens(repo: &PgTokenRepository) -> Result<()> {
    println!("{}", "📋 API Tokens".bright_blue().bold());
    println!();

    let tokens = repo
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list tokens: {}", e))?;

    if tokens.is_empty() {
        println!("{}", "  No tokens found".yellow());
        return Ok(());
    }

    println!(
        "  {:<4} {:<28} {:<26} {:<17} {:<17} {:<8}",
        "ID".bright_white().bold(),
        "Owner".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Last used".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(84).bright_black());

    for token in &tokens {
        let status = if token.is_active() {
            "ACTIVE".green()
        } else {
            "REVOKED".red()
        };
        let last_used = token
            .last_used_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "  {:<4} {:<28} {:<26} {:<17} {:<17} {}",
            token.id.to_string().bright_black(),
            token.owner_email,
            token.name.cyan(),
            token.created_at.format("%Y-%m-%d %H:%M").to_string().bright_black(),
            last_used.bright_black(),
            status
        );
    }

    println!();
    println!("  Total: {}", tokens.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn revoke_token(repo: &PgTokenRepository, name_or_id: &str) -> Result<()> {
    let token = repo
        .find(TokenSelector::parse(name_or_id))
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .with_context(|| format!("Token '{}' not found", name_or_id))?;

    if !token.is_active() {
        println!("{}", "⚠️  This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token: {}", token.name.cyan());
    println!("  Owner: {}", token.owner_email.cyan());
    println!("  ID:    {}", token.id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    let revoked = repo
        .revoke(token.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))?;

    if revoked {
        println!("{}", "✅ Token revoked".green().bold());
    } else {
        println!("{}", "⚠️  Token was revoked concurrently".yellow());
    }
    Ok(())
}

/// SmartLinks per status, total views and clicks, active tokens.
async fn handle_stats(pool: &Arc<PgPool>) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let totals = PgSmartLinkRepository::new(pool.clone())
        .totals()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load totals: {}", e))?;

    for (status, count) in &totals.by_status {
        println!(
            "  {:<14} {}",
            format!("{}:", status),
            count.to_string().bright_green().bold()
        );
    }
    println!(
        "  {:<14} {}",
        "Views:",
        totals.total_views.to_string().bright_green().bold()
    );
    println!(
        "  {:<14} {}",
        "Clicks:",
        totals.total_clicks.to_string().bright_green().bold()
    );

    let tokens_count = PgTokenRepository::new(pool.clone())
        .count_active()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count tokens: {}", e))?;
    println!(
        "  {:<14} {}",
        "Active tokens:",
        tokens_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());
            sqlx::query("SELECT 1").fetch_one(pool).await?;
            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let smartlinks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM smartlinks")
                .fetch_one(pool)
                .await?;
            let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  SmartLinks: {}", smartlinks);
            println!("  Users:      {}", users);
            println!();
        }
    }

    Ok(())
}
