//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, identity selection, the view
//! worker and the Axum server lifecycle.

use crate::application::services::{
    DevIdentityProvider, IdentityProvider, SmartLinkService, TokenIdentityProvider,
};
use crate::config::{AuthMode, CacheConfig, Config};
use crate::domain::entities::{NewUser, User, UserRole};
use crate::domain::platform_lookup::PlatformLookup;
use crate::domain::repositories::{SmartLinkRepository, UserRepository};
use crate::domain::view_worker::run_view_worker;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::odesli::OdesliClient;
use crate::infrastructure::persistence::{
    PgSmartLinkRepository, PgTokenRepository, PgUserRepository,
};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Redis cache (or NullCache fallback)
/// - Identity provider (token based unless `BYPASS_AUTH=true`, which also
///   ensures the development user exists)
/// - Background view worker
/// - Axum HTTP server with graceful shutdown on Ctrl-C
///
/// # Errors
///
/// Returns an error if the database is unreachable, migrations fail, the
/// listener cannot bind or the server stops with an error.
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout)
        .idle_timeout(config.database.idle_timeout)
        .max_lifetime(config.database.max_lifetime)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;

    let cache = connect_cache(&config.cache).await;
    let pool = Arc::new(pool);

    let repository: Arc<dyn SmartLinkRepository> =
        Arc::new(PgSmartLinkRepository::new(pool.clone()));

    let (view_tx, view_rx) = mpsc::channel(config.pages.view_queue_capacity);
    tokio::spawn(run_view_worker(
        view_rx,
        repository.clone(),
        config.database.store_timeout,
    ));
    tracing::info!("View worker started");

    let platform_lookup: Arc<dyn PlatformLookup> = Arc::new(OdesliClient::new(
        &config.lookup.api_base,
        config.lookup.timeout,
    )?);

    let state = AppState {
        smartlink_service: Arc::new(SmartLinkService::new(
            repository,
            cache.clone(),
            config.database.store_timeout,
        )),
        identity: identity_provider(&config.auth, &pool).await?,
        platform_lookup,
        cache,
        view_sender: view_tx,
        public_base_url: config.pages.public_base_url.clone(),
        default_country: config.pages.default_country.clone(),
        behind_proxy: config.http.behind_proxy,
    };

    let app = app_router(state, config.http.behind_proxy);

    let addr = config.http.listen;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn connect_cache(config: &CacheConfig) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.ttl_seconds).await {
        Ok(redis) => {
            tracing::info!(ttl = config.ttl_seconds, "Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

async fn identity_provider(
    auth: &AuthMode,
    pool: &Arc<PgPool>,
) -> Result<Arc<dyn IdentityProvider>> {
    let users = Arc::new(PgUserRepository::new(pool.clone()));

    let AuthMode::Token { signing_secret } = auth else {
        let user = dev_user(users.as_ref()).await?;
        tracing::warn!(
            user_id = user.id,
            "BYPASS_AUTH=true: every admin request runs as the development admin. Never enable this in production."
        );
        return Ok(Arc::new(DevIdentityProvider::with_user(user)));
    };

    Ok(Arc::new(TokenIdentityProvider::new(
        Arc::new(PgTokenRepository::new(pool.clone())),
        users,
        signing_secret.clone(),
    )))
}

/// Loads the development admin, creating it on first start so that records
/// it creates satisfy the owner foreign key.
async fn dev_user(users: &PgUserRepository) -> Result<User> {
    if let Some(user) = users.find_by_email(DevIdentityProvider::DEV_USER_EMAIL).await? {
        return Ok(user);
    }

    let user = users
        .create(NewUser {
            email: DevIdentityProvider::DEV_USER_EMAIL.to_string(),
            name: DevIdentityProvider::DEV_USER_NAME.to_string(),
            role: UserRole::Admin,
        })
        .await
        .context("Failed to create development user")?;
    tracing::info!(user_id = user.id, "Development user created");
    Ok(user)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
