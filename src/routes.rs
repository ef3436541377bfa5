//! Top-level router.
//!
//! # Route Structure
//!
//! - `GET  /s/{slug}`, `GET /{shortId}` - Landing pages (public)
//! - `POST /track/click`                - Click tracking (public)
//! - `GET  /sitemap-smartlinks.xml`     - Sitemap (public)
//! - `GET  /api/public/smartlinks/{slug}` - Public JSON (public)
//! - `/api/smartlinks/*`                - Admin API (bearer token)
//! - `GET  /health`                     - Database, cache and view queue status
//!
//! # Middleware
//!
//! - **Tracing** - Request spans with status and latency
//! - **Rate limiting** - Per-IP token bucket, stricter on the admin API
//! - **Identity** - Bearer token resolved by the configured provider
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Admin routes behind identity resolution. Rate limiting must be layered on
/// top so that rejected tokens still count against the client.
fn identified_admin(state: &AppState) -> Router<AppState> {
    api::routes::admin_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
}

fn compose(state: AppState, admin: Router<AppState>, public: Router<AppState>) -> Router {
    Router::new()
        .nest("/api/smartlinks", admin)
        .merge(public)
        .merge(api::routes::health_routes())
        .with_state(state)
}

/// All routes with identity resolution, but no rate limiting, tracing or
/// path normalization. The HTTP tests drive this one since they have no peer
/// address for the limiter.
pub fn base_router(state: AppState) -> Router {
    let admin = identified_admin(&state);
    compose(state, admin, api::routes::public_routes())
}

/// Production router. `behind_proxy` switches the rate limiter key from the
/// socket peer to the forwarded client address.
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let admin = identified_admin(&state).layer(rate_limit::secure_layer(behind_proxy));
    let public = api::routes::public_routes().layer(rate_limit::layer(behind_proxy));

    let router = compose(state, admin, public).layer(tracing::layer());
    NormalizePathLayer::trim_trailing_slash().layer(router)
}
