//! API and public route tables.
//!
//! Layers are applied by [`crate::routes`]; these functions only map paths
//! to handlers.

use crate::api::handlers::{
    create_smartlink_handler, delete_smartlink_handler, fetch_platform_links_handler,
    get_smartlink_handler, health_handler, list_smartlinks_handler, public_smartlink_handler,
    publish_smartlink_handler, short_id_page_handler, sitemap_handler,
    smartlink_analytics_handler, smartlink_page_handler, track_click_handler,
    unpublish_smartlink_handler, update_smartlink_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin routes, mounted under `/api/smartlinks`.
///
/// # Endpoints
///
/// - `GET    /`                      - List the caller's SmartLinks (paginated)
/// - `POST   /`                      - Create a draft
/// - `POST   /fetch-platform-links`  - Resolve links from a streaming URL
/// - `GET    /{id}`                  - Fetch one record
/// - `PUT    /{id}`                  - Partial update
/// - `DELETE /{id}`                  - Delete
/// - `PUT    /{id}/publish`          - Publish
/// - `PUT    /{id}/unpublish`        - Back to draft
/// - `GET    /{id}/analytics`        - Views, clicks and platform shares
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_smartlinks_handler).post(create_smartlink_handler),
        )
        .route("/fetch-platform-links", post(fetch_platform_links_handler))
        .route(
            "/{id}",
            get(get_smartlink_handler)
                .put(update_smartlink_handler)
                .delete(delete_smartlink_handler),
        )
        .route("/{id}/publish", put(publish_smartlink_handler))
        .route("/{id}/unpublish", put(unpublish_smartlink_handler))
        .route("/{id}/analytics", get(smartlink_analytics_handler))
}

/// Anonymous routes.
///
/// # Endpoints
///
/// - `GET  /s/{slug}`                       - Landing page by slug
/// - `GET  /{shortId}`                      - Landing page by shortId
/// - `POST /track/click`                    - Click counter
/// - `GET  /sitemap-smartlinks.xml`         - Sitemap
/// - `GET  /api/public/smartlinks/{slug}`   - Public JSON projection
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/s/{slug}", get(smartlink_page_handler))
        .route("/track/click", post(track_click_handler))
        .route("/sitemap-smartlinks.xml", get(sitemap_handler))
        .route("/api/public/smartlinks/{slug}", get(public_smartlink_handler))
        .route("/{short_id}", get(short_id_page_handler))
}

/// `GET /health`, never rate limited.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
