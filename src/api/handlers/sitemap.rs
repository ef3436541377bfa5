//! XML sitemap of the published SmartLinks.

use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};

use crate::error::AppError;
use crate::render::render_sitemap;
use crate::state::AppState;

/// `GET /sitemap-smartlinks.xml`
///
/// Published, public, unexpired records, most recently updated first.
pub async fn sitemap_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.smartlink_service.sitemap_entries().await?;
    let xml = render_sitemap(&entries, &state.base_url(&headers))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        xml,
    ))
}
