//! Public JSON projection of a SmartLink.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde_json::json;

use crate::api::dto::smartlink::PublicSmartLinkResponse;
use crate::error::AppError;
use crate::render::structured_data;
use crate::state::AppState;
use crate::utils::country::resolve_country;
use crate::utils::slug::is_valid_slug;

/// `GET /api/public/smartlinks/{slug}`
///
/// Same visibility rules as the landing page. Platforms are filtered for the
/// visitor's country; structured data lists every platform.
pub async fn public_smartlink_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PublicSmartLinkResponse>, AppError> {
    if !is_valid_slug(&slug) {
        return Err(AppError::not_found("SmartLink not found", json!({ "slug": slug })));
    }

    let record = state.smartlink_service.find_public_by_slug(&slug).await?;
    let base_url = state.base_url(&headers);
    let country = resolve_country(&headers, &state.default_country);
    let public_url = record.public_url(&base_url);

    Ok(Json(PublicSmartLinkResponse {
        platforms: record.platforms_for_country(&country),
        structured_data: structured_data(&record, &public_url),
        short_url: record.short_url(&base_url),
        public_url,
        id: record.id,
        slug: record.slug,
        short_id: record.short_id,
        title: record.title,
        artist: record.artist,
        subtitle: record.subtitle,
        artwork: record.artwork,
        release_date: record.release_date,
        genre: record.genre,
        design: record.design,
    }))
}
