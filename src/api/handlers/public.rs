//! Public SmartLink landing pages.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};

use crate::domain::entities::SmartLink;
use crate::domain::view_worker::enqueue_view;
use crate::error::AppError;
use crate::render::{NotFoundPage, RenderContext, render_smartlink};
use crate::state::AppState;
use crate::utils::country::resolve_country;
use crate::utils::slug::is_valid_slug;

const PAGE_CACHE_CONTROL: &str = "public, max-age=3600";

/// Renders the landing page of a published SmartLink.
///
/// # Endpoint
///
/// `GET /s/{slug}`
///
/// # Request Flow
///
/// 1. Reject slugs that could never have been allocated (no store query)
/// 2. Resolve the record through the cache, falling back to the store
/// 3. Queue a view event unless the visitor is a crawler
/// 4. Render HTML for the visitor's country
///
/// Unknown, draft, private and expired records all get the same 404 page.
pub async fn smartlink_page_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !is_valid_slug(&slug) {
        return not_found_page();
    }

    let result = state.smartlink_service.find_public_by_slug(&slug).await;
    respond(&state, &headers, result)
}

/// Same as [`smartlink_page_handler`], keyed by shortId.
///
/// # Endpoint
///
/// `GET /{shortId}`
///
/// Anything that is not 8 uppercase alphanumerics is a 404 without a store
/// query.
pub async fn short_id_page_handler(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let result = state.smartlink_service.find_public_by_short_id(&short_id).await;
    respond(&state, &headers, result)
}

fn respond(state: &AppState, headers: &HeaderMap, result: Result<SmartLink, AppError>) -> Response {
    match result.and_then(|record| render_page(state, headers, &record)) {
        Ok(html) => (
            [(header::CACHE_CONTROL, PAGE_CACHE_CONTROL)],
            Html(html),
        )
            .into_response(),
        Err(AppError::NotFound { .. }) => not_found_page(),
        Err(e) => e.into_response(),
    }
}

fn render_page(state: &AppState, headers: &HeaderMap, record: &SmartLink) -> Result<String, AppError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let country = resolve_country(headers, &state.default_country);
    let ctx = RenderContext::new(record, user_agent, &country, &state.base_url(headers));

    if !ctx.is_bot {
        enqueue_view(&state.view_sender, record.id);
        metrics::counter!("smartlink_page_views_total").increment(1);
    }

    render_smartlink(record, &ctx)
}

fn not_found_page() -> Response {
    (StatusCode::NOT_FOUND, NotFoundPage {}).into_response()
}
