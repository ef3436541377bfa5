//! Admin endpoints for SmartLink management.
//!
//! Every handler runs behind [`crate::api::middleware::auth`], which puts the
//! calling [`User`] into the request extensions. Ownership is enforced by the
//! service, so a record owned by someone else answers 403 on every route.

use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use validator::Validate;

use crate::api::dto::pagination::{ListSmartLinksQuery, PageMeta};
use crate::api::dto::smartlink::{
    CreateSmartLinkRequest, FetchPlatformLinksRequest, SmartLinkListResponse, SmartLinkResponse,
    UpdateSmartLinkRequest,
};
use crate::application::services::SmartLinkAnalytics;
use crate::domain::entities::User;
use crate::domain::platform_lookup::LookupResult;
use crate::error::AppError;
use crate::state::AppState;

/// Lists the caller's SmartLinks.
///
/// # Endpoint
///
/// `GET /api/smartlinks?page=1&limit=10&status=published&artist=aria&sortBy=title&sortOrder=asc`
///
/// # Errors
///
/// Returns 400 when `page < 1` or `limit` is outside `1..=100`.
pub async fn list_smartlinks_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListSmartLinksQuery>,
    headers: HeaderMap,
) -> Result<Json<SmartLinkListResponse>, AppError> {
    let (page, limit) = query.pagination.resolve()?;
    let filter = query.filter(user.id);

    let (records, total) = state.smartlink_service.list(filter, page, limit).await?;
    let base_url = state.base_url(&headers);

    Ok(Json(SmartLinkListResponse {
        data: records
            .into_iter()
            .map(|r| SmartLinkResponse::new(r, &base_url))
            .collect(),
        pagination: PageMeta::new(page, limit, total),
    }))
}

/// Creates a draft SmartLink owned by the caller.
///
/// # Endpoint
///
/// `POST /api/smartlinks`
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Nightfall",
///   "artist": "Aria",
///   "artwork": "https://img.example.com/nightfall.jpg",
///   "platforms": [{ "platform": "spotify", "url": "https://open.spotify.com/track/1" }]
/// }
/// ```
///
/// The slug comes from the title unless one is given; both identifiers are
/// made unique before the insert.
///
/// # Errors
///
/// - 400 on malformed JSON or invalid fields (ISRC, UPC, URLs, lengths)
/// - 503 when no unique identifier could be allocated
pub async fn create_smartlink_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    payload: Result<Json<CreateSmartLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SmartLinkResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let record = state.smartlink_service.create(&user, payload.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(SmartLinkResponse::new(record, &state.base_url(&headers))),
    ))
}

/// `GET /api/smartlinks/{id}`
pub async fn get_smartlink_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SmartLinkResponse>, AppError> {
    let record = state.smartlink_service.get_owned(&user, id).await?;
    Ok(Json(SmartLinkResponse::new(record, &state.base_url(&headers))))
}

/// Partially updates a SmartLink.
///
/// # Endpoint
///
/// `PUT /api/smartlinks/{id}`
///
/// Absent fields are left unchanged; `null` clears nullable fields. A new
/// slug is normalized and de-duplicated like on creation.
pub async fn update_smartlink_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    payload: Result<Json<UpdateSmartLinkRequest>, JsonRejection>,
) -> Result<Json<SmartLinkResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let record = state
        .smartlink_service
        .update(&user, id, payload.into())
        .await?;
    Ok(Json(SmartLinkResponse::new(record, &state.base_url(&headers))))
}

/// `DELETE /api/smartlinks/{id}`
///
/// Responds 204 on success.
pub async fn delete_smartlink_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.smartlink_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/smartlinks/{id}/publish`
///
/// The first publication stamps `publishedAt`.
pub async fn publish_smartlink_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SmartLinkResponse>, AppError> {
    let record = state.smartlink_service.publish(&user, id).await?;
    Ok(Json(SmartLinkResponse::new(record, &state.base_url(&headers))))
}

/// `PUT /api/smartlinks/{id}/unpublish`
pub async fn unpublish_smartlink_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SmartLinkResponse>, AppError> {
    let record = state.smartlink_service.unpublish(&user, id).await?;
    Ok(Json(SmartLinkResponse::new(record, &state.base_url(&headers))))
}

/// Views, clicks, conversion rate and per-platform click shares.
///
/// # Endpoint
///
/// `GET /api/smartlinks/{id}/analytics`
pub async fn smartlink_analytics_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<SmartLinkAnalytics>, AppError> {
    Ok(Json(state.smartlink_service.analytics(&user, id).await?))
}

/// Resolves a streaming URL into metadata and links on other platforms.
///
/// # Endpoint
///
/// `POST /api/smartlinks/fetch-platform-links`
///
/// # Errors
///
/// Upstream failures map to 404 (unknown track), 429 (throttled) or 500.
pub async fn fetch_platform_links_handler(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
    payload: Result<Json<FetchPlatformLinksRequest>, JsonRejection>,
) -> Result<Json<LookupResult>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let country = payload
        .country
        .as_deref()
        .unwrap_or(&state.default_country);

    let result = state
        .platform_lookup
        .lookup(&payload.source_url, country)
        .await?;

    tracing::debug!(
        source = %payload.source_url,
        platforms = result.platforms.len(),
        "Platform links resolved"
    );
    Ok(Json(result))
}
