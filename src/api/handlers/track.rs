//! Click tracking posted by the landing page script.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde_json::json;

use crate::api::dto::track::{TrackClickRequest, TrackClickResponse};
use crate::domain::entities::Platform;
use crate::error::AppError;
use crate::state::AppState;

/// Counts a click on one platform button.
///
/// # Endpoint
///
/// `POST /track/click`
///
/// # Request Body
///
/// ```json
/// { "smartlinkId": 42, "platform": "spotify", "position": 0 }
/// ```
///
/// # Errors
///
/// - 400 when `smartlinkId` or `platform` is missing, or the platform is unknown
/// - 404 when no record has that id
pub async fn track_click_handler(
    State(state): State<AppState>,
    payload: Result<Json<TrackClickRequest>, JsonRejection>,
) -> Result<Json<TrackClickResponse>, AppError> {
    let Json(payload) = payload?;

    let (Some(id), Some(platform)) = (payload.smartlink_id, payload.platform.as_deref()) else {
        return Err(AppError::bad_request(
            "smartlinkId and platform are required",
            json!({
                "smartlinkId": payload.smartlink_id.is_some(),
                "platform": payload.platform.is_some(),
            }),
        ));
    };

    let platform: Platform = platform.parse().map_err(|_| {
        AppError::bad_request("Unknown platform", json!({ "platform": platform }))
    })?;

    let counters = state.smartlink_service.record_click(id, platform).await?;

    Ok(Json(TrackClickResponse {
        success: true,
        total_clicks: counters.total_clicks,
        platform_clicks: counters.platform_clicks,
    }))
}
