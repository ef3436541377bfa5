//! DTOs for the public click-tracking endpoint.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

/// Request body for `POST /track/click`.
///
/// Every field is optional at the parsing stage so that a missing
/// `smartlinkId` or `platform` is reported as a 400 by the handler.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackClickRequest {
    /// Accepts a JSON number or a numeric string.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub smartlink_id: Option<i64>,

    #[serde(default)]
    pub platform: Option<String>,

    /// Zero-based button index, informational only.
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackClickResponse {
    pub success: bool,
    pub total_clicks: i64,
    pub platform_clicks: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_ids() {
        let req: TrackClickRequest =
            serde_json::from_str(r#"{"smartlinkId": 12, "platform": "spotify"}"#).unwrap();
        assert_eq!(req.smartlink_id, Some(12));

        let req: TrackClickRequest =
            serde_json::from_str(r#"{"smartlinkId": "12", "platform": "spotify", "position": 1}"#)
                .unwrap();
        assert_eq!(req.smartlink_id, Some(12));
        assert_eq!(req.position, Some(1));
    }

    #[test]
    fn test_missing_fields_parse() {
        let req: TrackClickRequest = serde_json::from_str("{}").unwrap();
        assert!(req.smartlink_id.is_none());
        assert!(req.platform.is_none());
    }
}
