//! DTOs for the SmartLink admin and public JSON endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use validator::Validate;

use crate::application::services::CreateSmartLink;
use crate::domain::entities::{
    AnalyticsConfig, DesignConfig, GLOBAL_COUNTRY, Platform, PlatformLink, SeoConfig, SmartLink,
    SmartLinkPatch,
};

static ISRC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{3}[0-9]{7}$").unwrap());

static UPC_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{12}$").unwrap());

/// Two-letter country code or `GLOBAL`.
static COUNTRY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Z]{2}|GLOBAL)$").unwrap());

fn default_true() -> bool {
    true
}

fn default_country() -> String {
    GLOBAL_COUNTRY.to_string()
}

/// One streaming destination as submitted by the owner.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlatformLinkInput {
    pub platform: Platform,

    #[validate(url(message = "Invalid platform URL"))]
    pub url: String,

    #[serde(default = "default_true")]
    pub is_available: bool,

    #[serde(default)]
    pub priority: i32,

    #[validate(url(message = "Invalid affiliate URL"))]
    pub affiliate_url: Option<String>,

    #[serde(default = "default_country")]
    #[validate(regex(path = "*COUNTRY_REGEX", message = "Country must be a two-letter code or GLOBAL"))]
    pub country: String,
}

impl From<PlatformLinkInput> for PlatformLink {
    fn from(input: PlatformLinkInput) -> Self {
        Self {
            platform: input.platform,
            url: input.url,
            is_available: input.is_available,
            priority: input.priority,
            affiliate_url: input.affiliate_url,
            country: input.country,
        }
    }
}

/// SEO block as submitted by the owner.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SeoInput {
    #[validate(length(max = 60, message = "SEO title must be at most 60 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 160, message = "SEO description must be at most 160 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[validate(url(message = "Invalid og:image URL"))]
    pub og_image: Option<String>,

    pub og_type: Option<String>,

    pub twitter_card: Option<String>,

    pub structured_data: Option<Value>,
}

impl From<SeoInput> for SeoConfig {
    fn from(input: SeoInput) -> Self {
        Self {
            title: input.title,
            description: input.description,
            keywords: input.keywords,
            og_image: input.og_image,
            og_type: input.og_type,
            twitter_card: input.twitter_card,
            structured_data: input.structured_data,
        }
    }
}

/// Request body for `POST /api/smartlinks`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSmartLinkRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required (max 200 characters)"))]
    pub title: String,

    #[validate(length(min = 1, max = 200, message = "Artist is required (max 200 characters)"))]
    pub artist: String,

    /// Proposed slug; derived from the title when absent.
    #[validate(length(min = 1, max = 100))]
    pub slug: Option<String>,

    #[validate(length(max = 200))]
    pub subtitle: Option<String>,

    #[validate(url(message = "Invalid artwork URL"))]
    pub artwork: Option<String>,

    pub release_date: Option<NaiveDate>,

    #[validate(length(max = 100))]
    pub genre: Option<String>,

    #[validate(regex(path = "*ISRC_REGEX", message = "Invalid ISRC format"))]
    pub isrc: Option<String>,

    #[validate(regex(path = "*UPC_REGEX", message = "UPC must be 12 digits"))]
    pub upc: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub platforms: Vec<PlatformLinkInput>,

    pub analytics: Option<AnalyticsConfig>,

    #[validate(nested)]
    pub seo: Option<SeoInput>,

    pub design: Option<DesignConfig>,

    pub is_public: Option<bool>,

    pub expires_at: Option<DateTime<Utc>>,
}

impl From<CreateSmartLinkRequest> for CreateSmartLink {
    fn from(req: CreateSmartLinkRequest) -> Self {
        Self {
            title: req.title.trim().to_string(),
            artist: req.artist.trim().to_string(),
            slug: req.slug,
            subtitle: req.subtitle,
            artwork: req.artwork.unwrap_or_default(),
            release_date: req.release_date,
            genre: req.genre,
            isrc: req.isrc,
            upc: req.upc,
            platforms: req.platforms.into_iter().map(PlatformLink::from).collect(),
            analytics: req.analytics,
            seo: req.seo.map(SeoConfig::from),
            design: req.design,
            is_public: req.is_public,
            expires_at: req.expires_at,
        }
    }
}

/// Request body for `PUT /api/smartlinks/{id}`.
///
/// Only provided fields change. For nullable fields, `null` clears the value
/// and an absent key leaves it untouched.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSmartLinkRequest {
    #[validate(length(min = 1, max = 100))]
    pub slug: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub artist: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 200))]
    pub subtitle: Option<Option<String>>,

    #[validate(url(message = "Invalid artwork URL"))]
    pub artwork: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub release_date: Option<Option<NaiveDate>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 100))]
    pub genre: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(regex(path = "*ISRC_REGEX", message = "Invalid ISRC format"))]
    pub isrc: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(regex(path = "*UPC_REGEX", message = "UPC must be 12 digits"))]
    pub upc: Option<Option<String>>,

    #[validate(nested)]
    pub platforms: Option<Vec<PlatformLinkInput>>,

    pub analytics: Option<AnalyticsConfig>,

    #[validate(nested)]
    pub seo: Option<SeoInput>,

    pub design: Option<DesignConfig>,

    pub is_public: Option<bool>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateSmartLinkRequest> for SmartLinkPatch {
    fn from(req: UpdateSmartLinkRequest) -> Self {
        Self {
            slug: req.slug,
            title: req.title.map(|t| t.trim().to_string()),
            artist: req.artist.map(|a| a.trim().to_string()),
            subtitle: req.subtitle,
            artwork: req.artwork,
            release_date: req.release_date,
            genre: req.genre,
            isrc: req.isrc,
            upc: req.upc,
            platforms: req
                .platforms
                .map(|p| p.into_iter().map(PlatformLink::from).collect()),
            analytics: req.analytics,
            seo: req.seo.map(SeoConfig::from),
            design: req.design,
            is_public: req.is_public,
            expires_at: req.expires_at,
        }
    }
}

/// Full record as returned to its owner, plus the derived public URLs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartLinkResponse {
    #[serde(flatten)]
    pub record: SmartLink,
    pub public_url: String,
    pub short_url: String,
}

impl SmartLinkResponse {
    pub fn new(record: SmartLink, base_url: &str) -> Self {
        Self {
            public_url: record.public_url(base_url),
            short_url: record.short_url(base_url),
            record,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SmartLinkListResponse {
    pub data: Vec<SmartLinkResponse>,
    pub pagination: super::pagination::PageMeta,
}

/// Public projection served by `GET /api/public/smartlinks/{slug}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSmartLinkResponse {
    pub id: i64,
    pub slug: String,
    pub short_id: String,
    pub title: String,
    pub artist: String,
    pub subtitle: Option<String>,
    pub artwork: String,
    pub release_date: Option<NaiveDate>,
    pub genre: Option<String>,
    /// Filtered and ordered for the visitor's country.
    pub platforms: Vec<PlatformLink>,
    pub design: DesignConfig,
    pub public_url: String,
    pub short_url: String,
    pub structured_data: Value,
}

/// Request body for `POST /api/smartlinks/fetch-platform-links`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FetchPlatformLinksRequest {
    #[validate(url(message = "Invalid source URL"))]
    pub source_url: String,

    #[validate(regex(path = "*COUNTRY_REGEX", message = "Country must be a two-letter code"))]
    pub country: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_body() -> Value {
        json!({
            "title": "Nightfall",
            "artist": "Aria",
            "artwork": "https://img.test/nightfall.jpg",
            "platforms": [
                { "platform": "spotify", "url": "https://open.spotify.com/track/1" }
            ]
        })
    }

    #[test]
    fn test_create_minimal_is_valid() {
        let req: CreateSmartLinkRequest = serde_json::from_value(create_body()).unwrap();
        assert!(req.validate().is_ok());

        let input = CreateSmartLink::from(req);
        assert_eq!(input.platforms[0].country, "GLOBAL");
        assert!(input.platforms[0].is_available);
        assert_eq!(input.platforms[0].priority, 0);
    }

    #[test]
    fn test_isrc_and_upc_formats() {
        let mut body = create_body();
        body["isrc"] = json!("USRC17607839");
        body["upc"] = json!("123456789012");
        let req: CreateSmartLinkRequest = serde_json::from_value(body.clone()).unwrap();
        assert!(req.validate().is_ok());

        body["isrc"] = json!("usrc17607839");
        let req: CreateSmartLinkRequest = serde_json::from_value(body.clone()).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("isrc"));

        body["isrc"] = json!("USRC17607839");
        body["upc"] = json!("12345");
        let req: CreateSmartLinkRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().unwrap_err().field_errors().contains_key("upc"));
    }

    #[test]
    fn test_empty_title_is_invalid() {
        let mut body = create_body();
        body["title"] = json!("");
        let req: CreateSmartLinkRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().unwrap_err().field_errors().contains_key("title"));
    }

    #[test]
    fn test_bad_platform_url_is_invalid() {
        let mut body = create_body();
        body["platforms"][0]["url"] = json!("not a url");
        let req: CreateSmartLinkRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_unknown_platform_fails_to_parse() {
        let mut body = create_body();
        body["platforms"][0]["platform"] = json!("myspace");
        assert!(serde_json::from_value::<CreateSmartLinkRequest>(body).is_err());
    }

    #[test]
    fn test_long_seo_title_is_invalid() {
        let mut body = create_body();
        body["seo"] = json!({ "title": "x".repeat(61) });
        let req: CreateSmartLinkRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_null_clears_and_absent_keeps() {
        let req: UpdateSmartLinkRequest =
            serde_json::from_value(json!({ "genre": null, "title": "New" })).unwrap();
        assert!(req.validate().is_ok());

        let patch = SmartLinkPatch::from(req);
        assert_eq!(patch.genre, Some(None));
        assert_eq!(patch.subtitle, None);
        assert_eq!(patch.title.as_deref(), Some("New"));
    }

    #[test]
    fn test_update_isrc_validated() {
        let req: UpdateSmartLinkRequest =
            serde_json::from_value(json!({ "isrc": "bad" })).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_fetch_request_country() {
        let ok: FetchPlatformLinksRequest = serde_json::from_value(
            json!({ "sourceUrl": "https://open.spotify.com/track/1", "country": "FR" }),
        )
        .unwrap();
        assert!(ok.validate().is_ok());

        let bad: FetchPlatformLinksRequest = serde_json::from_value(
            json!({ "sourceUrl": "https://open.spotify.com/track/1", "country": "france" }),
        )
        .unwrap();
        assert!(bad.validate().is_err());
    }
}
