//! SmartLink entity: one landing page aggregating streaming links for a track.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Country value matching every requested country.
pub const GLOBAL_COUNTRY: &str = "GLOBAL";

/// Streaming platforms a SmartLink can point to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Spotify,
    AppleMusic,
    YoutubeMusic,
    Youtube,
    Deezer,
    Tidal,
    Soundcloud,
    Bandcamp,
    AmazonMusic,
    Qobuz,
    Audiomack,
    Beatport,
    Itunes,
    Pandora,
    Napster,
}

impl Platform {
    pub const ALL: [Platform; 15] = [
        Platform::Spotify,
        Platform::AppleMusic,
        Platform::YoutubeMusic,
        Platform::Youtube,
        Platform::Deezer,
        Platform::Tidal,
        Platform::Soundcloud,
        Platform::Bandcamp,
        Platform::AmazonMusic,
        Platform::Qobuz,
        Platform::Audiomack,
        Platform::Beatport,
        Platform::Itunes,
        Platform::Pandora,
        Platform::Napster,
    ];

    /// Stable key used in URLs, click reports and `platformClickStats`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spotify => "spotify",
            Self::AppleMusic => "apple_music",
            Self::YoutubeMusic => "youtube_music",
            Self::Youtube => "youtube",
            Self::Deezer => "deezer",
            Self::Tidal => "tidal",
            Self::Soundcloud => "soundcloud",
            Self::Bandcamp => "bandcamp",
            Self::AmazonMusic => "amazon_music",
            Self::Qobuz => "qobuz",
            Self::Audiomack => "audiomack",
            Self::Beatport => "beatport",
            Self::Itunes => "itunes",
            Self::Pandora => "pandora",
            Self::Napster => "napster",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Spotify => "Spotify",
            Self::AppleMusic => "Apple Music",
            Self::YoutubeMusic => "YouTube Music",
            Self::Youtube => "YouTube",
            Self::Deezer => "Deezer",
            Self::Tidal => "Tidal",
            Self::Soundcloud => "SoundCloud",
            Self::Bandcamp => "Bandcamp",
            Self::AmazonMusic => "Amazon Music",
            Self::Qobuz => "Qobuz",
            Self::Audiomack => "Audiomack",
            Self::Beatport => "Beatport",
            Self::Itunes => "iTunes",
            Self::Pandora => "Pandora",
            Self::Napster => "Napster",
        }
    }

    /// Button background color.
    pub fn brand_color(&self) -> &'static str {
        match self {
            Self::Spotify => "#1DB954",
            Self::AppleMusic | Self::Itunes => "#FA243C",
            Self::YoutubeMusic | Self::Youtube => "#FF0000",
            Self::Deezer | Self::Audiomack => "#FF6600",
            Self::Tidal => "#000000",
            Self::Soundcloud => "#FF3300",
            Self::Bandcamp => "#408294",
            Self::AmazonMusic => "#FF9900",
            Self::Qobuz => "#0070EF",
            Self::Beatport => "#01FF95",
            Self::Pandora => "#224099",
            Self::Napster => "#2259FF",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::AppleMusic | Self::Itunes => "🍎",
            Self::YoutubeMusic => "🎥",
            Self::Youtube => "📺",
            Self::Deezer => "🎧",
            Self::Tidal => "🌊",
            Self::Soundcloud => "☁️",
            Self::Bandcamp => "🎪",
            Self::AmazonMusic => "📦",
            Self::Audiomack => "🎤",
            _ => "🎵",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown platform '{}'", s))
    }
}

fn default_true() -> bool {
    true
}

fn default_country() -> String {
    GLOBAL_COUNTRY.to_string()
}

/// One streaming destination for the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformLink {
    pub platform: Platform,
    pub url: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
    /// 0 is the highest priority.
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_url: Option<String>,
    /// ISO 3166-1 alpha-2 code or `GLOBAL`.
    #[serde(default = "default_country")]
    pub country: String,
}

impl PlatformLink {
    /// Whether this entry should be offered to a visitor from `country`.
    pub fn matches_country(&self, country: &str) -> bool {
        self.country.eq_ignore_ascii_case(country) || self.country == GLOBAL_COUNTRY
    }
}

/// Enabled flag plus the vendor id (measurement id, container id, pixel id...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(
        default,
        alias = "measurementId",
        alias = "containerId",
        alias = "pixelId",
        alias = "conversionId",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
}

impl TrackerConfig {
    pub fn enabled_without_id() -> Self {
        Self {
            enabled: true,
            id: None,
        }
    }

    /// Returns the id only when the tracker is enabled and the id is non-blank.
    pub fn active_id(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptPosition {
    #[default]
    Head,
    Body,
}

/// Owner-supplied analytics snippet injected verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub script: String,
    #[serde(default)]
    pub position: ScriptPosition,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub ga4: TrackerConfig,
    #[serde(default)]
    pub gtm: TrackerConfig,
    #[serde(default)]
    pub meta_pixel: TrackerConfig,
    #[serde(default)]
    pub tiktok_pixel: TrackerConfig,
    #[serde(default)]
    pub google_ads: TrackerConfig,
    #[serde(default)]
    pub custom_scripts: Vec<CustomScript>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_card: Option<String>,
    /// Replaces the generated JSON-LD object when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignTemplate {
    #[default]
    Music,
    Landing,
    Event,
    Podcast,
}

impl DesignTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Landing => "landing",
            Self::Event => "event",
            Self::Podcast => "podcast",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScheme {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            primary: "#1DB954".to_string(),
            secondary: "#191414".to_string(),
            background: "#FFFFFF".to_string(),
            text: "#000000".to_string(),
            accent: None,
        }
    }
}

pub const DEFAULT_BACKGROUND_BLUR: u32 = 10;

fn default_blur() -> u32 {
    DEFAULT_BACKGROUND_BLUR
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignConfig {
    #[serde(default)]
    pub template: DesignTemplate,
    #[serde(default)]
    pub color_scheme: ColorScheme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// Blur radius in pixels.
    #[serde(default = "default_blur")]
    pub background_blur: u32,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default, rename = "customCSS", skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            template: DesignTemplate::Music,
            color_scheme: ColorScheme::default(),
            background_image: None,
            background_blur: DEFAULT_BACKGROUND_BLUR,
            dark_mode: false,
            custom_css: None,
        }
    }
}

/// Publication state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmartLinkStatus {
    #[default]
    Draft,
    Published,
    Archived,
    Disabled,
}

impl SmartLinkStatus {
    pub const ALL: [SmartLinkStatus; 4] = [
        SmartLinkStatus::Draft,
        SmartLinkStatus::Published,
        SmartLinkStatus::Archived,
        SmartLinkStatus::Disabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for SmartLinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmartLinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SmartLinkStatus::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| format!("Unknown status '{}'", s))
    }
}

/// A persisted SmartLink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartLink {
    pub id: i64,
    pub slug: String,
    pub short_id: String,
    pub title: String,
    pub artist: String,
    pub subtitle: Option<String>,
    pub artwork: String,
    pub release_date: Option<NaiveDate>,
    pub genre: Option<String>,
    pub isrc: Option<String>,
    pub upc: Option<String>,
    pub platforms: Vec<PlatformLink>,
    pub analytics: AnalyticsConfig,
    pub seo: SeoConfig,
    pub design: DesignConfig,
    pub owner_id: i64,
    pub status: SmartLinkStatus,
    pub is_public: bool,
    pub total_views: i64,
    pub total_clicks: i64,
    pub conversion_rate: f64,
    pub platform_click_stats: BTreeMap<String, i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_viewed_at: Option<DateTime<Utc>>,
}

impl SmartLink {
    /// Platforms offered to a visitor from `country`: entries for that country
    /// plus `GLOBAL` ones, ascending by priority (stable for equal priorities).
    pub fn platforms_for_country(&self, country: &str) -> Vec<PlatformLink> {
        let mut platforms: Vec<PlatformLink> = self
            .platforms
            .iter()
            .filter(|p| p.matches_country(country))
            .cloned()
            .collect();
        platforms.sort_by_key(|p| p.priority);
        platforms
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Whether anonymous visitors may see the page.
    pub fn is_publicly_visible(&self, now: DateTime<Utc>) -> bool {
        self.status == SmartLinkStatus::Published && self.is_public && !self.is_expired(now)
    }

    pub fn public_url(&self, base_url: &str) -> String {
        format!("{}/s/{}", base_url.trim_end_matches('/'), self.slug)
    }

    pub fn short_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.short_id)
    }

    /// Status and `published_at` after moving to `target`.
    ///
    /// The first publication stamps `published_at`; later transitions never
    /// overwrite or clear it.
    pub fn transition(
        &self,
        target: SmartLinkStatus,
        now: DateTime<Utc>,
    ) -> (SmartLinkStatus, Option<DateTime<Utc>>) {
        let published_at = match target {
            SmartLinkStatus::Published => Some(self.published_at.unwrap_or(now)),
            _ => self.published_at,
        };
        (target, published_at)
    }

    /// Applies an owner edit. Counters, identity, ownership and status are untouched.
    pub fn apply_patch(&mut self, patch: SmartLinkPatch) {
        if let Some(slug) = patch.slug {
            self.slug = slug;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(artist) = patch.artist {
            self.artist = artist;
        }
        if let Some(subtitle) = patch.subtitle {
            self.subtitle = subtitle;
        }
        if let Some(artwork) = patch.artwork {
            self.artwork = artwork;
        }
        if let Some(release_date) = patch.release_date {
            self.release_date = release_date;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(isrc) = patch.isrc {
            self.isrc = isrc;
        }
        if let Some(upc) = patch.upc {
            self.upc = upc;
        }
        if let Some(platforms) = patch.platforms {
            self.platforms = platforms;
        }
        if let Some(analytics) = patch.analytics {
            self.analytics = analytics;
        }
        if let Some(seo) = patch.seo {
            self.seo = seo;
        }
        if let Some(design) = patch.design {
            self.design = design;
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(expires_at) = patch.expires_at {
            self.expires_at = expires_at;
        }
    }
}

/// Conversion rate in percent, or `None` while there are no views.
pub fn conversion_rate(total_clicks: i64, total_views: i64) -> Option<f64> {
    if total_views <= 0 {
        return None;
    }
    Some(total_clicks as f64 / total_views as f64 * 100.0)
}

/// Counter state returned after a click is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickCounters {
    pub total_clicks: i64,
    pub platform_clicks: i64,
    pub conversion_rate: f64,
}

/// Input for inserting a SmartLink whose identifiers are already allocated.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSmartLink {
    pub slug: String,
    pub short_id: String,
    pub owner_id: i64,
    pub title: String,
    pub artist: String,
    pub subtitle: Option<String>,
    pub artwork: String,
    pub release_date: Option<NaiveDate>,
    pub genre: Option<String>,
    pub isrc: Option<String>,
    pub upc: Option<String>,
    pub platforms: Vec<PlatformLink>,
    pub analytics: AnalyticsConfig,
    pub seo: SeoConfig,
    pub design: DesignConfig,
    pub is_public: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial owner edit.
///
/// `None` leaves a field unchanged; for nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmartLinkPatch {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub subtitle: Option<Option<String>>,
    pub artwork: Option<String>,
    pub release_date: Option<Option<NaiveDate>>,
    pub genre: Option<Option<String>>,
    pub isrc: Option<Option<String>>,
    pub upc: Option<Option<String>>,
    pub platforms: Option<Vec<PlatformLink>>,
    pub analytics: Option<AnalyticsConfig>,
    pub seo: Option<SeoConfig>,
    pub design: Option<DesignConfig>,
    pub is_public: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn platform(platform: Platform, country: &str, priority: i32) -> PlatformLink {
        PlatformLink {
            platform,
            url: format!("https://{}.example.com/track", platform.as_str()),
            is_available: true,
            priority,
            affiliate_url: None,
            country: country.to_string(),
        }
    }

    pub fn smartlink(id: i64, slug: &str) -> SmartLink {
        let now = Utc::now();
        SmartLink {
            id,
            slug: slug.to_string(),
            short_id: "ABCD1234".to_string(),
            title: "Nightfall".to_string(),
            artist: "Aria".to_string(),
            subtitle: None,
            artwork: "https://img.example.com/nightfall.jpg".to_string(),
            release_date: None,
            genre: None,
            isrc: None,
            upc: None,
            platforms: vec![],
            analytics: AnalyticsConfig::default(),
            seo: SeoConfig::default(),
            design: DesignConfig::default(),
            owner_id: 1,
            status: SmartLinkStatus::Draft,
            is_public: true,
            total_views: 0,
            total_clicks: 0,
            conversion_rate: 0.0,
            platform_click_stats: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            published_at: None,
            expires_at: None,
            last_viewed_at: None,
        }
    }
}
