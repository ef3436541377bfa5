//! Defaults applied once when a SmartLink is constructed.

use super::smartlink::{AnalyticsConfig, DesignConfig, SeoConfig, TrackerConfig};

pub const SEO_TITLE_MAX: usize = 60;
pub const SEO_DESCRIPTION_MAX: usize = 160;
pub const DEFAULT_OG_TYPE: &str = "music.song";
pub const DEFAULT_TWITTER_CARD: &str = "summary_large_image";

/// Fills the optional analytics, SEO and design blocks of a new record.
pub struct SmartLinkDefaults;

impl SmartLinkDefaults {
    /// GA4, GTM and Meta enabled without ids; TikTok and Google Ads off.
    pub fn analytics() -> AnalyticsConfig {
        AnalyticsConfig {
            ga4: TrackerConfig::enabled_without_id(),
            gtm: TrackerConfig::enabled_without_id(),
            meta_pixel: TrackerConfig::enabled_without_id(),
            tiktok_pixel: TrackerConfig::default(),
            google_ads: TrackerConfig::default(),
            custom_scripts: Vec::new(),
        }
    }

    pub fn seo_title(title: &str, artist: &str) -> String {
        truncate_chars(&format!("{} - {}", title, artist), SEO_TITLE_MAX)
    }

    pub fn seo_description(title: &str, artist: &str) -> String {
        truncate_chars(
            &format!(
                "Listen to \"{}\" by {} on every streaming platform",
                title, artist
            ),
            SEO_DESCRIPTION_MAX,
        )
    }

    /// Missing SEO fields are generated from the track title and artist.
    pub fn seo(seo: Option<SeoConfig>, title: &str, artist: &str) -> SeoConfig {
        let mut seo = seo.unwrap_or_default();

        if seo.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
            seo.title = Some(Self::seo_title(title, artist));
        }
        if seo
            .description
            .as_deref()
            .is_none_or(|d| d.trim().is_empty())
        {
            seo.description = Some(Self::seo_description(title, artist));
        }
        if seo.og_type.is_none() {
            seo.og_type = Some(DEFAULT_OG_TYPE.to_string());
        }
        if seo.twitter_card.is_none() {
            seo.twitter_card = Some(DEFAULT_TWITTER_CARD.to_string());
        }

        seo
    }

    /// Returns the three configuration blocks with defaults applied.
    pub fn apply(
        title: &str,
        artist: &str,
        analytics: Option<AnalyticsConfig>,
        seo: Option<SeoConfig>,
        design: Option<DesignConfig>,
    ) -> (AnalyticsConfig, SeoConfig, DesignConfig) {
        (
            analytics.unwrap_or_else(Self::analytics),
            Self::seo(seo, title, artist),
            design.unwrap_or_default(),
        )
    }
}

/// Cuts `s` to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
