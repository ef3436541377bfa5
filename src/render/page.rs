//! Public SmartLink landing page.
//!
//! [`render_smartlink`] is a pure function of the record and the request
//! context; counting the view is the caller's business.

use askama::Template;
use askama_web::WebTemplate;
use serde_json::json;

use crate::domain::entities::{PlatformLink, SmartLink};
use crate::error::AppError;
use crate::render::analytics::{AnalyticsMarkup, analytics_markup};
use crate::render::bot::is_bot;
use crate::render::css::{critical_css, sanitize_color};
use crate::render::escape::{safe_href, script_json};
use crate::render::seo::SeoMeta;
use crate::render::structured_data::structured_data;

/// Per-request inputs to the renderer.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub user_agent: String,
    /// Two-letter visitor country.
    pub country: String,
    /// Country-filtered, priority-sorted platforms shown as buttons.
    pub platforms: Vec<PlatformLink>,
    pub is_bot: bool,
    /// Scheme and host the visitor reached us on, without trailing slash.
    pub base_url: String,
}

impl RenderContext {
    pub fn new(record: &SmartLink, user_agent: &str, country: &str, base_url: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            country: country.to_string(),
            platforms: record.platforms_for_country(country),
            is_bot: is_bot(user_agent),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

struct PlatformButton<'a> {
    key: &'static str,
    name: &'static str,
    icon: &'static str,
    color: &'static str,
    href: &'a str,
    position: usize,
}

#[derive(Template)]
#[template(path = "smartlink.html")]
struct SmartLinkPage<'a> {
    smartlink_id: i64,
    seo: SeoMeta,
    theme_color: &'a str,
    analytics: AnalyticsMarkup,
    css: String,
    structured_data: String,
    title: &'a str,
    artist: &'a str,
    subtitle: Option<&'a str>,
    artwork: Option<&'a str>,
    buttons: Vec<PlatformButton<'a>>,
    /// Client script configuration; `None` for crawlers.
    tracking_config: Option<String>,
}

/// Renders the landing page for `record`.
///
/// Crawlers get the same markup minus tracker snippets and the click
/// tracking script, so link previews never count as traffic.
pub fn render_smartlink(record: &SmartLink, ctx: &RenderContext) -> Result<String, AppError> {
    let public_url = record.public_url(&ctx.base_url);
    let seo = SeoMeta::for_record(record, &public_url);

    let analytics = if ctx.is_bot {
        AnalyticsMarkup::default()
    } else {
        analytics_markup(&record.analytics, &seo.title, &ctx.country)
    };

    let buttons = ctx
        .platforms
        .iter()
        .enumerate()
        .map(|(position, link)| PlatformButton {
            key: link.platform.as_str(),
            name: link.platform.display_name(),
            icon: link.platform.icon(),
            color: link.platform.brand_color(),
            href: safe_href(&link.url),
            position,
        })
        .collect();

    let tracking_config = (!ctx.is_bot).then(|| {
        script_json(&json!({
            "smartlinkId": record.id,
            "trackUrl": format!("{}/track/click", ctx.base_url),
            "title": record.title,
            "artist": record.artist,
            "publicUrl": public_url,
            "country": ctx.country,
        }))
    });

    let page = SmartLinkPage {
        smartlink_id: record.id,
        theme_color: sanitize_color(&record.design.color_scheme.primary, "#1DB954"),
        analytics,
        css: critical_css(&record.design, &record.artwork),
        structured_data: script_json(&structured_data(record, &public_url)),
        title: &record.title,
        artist: &record.artist,
        subtitle: record.subtitle.as_deref().filter(|s| !s.trim().is_empty()),
        artwork: Some(record.artwork.as_str()).filter(|a| !a.trim().is_empty()),
        buttons,
        tracking_config,
        seo,
    };

    page.render().map_err(|e| {
        tracing::error!(error = %e, smartlink_id = record.id, "Failed to render SmartLink page");
        AppError::internal("Failed to render page", json!({}))
    })
}

/// Generic "link not found" page served with a 404 by the public routes.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::smartlink::fixtures::{platform, smartlink};
    use crate::domain::entities::{Platform, TrackerConfig};

    const BROWSER: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15";

    fn record() -> SmartLink {
        let mut record = smartlink(42, "nightfall");
        record.platforms = vec![
            platform(Platform::Deezer, "FR", 2),
            platform(Platform::Spotify, "GLOBAL", 1),
            platform(Platform::Tidal, "US", 0),
        ];
        record
    }

    fn render(record: &SmartLink, ua: &str, country: &str) -> String {
        let ctx = RenderContext::new(record, ua, country, "https://links.test/");
        render_smartlink(record, &ctx).unwrap()
    }

    #[test]
    fn test_context_filters_platforms() {
        let record = record();
        let ctx = RenderContext::new(&record, BROWSER, "FR", "https://links.test/");
        let keys: Vec<_> = ctx.platforms.iter().map(|p| p.platform).collect();
        assert_eq!(keys, vec![Platform::Spotify, Platform::Deezer]);
        assert_eq!(ctx.base_url, "https://links.test");
        assert!(!ctx.is_bot);
    }

    #[test]
    fn test_buttons_follow_filtered_order() {
        let html = render(&record(), BROWSER, "FR");
        assert_eq!(html.matches("class=\"platform-button\"").count(), 2);
        let spotify = html.find("data-platform=\"spotify\"").unwrap();
        let deezer = html.find("data-platform=\"deezer\"").unwrap();
        assert!(spotify < deezer);
        assert!(!html.contains("data-platform=\"tidal\""));
        assert!(html.contains("data-position=\"0\""));
        assert!(html.contains("data-smartlink-id=\"42\""));
    }

    #[test]
    fn test_structured_data_lists_all_platforms() {
        let html = render(&record(), BROWSER, "FR");
        assert_eq!(html.matches("\"@type\":\"EntryPoint\"").count(), 3);
    }

    #[test]
    fn test_zero_platforms_is_valid_page() {
        let record = smartlink(1, "empty");
        let html = render(&record, BROWSER, "FR");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(!html.contains("class=\"platform-button\""));
        assert!(html.contains("platform-list"));
    }

    #[test]
    fn test_empty_artwork_omits_images() {
        let mut record = record();
        record.artwork = String::new();
        let html = render(&record, BROWSER, "FR");
        assert!(!html.contains("class=\"album-cover\""));
        assert!(!html.contains("og:image"));
        assert!(html.contains("--sl-artwork: none;"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut record = record();
        record.title = "<b>Loud</b>".into();
        let html = render(&record, BROWSER, "FR");
        assert!(!html.contains("<b>Loud</b>"));
        assert!(html.contains("&lt;b&gt;Loud"));
    }

    #[test]
    fn test_tracking_script_posts_to_base_url() {
        let html = render(&record(), BROWSER, "FR");
        assert!(html.contains("\"trackUrl\":\"https://links.test/track/click\""));
        assert!(html.contains("clickTracked"));
    }

    #[test]
    fn test_bots_get_no_trackers() {
        let mut record = record();
        record.analytics.ga4 = TrackerConfig {
            enabled: true,
            id: Some("G-XYZ".into()),
        };

        let human = render(&record, BROWSER, "FR");
        assert!(human.contains("gtag/js?id=G-XYZ"));

        let bot = render(&record, "Googlebot/2.1", "FR");
        assert!(!bot.contains("gtag/js"));
        assert!(!bot.contains("clickTracked"));
        assert!(bot.contains("application/ld+json"));
        assert!(bot.contains("data-platform=\"spotify\""));
    }

    #[test]
    fn test_seo_tags() {
        let html = render(&record(), BROWSER, "FR");
        assert!(html.contains("<title>Nightfall - Aria</title>"));
        assert!(html.contains("<link rel=\"canonical\" href=\"https://links.test/s/nightfall\">"));
        assert!(html.contains("property=\"og:type\" content=\"music.song\""));
    }

    #[test]
    fn test_unsafe_platform_url_is_not_linked() {
        let mut record = smartlink(1, "x");
        let mut link = platform(Platform::Spotify, "GLOBAL", 0);
        link.url = "javascript:alert(1)".into();
        record.platforms = vec![link];
        let html = render(&record, BROWSER, "FR");
        assert!(!html.contains("javascript:alert"));
    }
}
