#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use smartlink::application::services::{DevIdentityProvider, SmartLinkService};
use smartlink::domain::entities::{
    AnalyticsConfig, DesignConfig, Platform, PlatformLink, SeoConfig, SmartLink, SmartLinkStatus,
};
use smartlink::domain::platform_lookup::{LookupResult, PlatformLookup};
use smartlink::domain::repositories::SmartLinkRepository;
use smartlink::domain::view_event::ViewEvent;
use smartlink::error::AppError;
use smartlink::infrastructure::cache::NullCache;
use smartlink::infrastructure::persistence::MemorySmartLinkRepository;
use smartlink::routes::base_router;
use smartlink::state::AppState;

pub const BROWSER_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 Safari/605.1.15";
pub const BOT_UA: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
pub const BASE_URL: &str = "https://links.test";

/// Link resolver that answers from a fixed table instead of the network.
pub struct StubLookup;

#[async_trait]
impl PlatformLookup for StubLookup {
    async fn lookup(&self, source_url: &str, _country: &str) -> Result<LookupResult, AppError> {
        if source_url.contains("unknown") {
            return Err(AppError::not_found(
                "Track not found",
                json!({ "sourceUrl": source_url }),
            ));
        }
        if source_url.contains("throttled") {
            return Err(AppError::rate_limited("Too many lookups", json!({})));
        }

        Ok(LookupResult {
            title: "Nightfall".to_string(),
            artist: "Aria".to_string(),
            platforms: vec![
                platform(Platform::Spotify, "GLOBAL", 0),
                platform(Platform::Deezer, "GLOBAL", 0),
            ],
            ..Default::default()
        })
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub repo: Arc<MemorySmartLinkRepository>,
    pub views: mpsc::Receiver<ViewEvent>,
}

impl TestApp {
    /// Drains queued view events.
    pub fn queued_views(&mut self) -> Vec<i64> {
        let mut ids = Vec::new();
        while let Ok(ev) = self.views.try_recv() {
            ids.push(ev.smartlink_id);
        }
        ids
    }
}

pub fn create_test_state(
    repo: Arc<MemorySmartLinkRepository>,
) -> (AppState, mpsc::Receiver<ViewEvent>) {
    let (tx, rx) = mpsc::channel(100);
    let cache = Arc::new(NullCache::new());
    let repository: Arc<dyn SmartLinkRepository> = repo;

    let state = AppState {
        smartlink_service: Arc::new(SmartLinkService::new(
            repository,
            cache.clone(),
            Duration::from_secs(2),
        )),
        identity: Arc::new(DevIdentityProvider::new()),
        platform_lookup: Arc::new(StubLookup),
        cache,
        view_sender: tx,
        public_base_url: Some(BASE_URL.to_string()),
        default_country: "FR".to_string(),
        behind_proxy: false,
    };

    (state, rx)
}

pub fn test_app() -> TestApp {
    let repo = Arc::new(MemorySmartLinkRepository::new());
    let (state, views) = create_test_state(repo.clone());
    let server = TestServer::new(base_router(state)).unwrap();

    TestApp {
        server,
        repo,
        views,
    }
}

pub fn platform(platform: Platform, country: &str, priority: i32) -> PlatformLink {
    PlatformLink {
        platform,
        url: format!("https://{}.example.com/track/1", platform.as_str()),
        is_available: true,
        priority,
        affiliate_url: None,
        country: country.to_string(),
    }
}

/// Published, public record owned by the development admin.
pub fn published(slug: &str, short_id: &str) -> SmartLink {
    let now = Utc::now();
    SmartLink {
        id: 0,
        slug: slug.to_string(),
        short_id: short_id.to_string(),
        title: "Nightfall".to_string(),
        artist: "Aria".to_string(),
        subtitle: None,
        artwork: "https://img.example.com/nightfall.jpg".to_string(),
        release_date: None,
        genre: None,
        isrc: None,
        upc: None,
        platforms: vec![
            platform(Platform::Spotify, "GLOBAL", 0),
            platform(Platform::Deezer, "FR", 1),
            platform(Platform::Pandora, "US", 2),
        ],
        analytics: AnalyticsConfig::default(),
        seo: SeoConfig::default(),
        design: DesignConfig::default(),
        owner_id: DevIdentityProvider::DEV_USER_ID,
        status: SmartLinkStatus::Published,
        is_public: true,
        total_views: 0,
        total_clicks: 0,
        conversion_rate: 0.0,
        platform_click_stats: BTreeMap::new(),
        created_at: now,
        updated_at: now,
        published_at: Some(now),
        expires_at: None,
        last_viewed_at: None,
    }
}
