//! Odesli (song.link) client resolving one streaming URL into all platforms.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::entities::{GLOBAL_COUNTRY, Platform, PlatformLink};
use crate::domain::platform_lookup::{LookupResult, PlatformLookup};
use crate::error::AppError;

pub const DEFAULT_API_BASE: &str = "https://api.song.link/v1-alpha.1";

const USER_AGENT: &str = concat!("smartlink/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OdesliResponse {
    entity_unique_id: Option<String>,
    page_url: Option<String>,
    #[serde(default)]
    entities_by_unique_id: BTreeMap<String, OdesliEntity>,
    #[serde(default)]
    links_by_platform: BTreeMap<String, OdesliLink>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OdesliEntity {
    title: Option<String>,
    artist_name: Option<String>,
    album_name: Option<String>,
    thumbnail_url: Option<String>,
    isrc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OdesliLink {
    url: String,
}

/// Maps an Odesli platform key to ours. Unknown platforms are skipped.
fn map_platform(key: &str) -> Option<Platform> {
    let platform = match key {
        "spotify" => Platform::Spotify,
        "appleMusic" => Platform::AppleMusic,
        "itunes" => Platform::Itunes,
        "youtubeMusic" => Platform::YoutubeMusic,
        "youtube" => Platform::Youtube,
        "deezer" => Platform::Deezer,
        "tidal" => Platform::Tidal,
        "soundcloud" => Platform::Soundcloud,
        "bandcamp" => Platform::Bandcamp,
        "amazonMusic" => Platform::AmazonMusic,
        "audiomack" => Platform::Audiomack,
        "pandora" => Platform::Pandora,
        "napster" => Platform::Napster,
        "qobuz" => Platform::Qobuz,
        "beatport" => Platform::Beatport,
        _ => return None,
    };
    Some(platform)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

fn into_result(response: OdesliResponse) -> Result<LookupResult, AppError> {
    if response.links_by_platform.is_empty() {
        return Err(AppError::not_found(
            "No platform links found for this URL",
            json!({}),
        ));
    }

    let mut entities = response.entities_by_unique_id;
    let entity = response
        .entity_unique_id
        .and_then(|id| entities.remove(&id))
        .or_else(|| entities.into_values().next());

    let platforms = response
        .links_by_platform
        .into_iter()
        .filter_map(|(key, link)| {
            map_platform(&key).map(|platform| PlatformLink {
                platform,
                url: link.url,
                is_available: true,
                priority: 0,
                affiliate_url: None,
                country: GLOBAL_COUNTRY.to_string(),
            })
        })
        .collect();

    let (title, artist, album, artwork, isrc) = match entity {
        Some(e) => (
            e.title.unwrap_or_default(),
            e.artist_name.unwrap_or_default(),
            non_empty(e.album_name),
            non_empty(e.thumbnail_url),
            non_empty(e.isrc),
        ),
        None => Default::default(),
    };

    Ok(LookupResult {
        title,
        artist,
        album,
        artwork,
        isrc,
        page_url: response.page_url,
        platforms,
    })
}

pub struct OdesliClient {
    http_client: reqwest::Client,
    api_base: String,
}

impl OdesliClient {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::internal("Failed to build HTTP client", json!({ "reason": e.to_string() }))
            })?;

        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PlatformLookup for OdesliClient {
    async fn lookup(&self, source_url: &str, country: &str) -> Result<LookupResult, AppError> {
        let url = format!("{}/links", self.api_base);
        tracing::debug!(source_url, country, "Querying Odesli");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("url", source_url),
                ("userCountry", country),
                ("songIfSingle", "true"),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Odesli request failed");
                AppError::internal("Link lookup failed", json!({ "reason": e.to_string() }))
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::not_found(
                "Content not found on streaming platforms",
                json!({ "url": source_url }),
            ));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::rate_limited(
                "Link lookup rate limit reached, try again later",
                json!({}),
            ));
        }

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Odesli returned an error");
            return Err(AppError::internal(
                "Link lookup failed",
                json!({ "status": status.as_u16() }),
            ));
        }

        let body: OdesliResponse = response.json().await.map_err(|e| {
            AppError::internal("Invalid lookup response", json!({ "reason": e.to_string() }))
        })?;

        let result = into_result(body)?;
        tracing::info!(
            source_url,
            platforms = result.platforms.len(),
            "Odesli lookup resolved"
        );
        Ok(result)
    }
}
