//! In-process SmartLink store.
//!
//! Enforces the same unique constraints as the PostgreSQL schema. Used by the
//! HTTP tests and for running the service without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use crate::domain::entities::{
    ClickCounters, NewSmartLink, Platform, SmartLink, SmartLinkStatus, conversion_rate,
};
use crate::domain::repositories::{
    SitemapEntry, SmartLinkFilter, SmartLinkRepository, SmartLinkTotals, SortKey, SortOrder,
};
use crate::error::{AppError, IdentifierField};

#[derive(Default)]
struct Store {
    next_id: i64,
    records: BTreeMap<i64, SmartLink>,
}

impl Store {
    fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> bool {
        self.records
            .values()
            .any(|r| r.slug == slug && Some(r.id) != exclude_id)
    }
}

#[derive(Default)]
pub struct MemorySmartLinkRepository {
    store: Mutex<Store>,
}

impl MemorySmartLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed record as-is, replacing its id. Test seeding helper.
    pub async fn seed(&self, mut record: SmartLink) -> SmartLink {
        let mut store = self.store.lock().await;
        store.next_id += 1;
        record.id = store.next_id;
        store.records.insert(record.id, record.clone());
        record
    }
}

fn matches(record: &SmartLink, filter: &SmartLinkFilter) -> bool {
    let contains = |haystack: &str, needle: &Option<String>| match needle.as_deref() {
        Some(n) if !n.is_empty() => haystack.to_lowercase().contains(&n.to_lowercase()),
        _ => true,
    };

    record.owner_id == filter.owner_id
        && filter.status.is_none_or(|s| record.status == s)
        && contains(&record.artist, &filter.artist)
        && contains(&record.title, &filter.title)
}

fn compare(a: &SmartLink, b: &SmartLink, key: SortKey) -> Ordering {
    match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortKey::Title => a.title.cmp(&b.title),
        SortKey::Artist => a.artist.cmp(&b.artist),
        SortKey::TotalViews => a.total_views.cmp(&b.total_views),
        SortKey::TotalClicks => a.total_clicks.cmp(&b.total_clicks),
        SortKey::PublishedAt => a.published_at.cmp(&b.published_at),
    }
}

fn not_found(id: i64) -> AppError {
    AppError::not_found("SmartLink not found", json!({ "id": id }))
}

#[async_trait]
impl SmartLinkRepository for MemorySmartLinkRepository {
    async fn insert(&self, new: NewSmartLink) -> Result<SmartLink, AppError> {
        let mut store = self.store.lock().await;

        if store.slug_taken(&new.slug, None) {
            return Err(AppError::identifier_conflict(IdentifierField::Slug));
        }
        if store.records.values().any(|r| r.short_id == new.short_id) {
            return Err(AppError::identifier_conflict(IdentifierField::ShortId));
        }

        store.next_id += 1;
        let now = Utc::now();
        let record = SmartLink {
            id: store.next_id,
            slug: new.slug,
            short_id: new.short_id,
            title: new.title,
            artist: new.artist,
            subtitle: new.subtitle,
            artwork: new.artwork,
            release_date: new.release_date,
            genre: new.genre,
            isrc: new.isrc,
            upc: new.upc,
            platforms: new.platforms,
            analytics: new.analytics,
            seo: new.seo,
            design: new.design,
            owner_id: new.owner_id,
            status: SmartLinkStatus::Draft,
            is_public: new.is_public,
            total_views: 0,
            total_clicks: 0,
            conversion_rate: 0.0,
            platform_click_stats: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            published_at: None,
            expires_at: new.expires_at,
            last_viewed_at: None,
        };

        store.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SmartLink>, AppError> {
        Ok(self.store.lock().await.records.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<SmartLink>, AppError> {
        let store = self.store.lock().await;
        Ok(store.records.values().find(|r| r.slug == slug).cloned())
    }

    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<SmartLink>, AppError> {
        let store = self.store.lock().await;
        Ok(store.records.values().find(|r| r.short_id == short_id).cloned())
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        Ok(self.store.lock().await.slug_taken(slug, exclude_id))
    }

    async fn short_id_exists(&self, short_id: &str) -> Result<bool, AppError> {
        let store = self.store.lock().await;
        Ok(store.records.values().any(|r| r.short_id == short_id))
    }

    async fn list(
        &self,
        filter: SmartLinkFilter,
        page: i64,
        limit: i64,
    ) -> Result<Vec<SmartLink>, AppError> {
        let store = self.store.lock().await;
        let mut items: Vec<SmartLink> = store
            .records
            .values()
            .filter(|r| matches(r, &filter))
            .cloned()
            .collect();

        items.sort_by(|a, b| {
            let ord = compare(a, b, filter.sort_by).then_with(|| a.id.cmp(&b.id));
            match filter.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let skip = (page.max(1) - 1).saturating_mul(limit).max(0) as usize;
        Ok(items
            .into_iter()
            .skip(skip)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, filter: SmartLinkFilter) -> Result<i64, AppError> {
        let store = self.store.lock().await;
        Ok(store.records.values().filter(|r| matches(r, &filter)).count() as i64)
    }

    async fn update_content(&self, record: SmartLink) -> Result<SmartLink, AppError> {
        let mut store = self.store.lock().await;

        if store.slug_taken(&record.slug, Some(record.id)) {
            return Err(AppError::identifier_conflict(IdentifierField::Slug));
        }

        let stored = store
            .records
            .get_mut(&record.id)
            .ok_or_else(|| not_found(record.id))?;

        stored.slug = record.slug;
        stored.title = record.title;
        stored.artist = record.artist;
        stored.subtitle = record.subtitle;
        stored.artwork = record.artwork;
        stored.release_date = record.release_date;
        stored.genre = record.genre;
        stored.isrc = record.isrc;
        stored.upc = record.upc;
        stored.platforms = record.platforms;
        stored.analytics = record.analytics;
        stored.seo = record.seo;
        stored.design = record.design;
        stored.is_public = record.is_public;
        stored.expires_at = record.expires_at;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn set_status(
        &self,
        id: i64,
        status: SmartLinkStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<SmartLink, AppError> {
        let mut store = self.store.lock().await;
        let stored = store.records.get_mut(&id).ok_or_else(|| not_found(id))?;

        stored.status = status;
        stored.published_at = published_at;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.store.lock().await.records.remove(&id).is_some())
    }

    async fn record_view(&self, id: i64) -> Result<(), AppError> {
        let mut store = self.store.lock().await;
        if let Some(stored) = store.records.get_mut(&id) {
            stored.total_views += 1;
            stored.last_viewed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn record_click(
        &self,
        id: i64,
        platform: Platform,
    ) -> Result<Option<ClickCounters>, AppError> {
        let mut store = self.store.lock().await;
        let Some(stored) = store.records.get_mut(&id) else {
            return Ok(None);
        };

        stored.total_clicks += 1;
        let platform_clicks = {
            let entry = stored
                .platform_click_stats
                .entry(platform.as_str().to_string())
                .or_insert(0);
            *entry += 1;
            *entry
        };
        if let Some(rate) = conversion_rate(stored.total_clicks, stored.total_views) {
            stored.conversion_rate = rate;
        }

        Ok(Some(ClickCounters {
            total_clicks: stored.total_clicks,
            platform_clicks,
            conversion_rate: stored.conversion_rate,
        }))
    }

    async fn list_sitemap(&self) -> Result<Vec<SitemapEntry>, AppError> {
        let store = self.store.lock().await;
        let now = Utc::now();

        let mut entries: Vec<SitemapEntry> = store
            .records
            .values()
            .filter(|r| r.is_publicly_visible(now))
            .map(|r| SitemapEntry {
                slug: r.slug.clone(),
                updated_at: r.updated_at,
            })
            .collect();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(entries)
    }

    async fn totals(&self) -> Result<SmartLinkTotals, AppError> {
        let store = self.store.lock().await;

        let by_status = SmartLinkStatus::ALL
            .iter()
            .map(|s| {
                let n = store.records.values().filter(|r| r.status == *s).count() as i64;
                (*s, n)
            })
            .filter(|(_, n)| *n > 0)
            .collect();

        Ok(SmartLinkTotals {
            by_status,
            total_views: store.records.values().map(|r| r.total_views).sum(),
            total_clicks: store.records.values().map(|r| r.total_clicks).sum(),
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
