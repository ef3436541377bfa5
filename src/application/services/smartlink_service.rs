//! SmartLink lifecycle: creation, owner edits, publication, public lookups
//! and counters.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;

use super::identifier_allocator::IdentifierAllocator;
use crate::domain::authorization::ensure_can_mutate;
use crate::domain::entities::{
    AnalyticsConfig, ClickCounters, DesignConfig, NewSmartLink, Platform, PlatformLink, SeoConfig,
    SmartLink, SmartLinkDefaults, SmartLinkPatch, SmartLinkStatus, User, conversion_rate,
};
use crate::domain::repositories::{SitemapEntry, SmartLinkFilter, SmartLinkRepository};
use crate::error::{AppError, IdentifierField};
use crate::infrastructure::cache::{CacheKey, CacheService};
use crate::utils::short_id::is_valid_short_id;
use crate::utils::timeout::bounded;

/// Inserts that lose a unique-index race are retried this many times in total.
pub const MAX_INSERT_ATTEMPTS: u32 = 5;

/// Validated creation input. Optional configuration blocks get defaults.
#[derive(Debug, Clone, Default)]
pub struct CreateSmartLink {
    pub title: String,
    pub artist: String,
    /// Proposed slug; the title is used when absent.
    pub slug: Option<String>,
    pub subtitle: Option<String>,
    pub artwork: String,
    pub release_date: Option<NaiveDate>,
    pub genre: Option<String>,
    pub isrc: Option<String>,
    pub upc: Option<String>,
    pub platforms: Vec<PlatformLink>,
    pub analytics: Option<AnalyticsConfig>,
    pub seo: Option<SeoConfig>,
    pub design: Option<DesignConfig>,
    pub is_public: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Clicks on one platform and their share of all clicks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformShare {
    pub platform: String,
    pub clicks: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartLinkAnalytics {
    pub smartlink_id: i64,
    pub total_views: i64,
    pub total_clicks: i64,
    pub conversion_rate: f64,
    pub last_viewed_at: Option<DateTime<Utc>>,
    /// Descending by clicks.
    pub platforms: Vec<PlatformShare>,
}

/// Service for SmartLink records.
///
/// Every store call is bounded by the configured timeout. Public lookups go
/// through the cache; every mutation invalidates it.
pub struct SmartLinkService<R: SmartLinkRepository + ?Sized> {
    repository: Arc<R>,
    cache: Arc<dyn CacheService>,
    allocator: IdentifierAllocator<R>,
    store_timeout: Duration,
}

impl<R: SmartLinkRepository + ?Sized> SmartLinkService<R> {
    pub fn new(repository: Arc<R>, cache: Arc<dyn CacheService>, store_timeout: Duration) -> Self {
        Self {
            allocator: IdentifierAllocator::new(repository.clone(), store_timeout),
            repository,
            cache,
            store_timeout,
        }
    }

    /// Creates a draft owned by `owner`.
    ///
    /// Identifiers are allocated right before the insert. When the insert
    /// still hits a unique index, both are re-allocated and the insert retried.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] when allocation or the insert retries are exhausted.
    pub async fn create(&self, owner: &User, input: CreateSmartLink) -> Result<SmartLink, AppError> {
        let (analytics, seo, design) = SmartLinkDefaults::apply(
            &input.title,
            &input.artist,
            input.analytics,
            input.seo,
            input.design,
        );
        let slug_source = input
            .slug
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&input.title)
            .to_string();

        for attempt in 1..=MAX_INSERT_ATTEMPTS {
            let slug = self.allocator.allocate_slug(&slug_source, None).await?;
            let short_id = self.allocator.allocate_short_id().await?;

            let new = NewSmartLink {
                slug,
                short_id,
                owner_id: owner.id,
                title: input.title.clone(),
                artist: input.artist.clone(),
                subtitle: input.subtitle.clone(),
                artwork: input.artwork.clone(),
                release_date: input.release_date,
                genre: input.genre.clone(),
                isrc: input.isrc.clone(),
                upc: input.upc.clone(),
                platforms: input.platforms.clone(),
                analytics: analytics.clone(),
                seo: seo.clone(),
                design: design.clone(),
                is_public: input.is_public.unwrap_or(true),
                expires_at: input.expires_at,
            };

            match bounded(self.store_timeout, "insert", self.repository.insert(new)).await {
                Ok(record) => {
                    tracing::info!(
                        id = record.id,
                        slug = %record.slug,
                        short_id = %record.short_id,
                        owner_id = owner.id,
                        "SmartLink created"
                    );
                    return Ok(record);
                }
                Err(e) => match e.conflict_field() {
                    Some(field) => {
                        metrics::counter!(
                            "smartlink_identifier_collisions_total",
                            "field" => field.as_str()
                        )
                        .increment(1);
                        tracing::debug!(attempt, field = field.as_str(), "Insert lost identifier race");
                    }
                    None => return Err(e),
                },
            }
        }

        Err(AppError::unavailable(
            "Could not allocate a unique identifier, try again",
            json!({ "attempts": MAX_INSERT_ATTEMPTS }),
        ))
    }

    async fn load(&self, id: i64) -> Result<SmartLink, AppError> {
        bounded(self.store_timeout, "find_by_id", self.repository.find_by_id(id))
            .await?
            .ok_or_else(|| AppError::not_found("SmartLink not found", json!({ "id": id })))
    }

    /// Loads a record the requesting user owns.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`] if absent, [`AppError::Forbidden`] if owned by someone else.
    pub async fn get_owned(&self, user: &User, id: i64) -> Result<SmartLink, AppError> {
        let record = self.load(id).await?;
        ensure_can_mutate(&record, user)?;
        Ok(record)
    }

    /// One page of the caller's records plus the total match count.
    pub async fn list(
        &self,
        filter: SmartLinkFilter,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<SmartLink>, i64), AppError> {
        let items = bounded(
            self.store_timeout,
            "list",
            self.repository.list(filter.clone(), page, limit),
        )
        .await?;
        let total = bounded(self.store_timeout, "count", self.repository.count(filter)).await?;
        Ok((items, total))
    }

    /// Applies an owner edit.
    ///
    /// A changed slug is normalized and made unique (ignoring the record
    /// itself); resubmitting the current slug is a no-op for the slug.
    pub async fn update(
        &self,
        user: &User,
        id: i64,
        mut patch: SmartLinkPatch,
    ) -> Result<SmartLink, AppError> {
        let current = self.get_owned(user, id).await?;
        let requested_slug = patch
            .slug
            .take()
            .filter(|s| !s.trim().is_empty() && *s != current.slug);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut record = current.clone();
            record.apply_patch(patch.clone());

            if let Some(requested) = &requested_slug {
                record.slug = self.allocator.allocate_slug(requested, Some(id)).await?;
            }

            let result = bounded(
                self.store_timeout,
                "update_content",
                self.repository.update_content(record),
            )
            .await;

            match result {
                Ok(updated) => {
                    self.invalidate(&[&current, &updated]).await;
                    tracing::info!(id, slug = %updated.slug, "SmartLink updated");
                    return Ok(updated);
                }
                Err(e)
                    if e.conflict_field() == Some(IdentifierField::Slug)
                        && attempt < MAX_INSERT_ATTEMPTS =>
                {
                    tracing::debug!(id, attempt, "Slug taken concurrently, re-allocating");
                }
                Err(e) if e.conflict_field().is_some() => {
                    return Err(AppError::unavailable(
                        "Could not allocate a unique identifier, try again",
                        json!({ "attempts": MAX_INSERT_ATTEMPTS }),
                    ));
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn delete(&self, user: &User, id: i64) -> Result<(), AppError> {
        let record = self.get_owned(user, id).await?;

        let deleted = bounded(self.store_timeout, "delete", self.repository.delete(id)).await?;
        if !deleted {
            return Err(AppError::not_found("SmartLink not found", json!({ "id": id })));
        }

        self.invalidate(&[&record]).await;
        tracing::info!(id, slug = %record.slug, "SmartLink deleted");
        Ok(())
    }

    /// Publishes the record. The first publication stamps `published_at`.
    pub async fn publish(&self, user: &User, id: i64) -> Result<SmartLink, AppError> {
        self.transition(user, id, SmartLinkStatus::Published).await
    }

    /// Returns the record to draft, keeping `published_at`.
    pub async fn unpublish(&self, user: &User, id: i64) -> Result<SmartLink, AppError> {
        self.transition(user, id, SmartLinkStatus::Draft).await
    }

    async fn transition(
        &self,
        user: &User,
        id: i64,
        target: SmartLinkStatus,
    ) -> Result<SmartLink, AppError> {
        let record = self.get_owned(user, id).await?;
        let (status, published_at) = record.transition(target, Utc::now());

        let updated = bounded(
            self.store_timeout,
            "set_status",
            self.repository.set_status(id, status, published_at),
        )
        .await?;

        self.invalidate(&[&record]).await;
        tracing::info!(id, status = %status, "SmartLink status changed");
        Ok(updated)
    }

    /// Views, clicks and the per-platform breakdown of an owned record.
    pub async fn analytics(&self, user: &User, id: i64) -> Result<SmartLinkAnalytics, AppError> {
        let record = self.get_owned(user, id).await?;
        Ok(build_analytics(&record))
    }

    /// Resolves a publicly visible record by slug.
    pub async fn find_public_by_slug(&self, slug: &str) -> Result<SmartLink, AppError> {
        let key = CacheKey::Slug(slug);
        if let Some(record) = self.cached(key).await {
            return self.visible(record);
        }

        let record = bounded(
            self.store_timeout,
            "find_by_slug",
            self.repository.find_by_slug(slug),
        )
        .await?
        .ok_or_else(|| AppError::not_found("SmartLink not found", json!({ "slug": slug })))?;

        let record = self.visible(record)?;
        self.store_cached(key, &record).await;
        Ok(record)
    }

    /// Resolves a publicly visible record by shortId.
    ///
    /// A malformed shortId is rejected as not found without touching the
    /// cache or the store.
    pub async fn find_public_by_short_id(&self, short_id: &str) -> Result<SmartLink, AppError> {
        if !is_valid_short_id(short_id) {
            return Err(AppError::not_found(
                "SmartLink not found",
                json!({ "shortId": short_id }),
            ));
        }

        let key = CacheKey::ShortId(short_id);
        if let Some(record) = self.cached(key).await {
            return self.visible(record);
        }

        let record = bounded(
            self.store_timeout,
            "find_by_short_id",
            self.repository.find_by_short_id(short_id),
        )
        .await?
        .ok_or_else(|| AppError::not_found("SmartLink not found", json!({ "shortId": short_id })))?;

        let record = self.visible(record)?;
        self.store_cached(key, &record).await;
        Ok(record)
    }

    /// Counts a click on `platform` for record `id`.
    pub async fn record_click(&self, id: i64, platform: Platform) -> Result<ClickCounters, AppError> {
        let counters = bounded(
            self.store_timeout,
            "record_click",
            self.repository.record_click(id, platform),
        )
        .await?
        .ok_or_else(|| AppError::not_found("SmartLink not found", json!({ "id": id })))?;

        metrics::counter!("smartlink_clicks_total", "platform" => platform.as_str()).increment(1);
        tracing::debug!(id, platform = %platform, total = counters.total_clicks, "Click recorded");
        Ok(counters)
    }

    pub async fn sitemap_entries(&self) -> Result<Vec<SitemapEntry>, AppError> {
        bounded(self.store_timeout, "list_sitemap", self.repository.list_sitemap()).await
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        bounded(self.store_timeout, "ping", self.repository.ping()).await
    }

    fn visible(&self, record: SmartLink) -> Result<SmartLink, AppError> {
        if record.is_publicly_visible(Utc::now()) {
            Ok(record)
        } else {
            Err(AppError::not_found(
                "SmartLink not found",
                json!({ "slug": record.slug }),
            ))
        }
    }

    async fn cached(&self, key: CacheKey<'_>) -> Option<SmartLink> {
        let raw = self.cache.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(%key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn store_cached(&self, key: CacheKey<'_>, record: &SmartLink) {
        match serde_json::to_string(record) {
            Ok(raw) => self.cache.put(key, &raw).await,
            Err(e) => tracing::warn!(%key, error = %e, "Failed to encode record for cache"),
        }
    }

    async fn invalidate(&self, records: &[&SmartLink]) {
        let keys: Vec<CacheKey<'_>> = records
            .iter()
            .flat_map(|r| [CacheKey::Slug(&r.slug), CacheKey::ShortId(&r.short_id)])
            .collect();
        self.cache.evict(&keys).await;
    }
}

/// Analytics summary derived from the stored counters.
pub fn build_analytics(record: &SmartLink) -> SmartLinkAnalytics {
    let clicked: i64 = record.platform_click_stats.values().sum();

    let mut platforms: Vec<PlatformShare> = record
        .platform_click_stats
        .iter()
        .map(|(platform, &clicks)| PlatformShare {
            platform: platform.clone(),
            clicks,
            percentage: if clicked > 0 {
                clicks as f64 / clicked as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect();
    platforms.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.platform.cmp(&b.platform)));

    SmartLinkAnalytics {
        smartlink_id: record.id,
        total_views: record.total_views,
        total_clicks: record.total_clicks,
        conversion_rate: conversion_rate(record.total_clicks, record.total_views).unwrap_or(0.0),
        last_viewed_at: record.last_viewed_at,
        platforms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UserRole;
    use crate::domain::entities::smartlink::fixtures::smartlink;
    use crate::domain::repositories::MockSmartLinkRepository;
    use crate::infrastructure::cache::NullCache;

    fn owner(id: i64) -> User {
        User {
            id,
            email: "owner@example.com".to_string(),
            name: "Owner".to_string(),
            role: UserRole::Artist,
            created_at: Utc::now(),
        }
    }

    fn service(repo: MockSmartLinkRepository) -> SmartLinkService<MockSmartLinkRepository> {
        SmartLinkService::new(
            Arc::new(repo),
            Arc::new(NullCache::new()),
            Duration::from_secs(1),
        )
    }

    fn inserted(new: NewSmartLink) -> SmartLink {
        let mut record = smartlink(1, &new.slug);
        record.short_id = new.short_id;
        record.owner_id = new.owner_id;
        record.title = new.title;
        record.artist = new.artist;
        record.seo = new.seo;
        record.analytics = new.analytics;
        record
    }

    fn input(title: &str) -> CreateSmartLink {
        CreateSmartLink {
            title: title.to_string(),
            artist: "Aria".to_string(),
            artwork: "https://img.example.com/a.jpg".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults_once() {
        let mut repo = MockSmartLinkRepository::new();
        repo.expect_slug_exists().returning(|_, _| Ok(false));
        repo.expect_short_id_exists().returning(|_| Ok(false));
        repo.expect_insert()
            .withf(|new| {
                new.slug == "nightfall"
                    && new.owner_id == 3
                    && new.is_public
                    && new.seo.title.as_deref() == Some("Nightfall - Aria")
                    && new.analytics.ga4.enabled
            })
            .times(1)
            .returning(|new| Ok(inserted(new)));

        let record = service(repo).create(&owner(3), input("Nightfall")).await.unwrap();
        assert_eq!(record.slug, "nightfall");
        assert_eq!(record.status, SmartLinkStatus::Draft);
    }

    #[tokio::test]
    async fn test_create_prefers_proposed_slug() {
        let mut repo = MockSmartLinkRepository::new();
        repo.expect_slug_exists().returning(|_, _| Ok(false));
        repo.expect_short_id_exists().returning(|_| Ok(false));
        repo.expect_insert()
            .withf(|new| new.slug == "my-custom-slug")
            .returning(|new| Ok(inserted(new)));

        let mut req = input("Nightfall");
        req.slug = Some("My Custom Slug".to_string());
        let record = service(repo).create(&owner(1), req).await.unwrap();
        assert_eq!(record.slug, "my-custom-slug");
    }

    #[tokio::test]
    async fn test_create_retries_after_insert_race() {
        let mut repo = MockSmartLinkRepository::new();
        repo.expect_slug_exists().returning(|_, _| Ok(false));
        repo.expect_short_id_exists().returning(|_| Ok(false));

        let mut seq = mockall::Sequence::new();
        repo.expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::identifier_conflict(IdentifierField::ShortId)));
        repo.expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|new| Ok(inserted(new)));

        let record = service(repo).create(&owner(1), input("Race")).await.unwrap();
        assert_eq!(record.slug, "race");
    }

    #[tokio::test]
    async fn test_create_gives_up_after_cap() {
        let mut repo = MockSmartLinkRepository::new();
        repo.expect_slug_exists().returning(|_, _| Ok(false));
        repo.expect_short_id_exists().returning(|_| Ok(false));
        repo.expect_insert()
            .times(MAX_INSERT_ATTEMPTS as usize)
            .returning(|_| Err(AppError::identifier_conflict(IdentifierField::Slug)));

        let err = service(repo).create(&owner(1), input("Busy")).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_update_same_slug_skips_allocation() {
        let mut repo = MockSmartLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(smartlink(id, "foo"))));
        repo.expect_slug_exists().never();
        repo.expect_update_content()
            .withf(|r| r.slug == "foo" && r.title == "New")
            .returning(Ok);

        let patch = SmartLinkPatch {
            slug: Some("foo".to_string()),
            title: Some("New".to_string()),
            ..Default::default()
        };
        let updated = service(repo).update(&owner(1), 5, patch).await.unwrap();
        assert_eq!(updated.slug, "foo");
    }

    #[tokio::test]
    async fn test_update_new_slug_excludes_self() {
        let mut repo = MockSmartLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(smartlink(id, "foo"))));
        repo.expect_slug_exists()
            .withf(|slug, exclude| exclude == &Some(5) && (slug == "bar" || slug == "bar-1"))
            .returning(|slug, _| Ok(slug == "bar"));
        repo.expect_update_content().returning(Ok);

        let patch = SmartLinkPatch {
            slug: Some("Bar".to_string()),
            ..Default::default()
        };
        let updated = service(repo).update(&owner(1), 5, patch).await.unwrap();
        assert_eq!(updated.slug, "bar-1");
    }

    #[tokio::test]
    async fn test_mutations_reject_other_owner() {
        let mut repo = MockSmartLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(smartlink(id, "foo"))));
        repo.expect_update_content().never();
        repo.expect_delete().never();
        repo.expect_set_status().never();

        let svc = service(repo);
        let stranger = owner(99);

        let err = svc
            .update(&stranger, 1, SmartLinkPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
        assert!(matches!(
            svc.delete(&stranger, 1).await.unwrap_err(),
            AppError::Forbidden { .. }
        ));
        assert!(matches!(
            svc.publish(&stranger, 1).await.unwrap_err(),
            AppError::Forbidden { .. }
        ));
        assert!(matches!(
            svc.analytics(&stranger, 1).await.unwrap_err(),
            AppError::Forbidden { .. }
        ));
    }

    #[tokio::test]
    async fn test_publish_stamps_published_at() {
        let mut repo = MockSmartLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(smartlink(id, "foo"))));
        repo.expect_set_status()
            .withf(|id, status, published_at| {
                *id == 1 && *status == SmartLinkStatus::Published && published_at.is_some()
            })
            .returning(|id, status, published_at| {
                let mut r = smartlink(id, "foo");
                r.status = status;
                r.published_at = published_at;
                Ok(r)
            });

        let record = service(repo).publish(&owner(1), 1).await.unwrap();
        assert_eq!(record.status, SmartLinkStatus::Published);
    }

    #[tokio::test]
    async fn test_short_id_shape_checked_before_store() {
        let mut repo = MockSmartLinkRepository::new();
        repo.expect_find_by_short_id().never();

        let svc = service(repo);
        for bad in ["abcd1234", "ABC", "ABCD12345", "favicon.ico"] {
            let err = svc.find_public_by_short_id(bad).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound { .. }));
        }
    }

    #[tokio::test]
    async fn test_public_lookup_hides_drafts() {
        let mut repo = MockSmartLinkRepository::new();
        repo.expect_find_by_slug()
            .returning(|slug| Ok(Some(smartlink(1, slug))));

        let err = service(repo).find_public_by_slug("foo").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_record_click_missing_record() {
        let mut repo = MockSmartLinkRepository::new();
        repo.expect_record_click().returning(|_, _| Ok(None));

        let err = service(repo)
            .record_click(404, Platform::Spotify)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_build_analytics_shares() {
        let mut record = smartlink(1, "foo");
        record.total_views = 10;
        record.total_clicks = 4;
        record.platform_click_stats.insert("spotify".to_string(), 3);
        record.platform_click_stats.insert("deezer".to_string(), 1);

        let analytics = build_analytics(&record);
        assert_eq!(analytics.conversion_rate, 40.0);
        assert_eq!(analytics.platforms[0].platform, "spotify");
        assert_eq!(analytics.platforms[0].percentage, 75.0);
        assert_eq!(analytics.platforms[1].percentage, 25.0);
    }

    #[test]
    fn test_build_analytics_without_views() {
        let record = smartlink(1, "foo");
        let analytics = build_analytics(&record);
        assert_eq!(analytics.conversion_rate, 0.0);
        assert!(analytics.platforms.is_empty());
    }
}
