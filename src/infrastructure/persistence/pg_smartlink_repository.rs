//! PostgreSQL implementation of the SmartLink repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::entities::{
    AnalyticsConfig, ClickCounters, DesignConfig, NewSmartLink, Platform, PlatformLink, SeoConfig,
    SmartLink, SmartLinkStatus,
};
use crate::domain::repositories::{
    SitemapEntry, SmartLinkFilter, SmartLinkRepository, SmartLinkTotals,
};
use crate::error::AppError;

const COLUMNS: &str = "id, slug, short_id, owner_id, title, artist, subtitle, artwork, \
     release_date, genre, isrc, upc, platforms, analytics, seo, design, status, is_public, \
     total_views, total_clicks, conversion_rate, platform_click_stats, created_at, updated_at, \
     published_at, expires_at, last_viewed_at";

#[derive(sqlx::FromRow)]
struct SmartLinkRow {
    id: i64,
    slug: String,
    short_id: String,
    owner_id: i64,
    title: String,
    artist: String,
    subtitle: Option<String>,
    artwork: String,
    release_date: Option<NaiveDate>,
    genre: Option<String>,
    isrc: Option<String>,
    upc: Option<String>,
    platforms: Json<Vec<PlatformLink>>,
    analytics: Json<AnalyticsConfig>,
    seo: Json<SeoConfig>,
    design: Json<DesignConfig>,
    status: String,
    is_public: bool,
    total_views: i64,
    total_clicks: i64,
    conversion_rate: f64,
    platform_click_stats: Json<BTreeMap<String, i64>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    last_viewed_at: Option<DateTime<Utc>>,
}

impl TryFrom<SmartLinkRow> for SmartLink {
    type Error = AppError;

    fn try_from(row: SmartLinkRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<SmartLinkStatus>().map_err(|reason| {
            AppError::internal("Corrupt SmartLink row", json!({ "id": row.id, "reason": reason }))
        })?;

        Ok(SmartLink {
            id: row.id,
            slug: row.slug,
            short_id: row.short_id,
            title: row.title,
            artist: row.artist,
            subtitle: row.subtitle,
            artwork: row.artwork,
            release_date: row.release_date,
            genre: row.genre,
            isrc: row.isrc,
            upc: row.upc,
            platforms: row.platforms.0,
            analytics: row.analytics.0,
            seo: row.seo.0,
            design: row.design.0,
            owner_id: row.owner_id,
            status,
            is_public: row.is_public,
            total_views: row.total_views,
            total_clicks: row.total_clicks,
            conversion_rate: row.conversion_rate,
            platform_click_stats: row.platform_click_stats.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
            expires_at: row.expires_at,
            last_viewed_at: row.last_viewed_at,
        })
    }
}

fn into_entity(row: Option<SmartLinkRow>) -> Result<Option<SmartLink>, AppError> {
    row.map(SmartLink::try_from).transpose()
}

/// Escapes `%`, `_` and `\` for use inside an `ILIKE` pattern.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &SmartLinkFilter) {
    qb.push(" WHERE owner_id = ").push_bind(filter.owner_id);

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(artist) = filter.artist.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND artist ILIKE ").push_bind(like_pattern(artist));
    }
    if let Some(title) = filter.title.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND title ILIKE ").push_bind(like_pattern(title));
    }
}

/// PostgreSQL repository for SmartLinks.
///
/// Configuration blocks and click stats are JSONB columns. Counter updates are
/// single `UPDATE` statements so concurrent views and clicks never lose an increment.
pub struct PgSmartLinkRepository {
    pool: Arc<PgPool>,
}

impl PgSmartLinkRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SmartLinkRepository for PgSmartLinkRepository {
    async fn insert(&self, new: NewSmartLink) -> Result<SmartLink, AppError> {
        let sql = format!(
            r#"
            INSERT INTO smartlinks (
                slug, short_id, owner_id, title, artist, subtitle, artwork, release_date,
                genre, isrc, upc, platforms, analytics, seo, design, is_public, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, SmartLinkRow>(&sql)
            .bind(&new.slug)
            .bind(&new.short_id)
            .bind(new.owner_id)
            .bind(&new.title)
            .bind(&new.artist)
            .bind(&new.subtitle)
            .bind(&new.artwork)
            .bind(new.release_date)
            .bind(&new.genre)
            .bind(&new.isrc)
            .bind(&new.upc)
            .bind(Json(&new.platforms))
            .bind(Json(&new.analytics))
            .bind(Json(&new.seo))
            .bind(Json(&new.design))
            .bind(new.is_public)
            .bind(new.expires_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        SmartLink::try_from(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SmartLink>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM smartlinks WHERE id = $1");
        let row = sqlx::query_as::<_, SmartLinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        into_entity(row)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<SmartLink>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM smartlinks WHERE slug = $1");
        let row = sqlx::query_as::<_, SmartLinkRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool.as_ref())
            .await?;
        into_entity(row)
    }

    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<SmartLink>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM smartlinks WHERE short_id = $1");
        let row = sqlx::query_as::<_, SmartLinkRow>(&sql)
            .bind(short_id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        into_entity(row)
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM smartlinks
                WHERE slug = $1
                  AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn short_id_exists(&self, short_id: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM smartlinks WHERE short_id = $1)")
                .bind(short_id)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn list(
        &self,
        filter: SmartLinkFilter,
        page: i64,
        limit: i64,
    ) -> Result<Vec<SmartLink>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM smartlinks"));
        push_filter(&mut qb, &filter);

        let order = filter.sort_order;
        qb.push(format!(
            " ORDER BY {} {} NULLS LAST, id {}",
            filter.sort_by.column(),
            order,
            order
        ));
        qb.push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind((page.max(1) - 1).saturating_mul(limit));

        let rows = qb
            .build_query_as::<SmartLinkRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.into_iter().map(SmartLink::try_from).collect()
    }

    async fn count(&self, filter: SmartLinkFilter) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM smartlinks");
        push_filter(&mut qb, &filter);

        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(total)
    }

    async fn update_content(&self, record: SmartLink) -> Result<SmartLink, AppError> {
        let sql = format!(
            r#"
            UPDATE smartlinks
            SET slug = $2, title = $3, artist = $4, subtitle = $5, artwork = $6,
                release_date = $7, genre = $8, isrc = $9, upc = $10, platforms = $11,
                analytics = $12, seo = $13, design = $14, is_public = $15, expires_at = $16,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, SmartLinkRow>(&sql)
            .bind(record.id)
            .bind(&record.slug)
            .bind(&record.title)
            .bind(&record.artist)
            .bind(&record.subtitle)
            .bind(&record.artwork)
            .bind(record.release_date)
            .bind(&record.genre)
            .bind(&record.isrc)
            .bind(&record.upc)
            .bind(Json(&record.platforms))
            .bind(Json(&record.analytics))
            .bind(Json(&record.seo))
            .bind(Json(&record.design))
            .bind(record.is_public)
            .bind(record.expires_at)
            .fetch_optional(self.pool.as_ref())
            .await?;

        into_entity(row)?
            .ok_or_else(|| AppError::not_found("SmartLink not found", json!({ "id": record.id })))
    }

    async fn set_status(
        &self,
        id: i64,
        status: SmartLinkStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<SmartLink, AppError> {
        let sql = format!(
            r#"
            UPDATE smartlinks
            SET status = $2, published_at = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, SmartLinkRow>(&sql)
            .bind(id)
            .bind(status.as_str())
            .bind(published_at)
            .fetch_optional(self.pool.as_ref())
            .await?;

        into_entity(row)?
            .ok_or_else(|| AppError::not_found("SmartLink not found", json!({ "id": id })))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM smartlinks WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_view(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE smartlinks
            SET total_views = total_views + 1,
                last_viewed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn record_click(
        &self,
        id: i64,
        platform: Platform,
    ) -> Result<Option<ClickCounters>, AppError> {
        // The rate is recomputed in the same statement as the increment, so it
        // always matches the stored counters.
        let row: Option<(i64, i64, f64)> = sqlx::query_as(
            r#"
            UPDATE smartlinks
            SET total_clicks = total_clicks + 1,
                platform_click_stats = jsonb_set(
                    platform_click_stats,
                    ARRAY[$2::TEXT],
                    to_jsonb(COALESCE((platform_click_stats ->> $2::TEXT)::BIGINT, 0) + 1)
                ),
                conversion_rate = CASE
                    WHEN total_views > 0
                        THEN (total_clicks + 1)::DOUBLE PRECISION / total_views * 100
                    ELSE conversion_rate
                END
            WHERE id = $1
            RETURNING total_clicks,
                      (platform_click_stats ->> $2::TEXT)::BIGINT,
                      conversion_rate
            "#,
        )
        .bind(id)
        .bind(platform.as_str())
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(
            |(total_clicks, platform_clicks, conversion_rate)| ClickCounters {
                total_clicks,
                platform_clicks,
                conversion_rate,
            },
        ))
    }

    async fn list_sitemap(&self) -> Result<Vec<SitemapEntry>, AppError> {
        let rows: Vec<(String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT slug, updated_at
            FROM smartlinks
            WHERE status = 'published'
              AND is_public
              AND (expires_at IS NULL OR expires_at > NOW())
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(slug, updated_at)| SitemapEntry { slug, updated_at })
            .collect())
    }

    async fn totals(&self) -> Result<SmartLinkTotals, AppError> {
        let by_status: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM smartlinks GROUP BY status ORDER BY status")
                .fetch_all(self.pool.as_ref())
                .await?;

        let (total_views, total_clicks): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_views), 0)::BIGINT,
                   COALESCE(SUM(total_clicks), 0)::BIGINT
            FROM smartlinks
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        let by_status = by_status
            .into_iter()
            .filter_map(|(status, count)| status.parse().ok().map(|s| (s, count)))
            .collect();

        Ok(SmartLinkTotals {
            by_status,
            total_views,
            total_clicks,
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
