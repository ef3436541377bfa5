//! Slug and shortId allocation.
//!
//! The pure halves live in [`crate::utils::slug`] and [`crate::utils::short_id`];
//! this service composes them with the store's uniqueness checks. The checks
//! only avoid wasted inserts: the unique indexes remain the real guard, and
//! [`SmartLinkService`](super::SmartLinkService) re-allocates when an insert
//! still loses a race.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::domain::repositories::SmartLinkRepository;
use crate::error::{AppError, IdentifierField};
use crate::utils::short_id::generate_short_id;
use crate::utils::slug::{normalize_slug, slug_candidate};
use crate::utils::timeout::bounded;

pub const MAX_SLUG_ATTEMPTS: u32 = 1000;
pub const MAX_SHORT_ID_ATTEMPTS: u32 = 100;

pub struct IdentifierAllocator<R: SmartLinkRepository + ?Sized> {
    repository: Arc<R>,
    store_timeout: Duration,
}

impl<R: SmartLinkRepository + ?Sized> IdentifierAllocator<R> {
    pub fn new(repository: Arc<R>, store_timeout: Duration) -> Self {
        Self {
            repository,
            store_timeout,
        }
    }

    /// Finds the first free slug derived from `source` (a title or a proposed slug).
    ///
    /// Tries the normalized base, then `base-1`, `base-2`... `exclude_id`
    /// ignores the record being edited.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] after [`MAX_SLUG_ATTEMPTS`] taken candidates.
    pub async fn allocate_slug(
        &self,
        source: &str,
        exclude_id: Option<i64>,
    ) -> Result<String, AppError> {
        let base = normalize_slug(source);

        for attempt in 0..MAX_SLUG_ATTEMPTS {
            let candidate = slug_candidate(&base, attempt);
            let taken = bounded(
                self.store_timeout,
                "slug_exists",
                self.repository.slug_exists(&candidate, exclude_id),
            )
            .await?;

            if !taken {
                return Ok(candidate);
            }

            count_collision(IdentifierField::Slug);
        }

        tracing::error!(base = %base, "Slug allocation exhausted");
        Err(exhausted(IdentifierField::Slug, MAX_SLUG_ATTEMPTS))
    }

    /// Draws shortIds until one is free. Each retry is a full redraw.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] after [`MAX_SHORT_ID_ATTEMPTS`] collisions.
    pub async fn allocate_short_id(&self) -> Result<String, AppError> {
        for _ in 0..MAX_SHORT_ID_ATTEMPTS {
            let candidate = generate_short_id();
            let taken = bounded(
                self.store_timeout,
                "short_id_exists",
                self.repository.short_id_exists(&candidate),
            )
            .await?;

            if !taken {
                return Ok(candidate);
            }

            count_collision(IdentifierField::ShortId);
        }

        tracing::error!("ShortId allocation exhausted");
        Err(exhausted(IdentifierField::ShortId, MAX_SHORT_ID_ATTEMPTS))
    }
}

fn count_collision(field: IdentifierField) {
    metrics::counter!("smartlink_identifier_collisions_total", "field" => field.as_str())
        .increment(1);
}

fn exhausted(field: IdentifierField, attempts: u32) -> AppError {
    AppError::unavailable(
        "Could not allocate a unique identifier, try again",
        json!({ "field": field.as_str(), "attempts": attempts }),
    )
}
