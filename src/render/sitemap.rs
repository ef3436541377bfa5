//! XML sitemap of public SmartLinks.

use askama::Template;
use chrono::SecondsFormat;
use serde_json::json;

use crate::domain::repositories::SitemapEntry;
use crate::error::AppError;

struct SitemapUrl {
    loc: String,
    lastmod: String,
}

#[derive(Template)]
#[template(path = "sitemap.xml")]
struct Sitemap {
    entries: Vec<SitemapUrl>,
}

/// One `<url>` per entry, in the order given.
pub fn render_sitemap(entries: &[SitemapEntry], base_url: &str) -> Result<String, AppError> {
    let base = base_url.trim_end_matches('/');
    let sitemap = Sitemap {
        entries: entries
            .iter()
            .map(|e| SitemapUrl {
                loc: format!("{}/s/{}", base, e.slug),
                lastmod: e.updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            })
            .collect(),
    };

    sitemap.render().map_err(|e| {
        tracing::error!(error = %e, "Failed to render sitemap");
        AppError::internal("Failed to render sitemap", json!({}))
    })
}
