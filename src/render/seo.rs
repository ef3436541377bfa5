//! Title, description, Open Graph and Twitter Card values for a page.

use crate::domain::entities::{
    DEFAULT_OG_TYPE, DEFAULT_TWITTER_CARD, SmartLink, SmartLinkDefaults,
};

/// Values for the `<title>` and meta tags. HTML escaping happens in the template.
#[derive(Debug, Clone, PartialEq)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub og_type: String,
    pub twitter_card: String,
    /// Absent when the record has neither an `ogImage` nor artwork.
    pub image: Option<String>,
    pub canonical_url: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl SeoMeta {
    pub fn for_record(record: &SmartLink, public_url: &str) -> Self {
        let seo = &record.seo;

        let title = non_blank(seo.title.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} - {}", record.title, record.artist));
        let description = non_blank(seo.description.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| SmartLinkDefaults::seo_description(&record.title, &record.artist));

        let keywords = if seo.keywords.is_empty() {
            let mut words = vec![
                record.artist.clone(),
                record.title.clone(),
                "streaming".to_string(),
                "music".to_string(),
            ];
            if let Some(genre) = non_blank(record.genre.as_deref()) {
                words.push(genre.to_string());
            }
            words.join(", ")
        } else {
            seo.keywords.join(", ")
        };

        let image = non_blank(seo.og_image.as_deref())
            .or_else(|| non_blank(Some(record.artwork.as_str())))
            .map(str::to_string);

        Self {
            title,
            description,
            keywords,
            og_type: non_blank(seo.og_type.as_deref())
                .unwrap_or(DEFAULT_OG_TYPE)
                .to_string(),
            twitter_card: non_blank(seo.twitter_card.as_deref())
                .unwrap_or(DEFAULT_TWITTER_CARD)
                .to_string(),
            image,
            canonical_url: public_url.to_string(),
        }
    }
}
