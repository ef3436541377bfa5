//! schema.org JSON-LD for a SmartLink.

use crate::domain::entities::SmartLink;
use serde_json::{Value, json};

/// `MusicRecording` describing the track.
///
/// The listen targets cover every platform on the record, not only the ones
/// shown to the current visitor, so crawlers index all availability. An
/// explicit `seo.structuredData` object replaces the generated one.
pub fn structured_data(record: &SmartLink, public_url: &str) -> Value {
    if let Some(custom) = record.seo.structured_data.as_ref().filter(|v| v.is_object()) {
        return custom.clone();
    }

    let targets: Vec<Value> = record
        .platforms
        .iter()
        .map(|p| {
            json!({
                "@type": "EntryPoint",
                "urlTemplate": p.url,
                "name": p.platform.as_str(),
            })
        })
        .collect();

    let mut data = json!({
        "@context": "https://schema.org",
        "@type": "MusicRecording",
        "name": record.title,
        "byArtist": {
            "@type": "MusicGroup",
            "name": record.artist,
        },
        "url": public_url,
        "potentialAction": {
            "@type": "ListenAction",
            "target": targets,
        },
    });

    // Optional properties are omitted rather than serialized as null.
    if let Some(obj) = data.as_object_mut() {
        if !record.artwork.trim().is_empty() {
            obj.insert("image".into(), json!(record.artwork));
        }
        if let Some(date) = record.release_date {
            obj.insert("datePublished".into(), json!(date.format("%Y-%m-%d").to_string()));
        }
        if let Some(genre) = &record.genre {
            obj.insert("genre".into(), json!(genre));
        }
        if let Some(isrc) = &record.isrc {
            obj.insert("isrc".into(), json!(isrc));
        }
    }

    data
}
