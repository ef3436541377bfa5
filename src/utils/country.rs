//! Visitor country resolution from the edge geolocation header.

use axum::http::HeaderMap;

pub const COUNTRY_HEADER: &str = "cf-ipcountry";

/// Two-letter upper-cased country from `CF-IPCountry`, or `default`.
pub fn resolve_country(headers: &HeaderMap, default: &str) -> String {
    headers
        .get(COUNTRY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|c| c.len() == 2 && c.bytes().all(|b| b.is_ascii_alphabetic()))
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| default.to_string())
}
