//! External base URL of the serving host.

use axum::http::{HeaderMap, header};

/// Base URL used for canonical links, sitemap entries and the tracking endpoint.
///
/// A configured `PUBLIC_BASE_URL` wins. Otherwise the host comes from `Host`
/// over plain `http`. `X-Forwarded-Proto` and `X-Forwarded-Host` are only
/// honoured with `trust_forwarded`, since any client can send them. The
/// result never ends with `/`.
pub fn request_base_url(
    headers: &HeaderMap,
    configured: Option<&str>,
    trust_forwarded: bool,
) -> String {
    if let Some(base) = configured {
        return base.trim_end_matches('/').to_string();
    }

    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let forwarded = |name: &str| header_str(name).filter(|_| trust_forwarded);

    let scheme = match forwarded("x-forwarded-proto") {
        Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    };

    let host = forwarded("x-forwarded-host")
        .or_else(|| header_str(header::HOST.as_str()))
        .unwrap_or("localhost");

    format!("{}://{}", scheme, host)
}
