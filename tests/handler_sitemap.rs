mod common;

use axum::http::{HeaderName, HeaderValue, header};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use smartlink::domain::entities::SmartLinkStatus;
use smartlink::infrastructure::persistence::MemorySmartLinkRepository;
use smartlink::routes::base_router;
use std::sync::Arc;

#[tokio::test]
async fn test_sitemap_lists_visible_records() {
    let app = common::test_app();

    let mut older = common::published("older", "OLDR0001");
    older.updated_at = Utc::now() - Duration::days(3);
    app.repo.seed(older).await;

    app.repo.seed(common::published("newer", "NEWR0001")).await;

    let mut draft = common::published("draft", "DRFT0001");
    draft.status = SmartLinkStatus::Draft;
    app.repo.seed(draft).await;

    let response = app.server.get("/sitemap-smartlinks.xml").await;

    response.assert_status_ok();
    assert!(
        response
            .header(header::CONTENT_TYPE)
            .to_str()
            .unwrap()
            .starts_with("application/xml")
    );
    assert_eq!(
        response.header(header::CACHE_CONTROL),
        "public, max-age=86400"
    );

    let xml = response.text();
    assert_eq!(xml.matches("<url>").count(), 2);
    assert!(xml.contains("<loc>https://links.test/s/newer</loc>"));
    assert!(!xml.contains("/s/draft"));
    assert!(xml.find("/s/newer").unwrap() < xml.find("/s/older").unwrap());
}

#[tokio::test]
async fn test_empty_sitemap() {
    let app = common::test_app();

    let response = app.server.get("/sitemap-smartlinks.xml").await;

    response.assert_status_ok();
    assert!(!response.text().contains("<url>"));
}

async fn sitemap_with_forged_host(behind_proxy: bool) -> String {
    let repo = Arc::new(MemorySmartLinkRepository::new());
    repo.seed(common::published("nightfall", "NGHT0001")).await;

    let (mut state, _views) = common::create_test_state(repo);
    state.public_base_url = None;
    state.behind_proxy = behind_proxy;
    let server = TestServer::new(base_router(state)).unwrap();

    server
        .get("/sitemap-smartlinks.xml")
        .add_header(header::HOST, HeaderValue::from_static("links.example.com"))
        .add_header(
            HeaderName::from_static("x-forwarded-host"),
            HeaderValue::from_static("evil.test"),
        )
        .add_header(
            HeaderName::from_static("x-forwarded-proto"),
            HeaderValue::from_static("https"),
        )
        .await
        .text()
}

#[tokio::test]
async fn test_forwarded_host_ignored_without_proxy() {
    let xml = sitemap_with_forged_host(false).await;
    assert!(xml.contains("/s/nightfall</loc>"));
    assert!(!xml.contains("evil.test"));
    assert!(!xml.contains("<loc>https://"));
}

#[tokio::test]
async fn test_forwarded_host_used_behind_proxy() {
    let xml = sitemap_with_forged_host(true).await;
    assert!(xml.contains("<loc>https://evil.test/s/nightfall</loc>"));
}
