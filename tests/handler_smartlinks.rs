mod common;

use async_trait::async_trait;
use axum::http::{StatusCode, header};
use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Arc;

use smartlink::application::services::IdentityProvider;
use smartlink::domain::entities::User;
use smartlink::error::AppError;
use smartlink::infrastructure::persistence::MemorySmartLinkRepository;
use smartlink::routes::base_router;

fn nightfall() -> Value {
    json!({
        "title": "Nightfall",
        "artist": "Aria",
        "artwork": "https://img.example.com/nightfall.jpg",
        "platforms": [
            { "platform": "spotify", "url": "https://open.spotify.com/track/1" },
            { "platform": "deezer", "url": "https://www.deezer.com/track/1", "country": "FR", "priority": 1 }
        ]
    })
}

async fn create(app: &common::TestApp, body: Value) -> Value {
    let response = app.server.post("/api/smartlinks").json(&body).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn test_create_publish_and_visit() {
    let app = common::test_app();

    let created = create(&app, nightfall()).await;
    assert_eq!(created["slug"], "nightfall");
    assert_eq!(created["status"], "draft");
    assert_eq!(created["publicUrl"], "https://links.test/s/nightfall");
    let short_id = created["shortId"].as_str().unwrap();
    assert_eq!(short_id.len(), 8);
    assert!(short_id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    let id = created["id"].as_i64().unwrap();

    app.server
        .get("/s/nightfall")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let published = app
        .server
        .put(&format!("/api/smartlinks/{}/publish", id))
        .await;
    published.assert_status_ok();
    let published = published.json::<Value>();
    assert_eq!(published["status"], "published");
    assert!(published["publishedAt"].is_string());

    app.server.get("/s/nightfall").await.assert_status_ok();
    app.server
        .get(&format!("/{}", short_id))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_creation_defaults() {
    let app = common::test_app();

    let created = create(&app, json!({ "title": "Nightfall", "artist": "Aria" })).await;

    assert_eq!(created["isPublic"], true);
    assert_eq!(created["artwork"], "");
    assert_eq!(created["analytics"]["ga4"]["enabled"], true);
    assert_eq!(created["analytics"]["tiktokPixel"]["enabled"], false);
    assert_eq!(created["seo"]["title"], "Nightfall - Aria");
    assert_eq!(created["seo"]["ogType"], "music.song");
    assert_eq!(created["design"]["colorScheme"]["primary"], "#1DB954");
    assert_eq!(created["totalViews"], 0);
}

#[tokio::test]
async fn test_duplicate_titles_get_suffixes() {
    let app = common::test_app();

    let slugs: Vec<String> = {
        let mut slugs = Vec::new();
        for _ in 0..3 {
            let created = create(&app, nightfall()).await;
            slugs.push(created["slug"].as_str().unwrap().to_string());
        }
        slugs
    };

    assert_eq!(slugs, vec!["nightfall", "nightfall-1", "nightfall-2"]);
}

#[tokio::test]
async fn test_explicit_slug_is_normalized() {
    let app = common::test_app();

    let mut body = nightfall();
    body["slug"] = json!("Été Mix 2024!");
    let created = create(&app, body).await;

    assert_eq!(created["slug"], "ete-mix-2024");
}

#[tokio::test]
async fn test_invalid_fields_are_rejected() {
    let app = common::test_app();

    let mut bad_isrc = nightfall();
    bad_isrc["isrc"] = json!("not-an-isrc");
    let response = app.server.post("/api/smartlinks").json(&bad_isrc).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");

    let mut bad_upc = nightfall();
    bad_upc["upc"] = json!("12345");
    app.server
        .post("/api/smartlinks")
        .json(&bad_upc)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/api/smartlinks")
        .json(&json!({ "artist": "Aria" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/api/smartlinks")
        .json(&json!({ "title": "", "artist": "Aria" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_pagination_and_filters() {
    let app = common::test_app();
    for (title, artist) in [("Nightfall", "Aria"), ("Daybreak", "Aria"), ("Tides", "Noor")] {
        create(&app, json!({ "title": title, "artist": artist })).await;
    }

    let page = app
        .server
        .get("/api/smartlinks?page=1&limit=2")
        .await
        .json::<Value>();
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["pagination"]["total"], 3);
    assert_eq!(page["pagination"]["pages"], 2);

    let by_artist = app
        .server
        .get("/api/smartlinks?artist=ari&sortBy=title&sortOrder=asc")
        .await
        .json::<Value>();
    let titles: Vec<&str> = by_artist["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Daybreak", "Nightfall"]);

    let published = app
        .server
        .get("/api/smartlinks?status=published")
        .await
        .json::<Value>();
    assert_eq!(published["pagination"]["total"], 0);

    app.server
        .get("/api/smartlinks?limit=0")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    app.server
        .get("/api/smartlinks?limit=101")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .get("/api/smartlinks?page=9223372036854775807&limit=10")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let far = app
        .server
        .get("/api/smartlinks?page=1000000&limit=100")
        .await
        .json::<Value>();
    assert_eq!(far["data"].as_array().unwrap().len(), 0);
    assert_eq!(far["pagination"]["total"], 3);
}

#[tokio::test]
async fn test_list_is_scoped_to_owner() {
    let app = common::test_app();
    let mut foreign = common::published("foreign", "FRGN0001");
    foreign.owner_id = 2;
    app.repo.seed(foreign).await;
    create(&app, nightfall()).await;

    let page = app.server.get("/api/smartlinks").await.json::<Value>();
    assert_eq!(page["pagination"]["total"], 1);
    assert_eq!(page["data"][0]["slug"], "nightfall");
}

#[tokio::test]
async fn test_update_partial_fields() {
    let app = common::test_app();
    let mut body = nightfall();
    body["subtitle"] = json!("Deluxe");
    body["genre"] = json!("Synthwave");
    let created = create(&app, body).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .server
        .put(&format!("/api/smartlinks/{}", id))
        .json(&json!({ "title": "Nightfall (Remastered)", "subtitle": null }))
        .await;

    response.assert_status_ok();
    let updated = response.json::<Value>();
    assert_eq!(updated["title"], "Nightfall (Remastered)");
    assert!(updated["subtitle"].is_null());
    assert_eq!(updated["genre"], "Synthwave");
    assert_eq!(updated["slug"], "nightfall");
    assert_eq!(updated["shortId"], created["shortId"]);
}

#[tokio::test]
async fn test_update_slug_is_made_unique() {
    let app = common::test_app();
    create(&app, nightfall()).await;
    let other = create(&app, json!({ "title": "Daybreak", "artist": "Aria" })).await;
    let id = other["id"].as_i64().unwrap();

    let updated = app
        .server
        .put(&format!("/api/smartlinks/{}", id))
        .json(&json!({ "slug": "nightfall" }))
        .await
        .json::<Value>();
    assert_eq!(updated["slug"], "nightfall-1");

    let unchanged = app
        .server
        .put(&format!("/api/smartlinks/{}", id))
        .json(&json!({ "slug": "nightfall-1" }))
        .await
        .json::<Value>();
    assert_eq!(unchanged["slug"], "nightfall-1");
}

#[tokio::test]
async fn test_delete() {
    let app = common::test_app();
    let created = create(&app, nightfall()).await;
    let path = format!("/api/smartlinks/{}", created["id"]);

    app.server
        .delete(&path)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .get(&path)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unpublish_keeps_published_at() {
    let app = common::test_app();
    let record = app.repo.seed(common::published("nightfall", "NGHT2024")).await;

    let response = app
        .server
        .put(&format!("/api/smartlinks/{}/unpublish", record.id))
        .await;
    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["status"], "draft");
    assert!(json["publishedAt"].is_string());

    app.server
        .get("/s/nightfall")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_records_are_forbidden() {
    let app = common::test_app();
    let mut foreign = common::published("foreign", "FRGN0001");
    foreign.owner_id = 2;
    let record = app.repo.seed(foreign).await;
    let base = format!("/api/smartlinks/{}", record.id);

    app.server
        .get(&base)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .put(&base)
        .json(&json!({ "title": "Hijacked" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .put(&format!("{}/unpublish", base))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .get(&format!("{}/analytics", base))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .delete(&base)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // still published and untouched
    app.server.get("/s/foreign").await.assert_status_ok();
}

#[tokio::test]
async fn test_unknown_id_is_404() {
    let app = common::test_app();

    let response = app.server.get("/api/smartlinks/4242").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_analytics_breakdown() {
    let app = common::test_app();
    let mut record = common::published("nightfall", "NGHT2024");
    record.total_views = 8;
    let record = app.repo.seed(record).await;

    for platform in ["spotify", "spotify", "spotify", "deezer"] {
        app.server
            .post("/track/click")
            .json(&json!({ "smartlinkId": record.id, "platform": platform }))
            .await
            .assert_status_ok();
    }

    let analytics = app
        .server
        .get(&format!("/api/smartlinks/{}/analytics", record.id))
        .await
        .json::<Value>();

    assert_eq!(analytics["totalViews"], 8);
    assert_eq!(analytics["totalClicks"], 4);
    assert_eq!(analytics["conversionRate"], 50.0);
    assert_eq!(analytics["platforms"][0]["platform"], "spotify");
    assert_eq!(analytics["platforms"][0]["clicks"], 3);
    assert_eq!(analytics["platforms"][0]["percentage"], 75.0);
    assert_eq!(analytics["platforms"][1]["platform"], "deezer");
}

#[tokio::test]
async fn test_fetch_platform_links() {
    let app = common::test_app();

    let response = app
        .server
        .post("/api/smartlinks/fetch-platform-links")
        .json(&json!({ "sourceUrl": "https://open.spotify.com/track/1" }))
        .await;
    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["title"], "Nightfall");
    assert_eq!(json["platforms"].as_array().unwrap().len(), 2);

    app.server
        .post("/api/smartlinks/fetch-platform-links")
        .json(&json!({ "sourceUrl": "https://open.spotify.com/track/unknown" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .post("/api/smartlinks/fetch-platform-links")
        .json(&json!({ "sourceUrl": "https://open.spotify.com/track/throttled" }))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    app.server
        .post("/api/smartlinks/fetch-platform-links")
        .json(&json!({ "sourceUrl": "not a url" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

struct RejectAll;

#[async_trait]
impl IdentityProvider for RejectAll {
    async fn identify(&self, _bearer: Option<&str>) -> Result<User, AppError> {
        Err(AppError::unauthorized(
            "Unauthorized",
            json!({ "reason": "Invalid or revoked token" }),
        ))
    }

    fn name(&self) -> &'static str {
        "reject-all"
    }
}

#[tokio::test]
async fn test_rejected_identity_is_401() {
    let (mut state, _views) =
        common::create_test_state(Arc::new(MemorySmartLinkRepository::new()));
    state.identity = Arc::new(RejectAll);
    let server = TestServer::new(base_router(state)).unwrap();

    let response = server
        .get("/api/smartlinks")
        .authorization_bearer("wrong")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.header(header::WWW_AUTHENTICATE), "Bearer");

    // public routes do not consult the identity provider
    server.get("/health").await.assert_status_ok();
}
