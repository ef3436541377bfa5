mod common;

#[tokio::test]
async fn test_health_endpoint_success() {
    let app = common::test_app();

    let response = app.server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["database"]["status"], "ok");
    assert_eq!(json["checks"]["view_queue"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
}

#[tokio::test]
async fn test_health_degraded_when_view_queue_closed() {
    let common::TestApp { server, views, .. } = common::test_app();
    drop(views);

    let response = server.get("/health").await;

    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["view_queue"]["status"], "error");
}

#[tokio::test]
async fn test_health_reports_backends() {
    let app = common::test_app();

    let json = app.server.get("/health").await.json::<serde_json::Value>();
    assert_eq!(json["auth"], "development");
    assert_eq!(json["checks"]["cache"]["detail"], "none");
    assert!(json["checks"]["database"]["latency_ms"].is_u64());
    assert!(
        json["checks"]["view_queue"]["detail"]
            .as_str()
            .unwrap()
            .starts_with("0 of ")
    );
}
