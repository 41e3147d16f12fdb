mod common;

use axum::http::{Method, StatusCode};

use common::app::spawn_test_app;
use common::http::{request, response_json};

#[tokio::test]
async fn it_health_live_and_ready() {
    let app = spawn_test_app().await;

    let live = request(&app.app, Method::GET, "/health/live", None, &[]).await;
    let (live_status, _, _) = response_json(live).await;
    assert_eq!(live_status, StatusCode::OK);

    // The readiness probe loads the model and persists the fallback artifact.
    assert!(!app.state.engine().model().is_loaded());
    let ready = request(&app.app, Method::GET, "/health/ready", None, &[]).await;
    let (ready_status, _, _) = response_json(ready).await;
    assert_eq!(ready_status, StatusCode::OK);
    assert!(app.state.engine().model().is_loaded());
    assert!(std::path::Path::new(&app.config.model_path).exists());
}

#[tokio::test]
async fn it_health_database_reports_bank() {
    let app = spawn_test_app().await;

    let db = request(&app.app, Method::GET, "/health/database", None, &[]).await;
    let (status, _, body) = response_json(db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthy"], true);
    assert_eq!(body["questionCount"], 8);
}

#[tokio::test]
async fn it_health_summary_counts_sessions() {
    let app = spawn_test_app().await;
    app.state.engine().create_session("demo").await;

    let resp = request(&app.app, Method::GET, "/health", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["activeSessions"], 1);
}

#[tokio::test]
async fn it_unknown_route_is_json_404() {
    let app = spawn_test_app().await;
    let resp = request(&app.app, Method::GET, "/nope", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}
