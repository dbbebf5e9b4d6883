
use axum::http::StatusCode;
use fixtures::{at, body_json, create_scheduler, get, post};
use saunabook_scheduler::routes::routes;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_manual_runs_and_status() {
    let scheduler = create_scheduler(at(2025, 8, 1, 0, 0), 3).await;
    let app = routes(scheduler);

    let response = app
        .clone()
        .oneshot(post("/scheduler/generator/run"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "created": 3, "skipped": 0 }));

    let response = app
        .clone()
        .oneshot(post("/scheduler/evaluator/run"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "evaluated": 3, "cancelled": 3, "converted": 0 })
    );

    let response = app.oneshot(get("/scheduler/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["generator"]["is_running"], false);
    assert_eq!(status["generator"]["run_count"], 1);
    assert_eq!(status["generator"]["last_result"]["created"], 3);
    assert_eq!(status["generator"]["error"], json!(null));
    assert_eq!(status["evaluator"]["last_result"]["cancelled"], 3);
}

#[tokio::test]
async fn test_status_before_any_run() {
    let scheduler = create_scheduler(at(2025, 1, 15, 12, 0), 1).await;

    let response = routes(scheduler)
        .oneshot(get("/scheduler/status"))
        .await
        .unwrap();

    let status = body_json(response).await;
    assert_eq!(status["generator"]["run_count"], 0);
    assert_eq!(status["generator"]["last_run"], json!(null));
    assert_eq!(status["evaluator"]["last_result"], json!(null));
}
