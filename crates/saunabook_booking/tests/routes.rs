
use axum::http::StatusCode;
use fixtures::{at, body_json, create_test_app, get_request, json_request};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_next_available_endpoint() {
    let app = create_test_app(at(2025, 7, 4, 10, 5)).await;

    let response = app
        .router
        .oneshot(get_request(&format!("/saunas/{}/next-available", app.sauna)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["reason"], "heating");
    assert_eq!(body["start_time"], json!(at(2025, 7, 4, 12, 0)));
}

#[tokio::test]
async fn test_reservation_lifecycle_over_http() {
    let app = create_test_app(at(2025, 7, 4, 10, 0)).await;
    let payload = json!({
        "boat_id": app.boat,
        "sauna_id": app.sauna,
        "start_time": at(2025, 7, 4, 14, 0),
        "adults": 2
    });

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/reservations", payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["status"], "ACTIVE");
    assert_eq!(created["kids"], 0);

    // Same slot, other boat
    let conflict = json!({
        "boat_id": app.other_boat,
        "sauna_id": app.sauna,
        "start_time": at(2025, 7, 4, 14, 0),
        "adults": 1
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/reservations", conflict))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "SLOT_CONFLICT");

    // Same boat, other sauna on the island
    let second = json!({
        "boat_id": app.boat,
        "sauna_id": app.sibling_sauna,
        "start_time": at(2025, 7, 4, 16, 0),
        "adults": 1
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/reservations", second))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "DAILY_LIMIT_EXCEEDED"
    );

    let id = created["id"].as_str().unwrap().to_string();
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/reservations/{}/cancel", id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "CANCELLED");

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/reservations/{}/cancel", id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "ALREADY_CANCELLED");
    assert_eq!(body["error"]["reason"], "already_cancelled");

    let response = app
        .router
        .oneshot(get_request(&format!(
            "/saunas/{}/reservations?date=2025-07-04",
            app.sauna
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let overview = body_json(response).await;
    assert_eq!(overview["reservations"].as_array().unwrap().len(), 1);
    assert_eq!(overview["reservations"][0]["status"], "CANCELLED");
}

#[tokio::test]
async fn test_validation_errors_are_bad_requests() {
    let app = create_test_app(at(2025, 7, 4, 10, 0)).await;
    let payload = json!({
        "boat_id": app.boat,
        "sauna_id": app.sauna,
        "start_time": at(2025, 7, 4, 14, 30),
        "adults": 2
    });

    let response = app
        .router
        .oneshot(json_request("POST", "/reservations", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION");
}

#[tokio::test]
async fn test_shared_reservation_over_http() {
    let app = create_test_app(at(2025, 7, 4, 10, 0)).await;
    let payload = json!({
        "sauna_id": app.sauna,
        "date": "2025-07-04",
        "start_hour": 18,
        "males_duration_hours": 2,
        "females_duration_hours": 2,
        "gender_order": "FEMALES_FIRST",
        "name": "Club Sauna",
        "created_by": "admin"
    });

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/shared-reservations", payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["is_auto_generated"], false);
    assert_eq!(created["schedule"]["females_start"], json!(at(2025, 7, 4, 18, 0)));
    assert_eq!(created["schedule"]["males_end"], json!(at(2025, 7, 4, 22, 0)));
    let shared_id = created["id"].as_str().unwrap().to_string();

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/shared-reservations", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let join = json!({ "boat_id": app.boat, "adults": 2, "kids": 1 });
    let uri = format!("/shared-reservations/{}/join", shared_id);
    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", &uri, join.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", &uri, join))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "ALREADY_JOINED");

    let response = app
        .router
        .oneshot(get_request(&format!("/shared-reservations/{}", shared_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["participants"].as_array().unwrap().len(), 1);
    assert_eq!(detail["participants"][0]["kids"], 1);
}

#[tokio::test]
async fn test_unknown_sauna_is_not_found() {
    let app = create_test_app(at(2025, 7, 4, 10, 0)).await;

    let response = app
        .router
        .oneshot(get_request(&format!(
            "/saunas/{}/next-available",
            uuid::Uuid::new_v4()
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
}
