use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_health_live() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_root_degraded_without_database() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_404_not_found() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent/path")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lesson_create_unauthorized_without_acting_user() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/lesson")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_lesson_create_rejects_malformed_payload() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/lesson")
                .header("content-type", "application/json")
                .header("x-facility-user", "teacher-1")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lesson_create_unavailable_without_database() {
    let app = common::create_test_app().await;

    let body = serde_json::json!({
        "title": "Fractions",
        "collection": "classroom-1",
        "resources": [],
        "is_active": false,
        "lesson_assignments": []
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/lesson")
                .header("content-type", "application/json")
                .header("x-facility-user", "teacher-1")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_lesson_list_unavailable_without_database() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/lesson")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_classchannel_create_unauthorized_without_acting_user() {
    let app = common::create_test_app().await;

    let body = serde_json::json!({
        "collection": "classroom-1",
        "channel_id": "channel-1",
        "assigned_by": "teacher-1"
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/classchannel")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_offline_report_rejects_incomplete_payload() {
    let app = common::create_test_app().await;

    // student_id and collection_id are required fields
    let body = serde_json::json!({
        "class_id": "class-1",
        "time_spent": 10.0
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/reportsdataoffline")
                .header("content-type", "application/json")
                .header("x-facility-user", "teacher-1")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_examlog_update_unauthorized_without_acting_user() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/examlog/log-1")
                .header("content-type", "application/json")
                .body(Body::from("{\"closed\": true}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
