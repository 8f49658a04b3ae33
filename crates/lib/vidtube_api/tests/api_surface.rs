//! Router-surface tests — no live database. A lazily-connecting pool backs
//! the state, so only paths that fail (or answer) before touching the store
//! are exercised: session-guard rejections, id validation, and the response
//! envelope shape.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;
use vidtube_api::config::ApiConfig;
use vidtube_api::AppState;
use vidtube_core::auth::jwt::generate_access_token;
use vidtube_core::auth::TokenSecrets;
use vidtube_core::media::HttpBlobStore;
use vidtube_core::models::Identity;

const ACCESS_SECRET: &str = "test-access-secret";

fn test_app() -> axum::Router {
    let pool = sqlx::PgPool::connect_lazy("postgres://localhost:1/unreachable")
        .expect("lazy pool");
    let endpoint = Url::parse("http://localhost:9000/").unwrap();
    let state = AppState {
        pool,
        config: ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            pg_connection_url: "postgres://localhost:1/unreachable".into(),
            cors_origin: "*".into(),
            secure_cookies: false,
            blob_store_endpoint: endpoint.clone(),
        },
        secrets: TokenSecrets {
            access: ACCESS_SECRET.into(),
            refresh: "test-refresh-secret".into(),
        },
        blob_store: Arc::new(HttpBlobStore::new(endpoint)),
    };
    vidtube_api::router(state)
}

fn test_identity() -> Identity {
    let now = Utc::now();
    Identity {
        id: Uuid::new_v4(),
        username: "tester".into(),
        email: "tester@example.com".into(),
        full_name: "Test Er".into(),
        password_hash: "irrelevant".into(),
        avatar_url: "http://localhost:9000/blobs/avatar".into(),
        avatar_public_id: "avatar".into(),
        cover_image_url: None,
        cover_image_public_id: None,
        refresh_token_hash: None,
        created_at: now,
        updated_at: now,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

#[tokio::test]
async fn healthcheck_answers_without_database() {
    let app = test_app();
    let req = Request::builder()
        .uri("/api/v1/healthcheck")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["statusCode"], 200);
    assert_eq!(json["data"]["dbConnected"], false);
}

#[tokio::test]
async fn missing_token_is_rejected_with_error_envelope() {
    let app = test_app();
    let req = Request::builder()
        .uri("/api/v1/users/current-user")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["statusCode"], 401);
    assert!(json["message"].is_string());
    assert!(json["errors"].is_array());
}

#[tokio::test]
async fn malformed_bearer_token_is_rejected() {
    let app = test_app();
    let req = Request::builder()
        .uri("/api/v1/users/history")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_wrong_secret_is_rejected() {
    let app = test_app();
    let token =
        generate_access_token(&test_identity(), b"some-other-secret").expect("sign token");
    let req = Request::builder()
        .uri("/api/v1/users/current-user")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_reaches_handler_and_bad_id_fails_validation() {
    let app = test_app();
    let token =
        generate_access_token(&test_identity(), ACCESS_SECRET.as_bytes()).expect("sign token");
    let req = Request::builder()
        .method("PATCH")
        .uri("/api/v1/comments/c/not-a-uuid")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"content":"hello"}"#))
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert!(
        json["message"].as_str().unwrap_or_default().contains("comment"),
        "unexpected message: {}",
        json["message"]
    );
}

#[tokio::test]
async fn malformed_json_body_gets_the_error_envelope() {
    let app = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["statusCode"], 400);
    assert!(json["message"].is_string());
    assert!(json["errors"].is_array());
}

#[tokio::test]
async fn json_body_missing_a_field_gets_the_error_envelope() {
    let app = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"identifier":"tester"}"#))
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert!(json["errors"].is_array());
}

#[tokio::test]
async fn wrong_content_type_on_upload_route_gets_the_error_envelope() {
    let app = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/users/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["statusCode"], 400);
}

#[tokio::test]
async fn anonymous_viewer_route_passes_the_guard() {
    // Anonymous access to a viewer route must fail on the bad id (400),
    // never on authentication (401).
    let app = test_app();
    let req = Request::builder()
        .uri("/api/v1/videos/not-a-uuid")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_write_requires_a_session() {
    let app = test_app();
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/likes/toggle/v/{}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = test_app();
    let req = Request::builder()
        .uri("/api/v1/nope")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
