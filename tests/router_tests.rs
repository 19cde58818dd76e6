mod common;

use audit_portal::{MemoryRepository, create_router, models::Role};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::{
    admin_token, body_json, college_token, create_token, seed_admin,
    seed_college, sign_claims, test_state,
};
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = cookie {
        builder = builder.header(header::COOKIE, format!("token={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn put_json(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(header::COOKIE, format!("token={}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_router(test_state(Arc::new(MemoryRepository::new())));

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_protected_routes_require_cookie() {
    let repo = Arc::new(MemoryRepository::new());

    for uri in [
        "/api/auth/verify",
        "/api/college/profile",
        "/api/college/audit",
        "/api/admin/profile",
        "/api/admin/colleges",
    ] {
        let app = create_router(test_state(repo.clone()));
        let response = app.oneshot(get(uri, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let body = body_json(response).await;
        assert!(body["message"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = create_router(test_state(Arc::new(MemoryRepository::new())));

    let response = app
        .oneshot(get("/api/college/profile", Some("definitely.not.valid")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_with_wrong_secret_is_unauthorized() {
    let repo = Arc::new(MemoryRepository::new());
    let college = seed_college(&repo, "C001").await;
    let app = create_router(test_state(repo));
    let forged = sign_claims(
        &json!({
            "id": college.id,
            "email": college.email,
            "role": "college",
            "exp": 4_000_000_000u64,
        }),
        "not-the-server-secret",
    );

    let response = app
        .oneshot(get("/api/college/profile", Some(&forged)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_returns_user() {
    let app = create_router(test_state(Arc::new(MemoryRepository::new())));
    let id = Uuid::new_v4();

    let response = app
        .oneshot(get("/api/auth/verify", Some(&college_token(id))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], json!(id));
    assert_eq!(body["user"]["role"], "college");
    assert_eq!(body["user"]["email"], "college@example.edu");
    assert_eq!(body["user"]["name"], "Test College");
}

#[tokio::test]
async fn test_verify_accepts_bearer_header() {
    let app = create_router(test_state(Arc::new(MemoryRepository::new())));
    let request = Request::builder()
        .uri("/api/auth/verify")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", admin_token(Uuid::new_v4())),
        )
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_college_profile_success_omits_password() {
    let repo = Arc::new(MemoryRepository::new());
    let college = seed_college(&repo, "C001").await;
    let app = create_router(test_state(repo));

    let response = app
        .oneshot(get("/api/college/profile", Some(&college_token(college.id))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], json!(college.id));
    assert_eq!(body["collegeName"], "College C001");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_college_profile_wrong_role_is_unauthorized() {
    let repo = Arc::new(MemoryRepository::new());
    let college = seed_college(&repo, "C001").await;
    let app = create_router(test_state(repo));

    let response = app
        .oneshot(get(
            "/api/college/profile",
            Some(&create_token(college.id, Role::Admin, 3600)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_college_profile_not_found() {
    let app = create_router(test_state(Arc::new(MemoryRepository::new())));

    let response = app
        .oneshot(get(
            "/api/college/profile",
            Some(&college_token(Uuid::new_v4())),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "College not found");
}

#[tokio::test]
async fn test_store_failure_is_generic_server_error() {
    let repo = Arc::new(MemoryRepository::new());
    let college = seed_college(&repo, "C001").await;
    repo.set_available(false);
    let app = create_router(test_state(repo));

    let response = app
        .oneshot(get("/api/college/profile", Some(&college_token(college.id))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Internal server error");
}

#[tokio::test]
async fn test_save_unknown_section_is_bad_request() {
    let repo = Arc::new(MemoryRepository::new());
    let college = seed_college(&repo, "C001").await;
    let app = create_router(test_state(repo));

    let response = app
        .oneshot(put_json(
            "/api/college/audit/cafeteria",
            &college_token(college.id),
            json!({ "seats": 200 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_save_malformed_json_is_bad_request() {
    let repo = Arc::new(MemoryRepository::new());
    let college = seed_college(&repo, "C001").await;
    let app = create_router(test_state(repo));

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/college/audit/library")
        .header(header::COOKIE, format!("token={}", college_token(college.id)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_admin_routes_reject_college_token() {
    let repo = Arc::new(MemoryRepository::new());
    let college = seed_college(&repo, "C001").await;
    let app = create_router(test_state(repo));

    let response = app
        .oneshot(get("/api/admin/colleges", Some(&college_token(college.id))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_profile_omits_password() {
    let repo = Arc::new(MemoryRepository::new());
    let admin = seed_admin(&repo, "A001").await;
    let app = create_router(test_state(repo));

    let response = app
        .oneshot(get("/api/admin/profile", Some(&admin_token(admin.id))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["adminCode"], "A001");
    assert_eq!(body["role"], "admin");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_logout_expires_cookie() {
    let app = create_router(test_state(Arc::new(MemoryRepository::new())));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/logout")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = create_router(test_state(Arc::new(MemoryRepository::new())));

    let response = app
        .oneshot(get("/api-docs/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/api/college/profile"].is_object());
    assert!(body["paths"]["/api/auth/verify"].is_object());
}

#[tokio::test]
async fn test_expired_cookie_is_unauthorized() {
    let repo = Arc::new(MemoryRepository::new());
    let college = seed_college(&repo, "C001").await;
    let app = create_router(test_state(repo));

    let response = app
        .oneshot(get(
            "/api/college/profile",
            Some(&create_token(college.id, Role::College, -3600)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// --- Admin gate ordering and rejection bodies ---

fn assert_json_content_type(response: &axum::response::Response) {
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("application/json"), "{content_type}");
}

#[tokio::test]
async fn test_admin_gate_rejects_college_before_path_parsing() {
    let repo = Arc::new(MemoryRepository::new());
    let college = seed_college(&repo, "C001").await;
    let app = create_router(test_state(repo));

    let response = app
        .oneshot(get(
            "/api/admin/colleges/not-a-uuid/audit",
            Some(&college_token(college.id)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_json_content_type(&response);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn test_admin_gate_rejects_college_before_body_parsing() {
    let repo = Arc::new(MemoryRepository::new());
    let college = seed_college(&repo, "C001").await;
    let token = college_token(college.id);

    // No content type at all.
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/admin/profile")
        .header(header::COOKIE, format!("token={}", token))
        .body(Body::from("{}"))
        .unwrap();
    let response = create_router(test_state(repo.clone()))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Malformed JSON.
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/admin/profile")
        .header(header::COOKIE, format!("token={}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{bad"))
        .unwrap();
    let response = create_router(test_state(repo))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_json_content_type(&response);
}

#[tokio::test]
async fn test_admin_bad_college_id_is_json_bad_request() {
    let repo = Arc::new(MemoryRepository::new());
    let admin = seed_admin(&repo, "A001").await;
    let app = create_router(test_state(repo));

    let response = app
        .oneshot(get(
            "/api/admin/colleges/not-a-uuid/audit",
            Some(&admin_token(admin.id)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_json_content_type(&response);
    let body = body_json(response).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_admin_profile_malformed_body_is_json_bad_request() {
    let repo = Arc::new(MemoryRepository::new());
    let admin = seed_admin(&repo, "A001").await;
    let token = admin_token(admin.id);

    let response = create_router(test_state(repo.clone()))
        .oneshot(put_json("/api/admin/profile", &token, json!("not an object")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_json_content_type(&response);
    assert!(body_json(response).await["message"].is_string());

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/admin/profile")
        .header(header::COOKIE, format!("token={}", token))
        .body(Body::from(r#"{"name":"Grace"}"#))
        .unwrap();
    let response = create_router(test_state(repo))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["message"].is_string());
}
