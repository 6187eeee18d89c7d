#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use paydhan_backend::api::build_router;
use paydhan_backend::auth::hash_secret;
use paydhan_backend::database::create_lazy_pool;
use paydhan_backend::models::*;
use paydhan_backend::repositories::*;
use paydhan_backend::services::group_service::CreateGroupRequest;
use paydhan_backend::{AppConfig, AppState};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

/// State over a pool that never connects unless a handler reaches the database
pub fn offline_state() -> AppState {
    let config = AppConfig::default();
    let pool = create_lazy_pool(&config.database).expect("Failed to create lazy pool");
    AppState::new(pool, config)
}

/// State over a real database (used with `#[sqlx::test]`)
pub fn state_from_pool(pool: PgPool) -> AppState {
    AppState::new(pool, AppConfig::default())
}

pub fn router(state: &AppState) -> Router {
    build_router(state.clone())
}

/// `Cookie` header value carrying a valid session for `user_id`
pub fn session_cookie(state: &AppState, user_id: Uuid) -> String {
    let token = state.sessions.issue(user_id).expect("Failed to issue session");
    format!("paydhan_session={}", token)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Drive one request through the router and decode the JSON body (Null if empty or not JSON)
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.expect("Router failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse { status, headers, body }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("Failed to build request")
}

pub fn json_request(method: &str, uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

// ============================================================================
// Database fixtures
// ============================================================================

/// Insert a user with a username and the PIN `1234`
pub async fn create_test_user(state: &AppState, username: &str) -> User {
    UserRepository::new(state.database.pool().clone())
        .create(&NewUser {
            username: Some(username.to_string()),
            email: Some(format!("{}@example.com", username)),
            full_name: Some(format!("Test {}", username)),
            pin_hash: Some(hash_secret("1234").expect("Failed to hash PIN")),
            ..NewUser::default()
        })
        .await
        .expect("Failed to create test user")
}

/// Group created by `admin` with every user in `members` added as a plain member
pub async fn create_test_group(state: &AppState, admin: &User, members: &[&User]) -> Group {
    let group = state
        .group_service
        .create(
            admin.id,
            &CreateGroupRequest {
                name: "Flatmates".to_string(),
                description: Some("Rent and groceries".to_string()),
            },
        )
        .await
        .expect("Failed to create group");

    let member_repo = GroupMemberRepository::new(state.database.pool().clone());
    for member in members {
        member_repo
            .add_member(group.id, member.id, MemberRole::Member)
            .await
            .expect("Failed to add member");
    }

    group
}
