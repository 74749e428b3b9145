use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use companions_server::{
    api::app_router, auth::IdentityVerifier, build_state, config::Config, AppState,
};
use companions_storage_postgrest::{test_support::InMemoryStore, PostgrestConfig};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

const JWT_SECRET: &str = "integration-test-shared-secret-0123456789";

// Nothing listens on the discard port; routers from `build_test_router`
// must answer before the remote store would be contacted.
fn test_config() -> Config {
    Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        cors_allow: vec!["*".to_string()],
        request_timeout: Duration::from_secs(5),
        sign_in_path: "/sign-in".to_string(),
        store: PostgrestConfig::new("http://127.0.0.1:9", "anon-key"),
        jwt_secret: Some(JWT_SECRET.to_string()),
        jwt_public_key: None,
    }
}

async fn build_test_router() -> axum::Router {
    let config = test_config();
    let state = build_state(&config).await.unwrap();
    app_router(state, &config)
}

/// Router whose requests all reach the given in-memory store.
fn router_over(store: Arc<InMemoryStore>) -> axum::Router {
    let config = test_config();
    let state = Arc::new(AppState {
        stores: Arc::new(store),
        verifier: Some(Arc::new(IdentityVerifier::from_secret(JWT_SECRET).unwrap())),
        sign_in_path: config.sign_in_path.clone(),
    });
    app_router(state, &config)
}

fn companion_row(id: &str, name: &str, subject: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "subject": subject,
        "topic": "Basics",
        "voice": "female",
        "style": "casual",
        "duration": 30,
        "author": "seed_user",
        "created_at": created_at
    })
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect()
}

fn access_token(sub: &str) -> String {
    let claims = json!({
        "sub": sub,
        "exp": chrono::Utc::now().timestamp() + 3600,
        "aud": "authenticated",
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn valid_form() -> Value {
    json!({
        "name": "Countsy",
        "subject": "maths",
        "topic": "Derivatives",
        "voice": "male",
        "style": "formal",
        "duration": 15
    })
}

#[tokio::test]
async fn healthz_works() {
    let app = build_test_router().await;

    let response = app.oneshot(get("/api/v1/healthz")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn subjects_are_listed() {
    let app = build_test_router().await;

    let response = app.oneshot(get("/api/v1/subjects")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!(["maths", "language", "science", "history", "coding", "economics"])
    );
}

#[tokio::test]
async fn anonymous_submission_redirects_to_sign_in() {
    let app = build_test_router().await;

    let response = app
        .oneshot(post_json("/api/v1/companions", valid_form(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/sign-in");
}

#[tokio::test]
async fn anonymous_session_recording_redirects_to_sign_in() {
    let app = build_test_router().await;

    let response = app
        .oneshot(post_json("/api/v1/companions/abc/sessions", json!({}), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/sign-in");
}

#[tokio::test]
async fn invalid_submission_reports_field_errors() {
    let app = build_test_router().await;
    let token = access_token("user_1");
    let mut form = valid_form();
    form["name"] = json!("");
    form["duration"] = json!(0);

    let response = app
        .oneshot(post_json("/api/v1/companions", form, Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], 400);
    let fields: Vec<&str> = body["fieldErrors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "duration"]);
}

#[tokio::test]
async fn invalid_bearer_token_is_rejected() {
    let app = build_test_router().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/companions",
            valid_form(),
            Some("not-a-valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_rejects_zero_limit_before_reaching_store() {
    let app = build_test_router().await;

    let response = app
        .oneshot(get("/api/v1/companions?limit=0"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recent_sessions_reject_zero_limit() {
    let app = build_test_router().await;

    let response = app
        .oneshot(get("/api/v1/sessions/recent?limit=0"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn authenticated_submission_creates_companion() {
    let store = Arc::new(InMemoryStore::new());
    let app = router_over(store.clone());
    let token = access_token("user_1");

    let response = app
        .oneshot(post_json("/api/v1/companions", valid_form(), Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/companions/companions-1"
    );
    let body = json_body(response).await;
    assert_eq!(body["id"], "companions-1");
    assert_eq!(body["name"], "Countsy");
    assert_eq!(body["author"], "user_1");
    assert_eq!(store.inserts().len(), 1);
}

#[tokio::test]
async fn unknown_companion_is_not_found() {
    let store = Arc::new(InMemoryStore::new());
    store.seed(
        "companions",
        vec![companion_row("c-1", "Neura", "science", "2025-03-01T00:00:00+00:00")],
    );
    let app = router_over(store);

    let response = app
        .clone()
        .oneshot(get("/api/v1/companions/missing"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], 404);

    let response = app.oneshot(get("/api/v1/companions/c-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["name"], "Neura");
}

#[tokio::test]
async fn store_failure_is_reported_as_bad_gateway() {
    let app = router_over(Arc::new(InMemoryStore::failing("connection reset")));
    let token = access_token("user_1");

    let response = app
        .clone()
        .oneshot(get("/api/v1/companions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["code"], 502);

    let response = app
        .oneshot(post_json("/api/v1/companions", valid_form(), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn companions_are_listed_newest_first() {
    let store = Arc::new(InMemoryStore::new());
    store.seed(
        "companions",
        vec![
            companion_row("c-1", "Countsy", "maths", "2025-03-01T00:00:00+00:00"),
            companion_row("c-2", "Neura", "science", "2025-03-02T00:00:00+00:00"),
            companion_row("c-3", "Algebrina", "maths", "2025-03-03T00:00:00+00:00"),
        ],
    );
    let app = router_over(store);

    let response = app
        .clone()
        .oneshot(get("/api/v1/companions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(names(&body), vec!["Algebrina", "Neura", "Countsy"]);

    let response = app
        .oneshot(get("/api/v1/companions?subject=MATHS"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(names(&body), vec!["Algebrina", "Countsy"]);
}

#[tokio::test]
async fn recent_sessions_list_engaged_companions() {
    let store = Arc::new(InMemoryStore::new());
    store.seed(
        "companions",
        vec![
            companion_row("c-1", "Countsy", "maths", "2025-03-01T00:00:00+00:00"),
            companion_row("c-2", "Neura", "science", "2025-03-02T00:00:00+00:00"),
        ],
    );
    store.seed(
        "session_history",
        vec![
            json!({"id": 1, "companion_id": "c-1", "user_id": "user_1",
                   "created_at": "2025-04-01T10:00:00+00:00"}),
            json!({"id": 2, "companion_id": "c-2", "user_id": "user_2",
                   "created_at": "2025-04-01T11:00:00+00:00"}),
        ],
    );
    let app = router_over(store);

    let response = app
        .clone()
        .oneshot(get("/api/v1/sessions/recent"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(names(&body), vec!["Neura", "Countsy"]);

    let response = app
        .oneshot(get("/api/v1/users/user_1/sessions?limit=5"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(names(&body), vec!["Countsy"]);
}

#[tokio::test]
async fn recording_a_session_returns_the_entry() {
    let store = Arc::new(InMemoryStore::new());
    let app = router_over(store.clone());
    let token = access_token("user_9");

    let response = app
        .oneshot(post_json(
            "/api/v1/companions/c-1/sessions",
            json!({}),
            Some(&token),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["companionId"], "c-1");
    assert_eq!(body["userId"], "user_9");
    assert_eq!(store.inserts()[0].table_name(), "session_history");
}
