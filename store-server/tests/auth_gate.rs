//! Authentication gate + store routes through the axum router (no network)
//! Run: cargo test -p store-server --test auth_gate

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tower::ServiceExt;

use store_server::api::build_app;
use store_server::auth::{IdentityVerifier, JwtConfig, JwtVerifier, VerificationError};
use store_server::db::DbService;
use store_server::db::models::NewStore;
use store_server::{Config, ServerState};

/// Accepts only the token "good", counting every verification call
#[derive(Default)]
struct StubVerifier {
    calls: AtomicUsize,
}

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, token: &str) -> Result<String, VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match token {
            "good" => Ok("uid-1".to_string()),
            _ => Err(VerificationError::Rejected("revoked".to_string())),
        }
    }
}

async fn state_with(verifier: Arc<dyn IdentityVerifier>) -> ServerState {
    let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
    let service = DbService::init(db, "test", "test").await.unwrap();
    let state = ServerState::new(Config::in_memory(), service.db, verifier);

    state
        .stores
        .create(
            "s1",
            NewStore {
                open_state: true,
                is_auto: true,
                close_time: Some("21:00".into()),
                sale_start: Some("09:00".into()),
                open_day_of_week: vec![1, 2, 3, 4, 5],
                store_name: Some("Mayo Gangnam".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    state
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let verifier = Arc::new(StubVerifier::default());
    let app = build_app(&state_with(verifier.clone()).await);

    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_token_is_rejected_before_verifier() {
    let verifier = Arc::new(StubVerifier::default());
    let app = build_app(&state_with(verifier.clone()).await);

    let (status, body) = send(&app, "GET", "/api/me", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E3001");
    assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_token_fails_like_missing_token() {
    let verifier = Arc::new(StubVerifier::default());
    let app = build_app(&state_with(verifier.clone()).await);

    let (missing_status, missing_body) = send(&app, "GET", "/api/me", None, None).await;
    let (status, body) = send(&app, "GET", "/api/me", Some("forged"), None).await;

    assert_eq!(status, missing_status);
    assert_eq!(body, missing_body);
    assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn accepted_token_binds_subject() {
    let verifier = Arc::new(StubVerifier::default());
    let app = build_app(&state_with(verifier.clone()).await);

    let (status, body) = send(&app, "GET", "/api/me", Some("good"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subject_id"], "uid-1");
    assert_eq!(body["data"]["access"], "create_user");
    assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_request_never_reaches_handler() {
    let state = state_with(Arc::new(StubVerifier::default())).await;
    let app = build_app(&state);

    let (status, _) = send(&app, "POST", "/api/stores/s1/close", Some("forged"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(state.stores.get("s1").await.unwrap().open_state);
}

#[tokio::test]
async fn store_routes_with_hs256_tokens() {
    let jwt = Arc::new(JwtVerifier::with_config(JwtConfig {
        secret: "integration-test-secret-of-sufficient-length".to_string(),
        expiration_minutes: 5,
        issuer: "store-server".to_string(),
        audience: "store-clients".to_string(),
    }));
    let token = jwt.issue_token("operator-7").unwrap();
    let state = state_with(jwt).await;
    let app = build_app(&state);

    let (status, body) = send(&app, "GET", "/api/stores/s1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["store_id"], "s1");
    assert_eq!(body["data"]["open_state"], true);

    let (status, body) = send(&app, "POST", "/api/stores/s1/close", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["store_id"], "s1");
    assert!(!state.stores.get("s1").await.unwrap().open_state);

    // no-op on a missing store, still success
    let (status, _) = send(&app, "POST", "/api/stores/ghost/open", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/stores/ghost", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E0003");
}

#[tokio::test]
async fn update_route_validates_and_reports_missing_store() {
    let state = state_with(Arc::new(StubVerifier::default())).await;
    let app = build_app(&state);

    let update = json!({
        "address": "Busan",
        "store_name": "Mayo Haeundae",
        "store_number": "051-000-0000",
        "open_time": "08:00",
        "close_time": "22:00",
        "sale_start": "08:30",
        "sale_end": "21:30",
        "additional_comment": null
    });

    let (status, body) = send(
        &app,
        "PUT",
        "/api/stores/s1",
        Some("good"),
        Some(update.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["store_id"], "s1");
    assert_eq!(
        state.stores.get("s1").await.unwrap().close_time.as_deref(),
        Some("22:00")
    );

    let (status, _) = send(
        &app,
        "PUT",
        "/api/stores/ghost",
        Some("good"),
        Some(update.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut bad = update;
    bad["close_time"] = json!("10pm");
    let (status, body) = send(&app, "PUT", "/api/stores/s1", Some("good"), Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}
