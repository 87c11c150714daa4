use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use swot_portal::{
    AppConfig, AppState, CaptchaService, MockBackend, SessionStore, SubmissionStore,
    create_router,
    models::{ErrorResponse, SessionResponse, SubmissionListResponse},
    storage::StorageState,
};
use std::sync::Arc;
use tower::util::ServiceExt;

fn app(backend: MockBackend) -> axum::Router {
    let config = AppConfig::default();
    let state = AppState {
        store: SubmissionStore::new(Arc::new(backend) as StorageState),
        sessions: SessionStore::new(),
        captcha: CaptchaService::new(config.captcha_secret.clone()),
        config,
    };
    create_router(state)
}

/// Mints a captcha token with a known answer against the default test secret.
fn valid_captcha() -> (String, String) {
    let captcha = CaptchaService::new(AppConfig::default().captcha_secret);
    let token = captcha.encode_token(7, Utc::now().timestamp_millis() + 60_000);
    (token, "7".to_string())
}

fn login_body(username: &str, password: &str, token: &str, answer: &str) -> String {
    serde_json::json!({
        "username": username,
        "password": password,
        "captchaToken": token,
        "captchaAnswer": answer,
    })
    .to_string()
}

async fn post_login(app: &axum::Router, body: String) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/login")
                .header("Content-Type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Runs the full login flow and returns the session cookie pair (`name=value`).
async fn login(app: &axum::Router) -> String {
    let (token, answer) = valid_captcha();
    let response = post_login(app, login_body("admin", "admin", &token, &answer)).await;
    assert_eq!(response.status(), StatusCode::OK);

    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login sets the session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_login_with_bad_captcha_is_rejected_before_credentials() {
    let app = app(MockBackend::new());

    // Correct credentials, garbage captcha: must be the 400 captcha path,
    // not the 401 credential path.
    let response = post_login(&app, login_body("admin", "admin", "not-a-token", "7")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = body_json(response).await;
    assert_eq!(body.error, "Incorrect captcha. Please try again.");
}

#[tokio::test]
async fn test_login_with_wrong_password_fails_and_creates_no_session() {
    let app = app(MockBackend::new());

    let (token, answer) = valid_captcha();
    let response = post_login(&app, login_body("admin", "wrong", &token, &answer)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body: ErrorResponse = body_json(response).await;
    assert_eq!(body.error, "Invalid username or password");

    // No session means the admin surface stays closed.
    let me = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_unknown_user_fails() {
    let app = app(MockBackend::new());

    let (token, answer) = valid_captcha();
    let response = post_login(&app, login_body("nobody", "admin", &token, &answer)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_captcha_token_replays_within_ttl() {
    // Stateless tokens are not single-use; a second login with the same
    // token+answer pair succeeds. Documented tradeoff of the design.
    let app = app(MockBackend::new());
    let (token, answer) = valid_captcha();

    let first = post_login(&app, login_body("admin", "admin", &token, &answer)).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = post_login(&app, login_body("admin", "admin", &token, &answer)).await;
    assert_eq!(second.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_session_lifecycle_login_me_clear_logout() {
    let backend = MockBackend::new();
    let app = app(backend.clone());

    // Seed a submission through the public form.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/submissions")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"name":"Ana","strengths":["fast"]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Login.
    let cookie = login(&app).await;

    // me: session resolves to the admin user.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: SessionResponse = body_json(response).await;
    assert!(body.success);
    assert_eq!(body.user, "admin");

    // List: the seeded submission is visible.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/submissions")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: SubmissionListResponse = body_json(response).await;
    assert_eq!(body.data.len(), 1);
    assert_eq!(body.data[0].name, "Ana");

    // Clear: both the response and the durable backend go empty.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/submissions")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: SubmissionListResponse = body_json(response).await;
    assert!(body.data.is_empty());
    assert!(backend.saved().is_empty());

    // Logout: always succeeds and clears the cookie.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));

    // The destroyed session no longer authenticates.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_still_succeeds() {
    let app = app(MockBackend::new());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_analyze_rejects_empty_prompt() {
    let app = app(MockBackend::new());
    let cookie = login(&app).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze")
                .header("Content-Type", "application/json")
                .header(header::COOKIE, &cookie)
                .body(Body::from(r#"{"prompt":"   "}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = body_json(response).await;
    assert_eq!(body.error, "Missing prompt");
}

#[tokio::test]
async fn test_analyze_unconfigured_returns_service_unavailable() {
    // The default test config carries no OPENAI_API_KEY.
    let app = app(MockBackend::new());
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze")
                .header("Content-Type", "application/json")
                .header(header::COOKIE, &cookie)
                .body(Body::from(r#"{"prompt":"Summarize the feedback"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // And the status probe reports the same, without leaking anything.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/analyze/status")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["configured"], false);
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    // A cookie with a well-formed but unknown id must not authenticate.
    let app = app(MockBackend::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/me")
                .header(
                    header::COOKIE,
                    "swot_session=00000000-0000-0000-0000-000000000000",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
