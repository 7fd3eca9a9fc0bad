use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use ecell_website::config::Config;
use ecell_website::database::{self, profiles_repo};
use ecell_website::services::auth_service;
use ecell_website::services::participant_feed::ParticipantChange;
use ecell_website::state::AppState;

const SECRET: &str = "test-secret";

fn cookie_for(user_id: &str) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 600;
    let token = auth_service::sign_token(&json!({ "sub": user_id, "exp": exp }), SECRET);
    format!("access_token={}", token)
}

async fn setup() -> (Router, AppState, String) {
    let pool = database::connect_in_memory().await.unwrap();
    let config = Config {
        jwt_secret: Some(SECRET.to_string()),
        ..Config::default()
    };
    let state = AppState::new(pool, config);

    let admin_id = Uuid::new_v4().to_string();
    profiles_repo::ensure_profile(&state.pool, &admin_id, Some("admin@ecell.org"))
        .await
        .unwrap();
    profiles_repo::set_admin(&state.pool, &admin_id).await.unwrap();

    (ecell_website::build_router(state.clone()), state, admin_id)
}

async fn complete_profile(state: &AppState, user_id: &str) {
    profiles_repo::update_profile(
        &state.pool,
        user_id,
        profiles_repo::ProfileUpdate {
            full_name: "Meera Iyer",
            phone: "9123456780",
            age: 22,
            gender: "female",
            college: Some("IIT"),
            avatar_url: None,
        },
    )
    .await
    .unwrap();
}

async fn scan(app: &Router, cookie: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method("POST")
        .uri("/api/checkin/scan")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(c) = cookie {
        req = req.header(header::COOKIE, c);
    }
    let res = app
        .clone()
        .oneshot(req.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn scan_requires_an_admin_session() {
    let (app, state, _) = setup().await;

    let (status, _) = scan(&app, None, json!({ "code": "x" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user_id = Uuid::new_v4().to_string();
    profiles_repo::ensure_profile(&state.pool, &user_id, None)
        .await
        .unwrap();
    let (status, _) = scan(&app, Some(&cookie_for(&user_id)), json!({ "code": "x" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn attendee_is_checked_in_once_per_day() {
    let (app, state, admin_id) = setup().await;
    let admin_cookie = cookie_for(&admin_id);
    let mut feed = state.feed.subscribe();

    let attendee = Uuid::new_v4().to_string();
    profiles_repo::ensure_profile(&state.pool, &attendee, Some("meera@example.com"))
        .await
        .unwrap();
    let qr = json!({ "userId": attendee }).to_string();

    // Incomplete profiles are turned away without being marked.
    let (status, body) = scan(&app, Some(&admin_cookie), json!({ "code": qr })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["outcome"]["status"], "incomplete_profile");

    complete_profile(&state, &attendee).await;

    let (status, body) = scan(&app, Some(&admin_cookie), json!({ "code": qr, "day": "1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["outcome"]["attendee"]["name"], "Meera Iyer");

    match feed.recv().await.unwrap() {
        ParticipantChange::CheckedIn { user_id, .. } => assert_eq!(user_id, attendee),
        other => panic!("unexpected change: {:?}", other),
    }

    let (status, body) = scan(&app, Some(&admin_cookie), json!({ "code": qr, "day": "1" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["outcome"]["status"], "already_checked_in");

    // Day two is tracked separately; a bare uuid works too.
    let (status, _) = scan(&app, Some(&admin_cookie), json!({ "code": attendee, "day": "2" })).await;
    assert_eq!(status, StatusCode::OK);

    let profile = profiles_repo::load_profile(&state.pool, &attendee)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.esummit_checked_in, 1);
    assert_eq!(profile.esummit_day2_checked_in, 1);
}

#[tokio::test]
async fn unknown_and_malformed_codes_are_reported() {
    let (app, _, admin_id) = setup().await;
    let admin_cookie = cookie_for(&admin_id);

    let (status, body) = scan(&app, Some(&admin_cookie), json!({ "code": "hello" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["outcome"]["status"], "invalid_code");

    let stranger = Uuid::new_v4().to_string();
    let (status, body) = scan(&app, Some(&admin_cookie), json!({ "code": stranger })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["outcome"]["status"], "not_found");
}

#[tokio::test]
async fn forged_unsigned_token_is_rejected_without_a_secret() {
    let pool = database::connect_in_memory().await.unwrap();
    // No signing secret, and nothing answers on the discard port.
    let config = Config {
        auth_api_url: "http://127.0.0.1:9".to_string(),
        ..Config::default()
    };
    let state = AppState::new(pool, config);
    let admin_id = Uuid::new_v4().to_string();
    profiles_repo::ensure_profile(&state.pool, &admin_id, Some("admin@ecell.org"))
        .await
        .unwrap();
    profiles_repo::set_admin(&state.pool, &admin_id).await.unwrap();
    let app = ecell_website::build_router(state);

    let header_part = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(json!({ "sub": admin_id }).to_string());
    let forged = format!("access_token={}.{}.forged", header_part, payload);

    let (status, _) = scan(&app, Some(&forged), json!({ "code": admin_id })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/admin")
        .header(header::COOKIE, &forged)
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}
