use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use ecell_website::config::Config;
use ecell_website::database::events_repo::{self, EventWrite};
use ecell_website::database::profiles_repo::{self, ProfileUpdate};
use ecell_website::database::{self, teams_repo};
use ecell_website::services::auth_service;
use ecell_website::state::AppState;

const SECRET: &str = "site-secret";

fn cookie_for(user_id: &str) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 600;
    let token = auth_service::sign_token(&json!({ "sub": user_id, "exp": exp }), SECRET);
    format!("access_token={}", token)
}

async fn setup() -> (Router, AppState) {
    let pool = database::connect_in_memory().await.unwrap();
    let config = Config {
        jwt_secret: Some(SECRET.to_string()),
        ..Config::default()
    };
    let state = AppState::new(pool, config);
    (ecell_website::build_router(state.clone()), state)
}

async fn seed_team_event(state: &AppState, max_team_size: i64) -> String {
    let id = Uuid::new_v4().to_string();
    events_repo::insert_event(
        &state.pool,
        &id,
        &EventWrite {
            title: "Hack the Summit".into(),
            description: Some("24 hour build sprint".into()),
            event_date: "2026-02-14".into(),
            event_time: Some("09:00".into()),
            venue: Some("Main Hall".into()),
            category: Some("Hackathon".into()),
            status: "upcoming".into(),
            image_url: None,
            featured: true,
            is_team_event: true,
            is_esummit: true,
            registrations_open: true,
            min_team_size: 1,
            max_team_size,
            details: r#"{"faq":[{"question":"Food?","answer":"Yes"}]}"#.into(),
        },
    )
    .await
    .unwrap();
    id
}

async fn seed_user(state: &AppState, name: &str) -> String {
    let id = Uuid::new_v4().to_string();
    profiles_repo::ensure_profile(&state.pool, &id, Some(&format!("{name}@example.com")))
        .await
        .unwrap();
    profiles_repo::update_profile(
        &state.pool,
        &id,
        ProfileUpdate {
            full_name: name,
            phone: "9000000000",
            age: 19,
            gender: "male",
            college: None,
            avatar_url: None,
        },
    )
    .await
    .unwrap();
    id
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut req = Request::builder().uri(uri);
    if let Some(c) = cookie {
        req = req.header(header::COOKIE, c);
    }
    app.clone()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_form(app: &Router, uri: &str, cookie: &str, form: &str) -> Response {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

fn location(res: &Response) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn body_text(res: Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn public_pages_render() {
    let (app, state) = setup().await;
    let event_id = seed_team_event(&state, 4).await;

    let res = get(&app, "/", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("Hack the Summit"));

    let res = get(&app, &format!("/events/{}", event_id), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("Food?"));

    for uri in ["/events?category=hackathon", "/esummit", "/gallery", "/about", "/contact", "/login"] {
        assert_eq!(get(&app, uri, None).await.status(), StatusCode::OK, "{uri}");
    }

    assert_eq!(
        get(&app, "/events/does-not-exist", None).await.status(),
        StatusCode::NOT_FOUND
    );

    let res = get(&app, "/healthz", None).await;
    let health: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(health["database"], true);
}

#[tokio::test]
async fn protected_pages_redirect_to_login() {
    let (app, _) = setup().await;
    let res = get(&app, "/profile", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login?return_to=%2Fprofile");

    // Signed in but not an admin.
    let res = get(&app, "/admin", Some(&cookie_for("someone"))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn team_registration_over_http() {
    let (app, state) = setup().await;
    let event_id = seed_team_event(&state, 2).await;
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;
    let carol = seed_user(&state, "Carol").await;
    let mut feed = state.feed.subscribe();

    let res = post_form(
        &app,
        &format!("/events/{}/teams", event_id),
        &cookie_for(&alice),
        "team_name=++",
    )
    .await;
    assert!(location(&res).ends_with("notice=team_name_required"));
    let res = get(&app, &location(&res), Some(&cookie_for(&alice))).await;
    assert!(body_text(res).await.contains("Team name is required."));

    let res = post_form(
        &app,
        &format!("/events/{}/teams", event_id),
        &cookie_for(&alice),
        "team_name=Alpha",
    )
    .await;
    assert_eq!(
        location(&res),
        format!("/events/{}/register?notice=team_created_ok", event_id)
    );
    assert!(feed.try_recv().is_ok());

    let res = get(
        &app,
        &format!("/events/{}/register", event_id),
        Some(&cookie_for(&alice)),
    )
    .await;
    let page = body_text(res).await;
    assert!(page.contains("Team Alpha"));

    let team_id: String = sqlx::query_scalar("SELECT team_id FROM registrations WHERE user_id = ?1")
        .bind(&alice)
        .fetch_one(&state.pool)
        .await
        .unwrap();
    let team = teams_repo::load_team(&state.pool, &team_id)
        .await
        .unwrap()
        .unwrap();
    let code = team.join_code.to_lowercase();

    let join_url = format!("/events/{}/teams/join", event_id);
    let res = post_form(&app, &join_url, &cookie_for(&bob), &format!("join_code={}", code)).await;
    assert!(location(&res).ends_with("notice=team_joined_ok"));

    let res = post_form(&app, &join_url, &cookie_for(&carol), &format!("join_code={}", code)).await;
    assert!(location(&res).ends_with("notice=team_full"));

    let res = post_form(&app, &join_url, &cookie_for(&carol), "join_code=ZZZZZZ").await;
    assert!(location(&res).ends_with("notice=invalid_code"));
}
