use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::error::AppError;
use crate::services::participant_feed::{ParticipantChange, ParticipantFeed};
use crate::services::participant_service;
use crate::services::registration_service::{self, RegistrationPageView};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::routes::{redirect_with_notice, render, NoticeQuery, PageChrome};

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub page: PageChrome,
    pub view: RegistrationPageView,
}

pub async fn register_page(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    Query(query): Query<NoticeQuery>,
    State(pool): State<SqlitePool>,
) -> Result<Response, AppError> {
    let view = registration_service::load_registration_view(&pool, &auth_user.id, &event_id)
        .await?
        .ok_or(AppError::EventNotFound)?;
    let template = RegisterTemplate {
        page: PageChrome::signed_in(query.notice.as_deref()),
        view,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamForm {
    pub team_name: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinTeamForm {
    pub join_code: String,
}

fn register_url(event_id: &str) -> String {
    format!("/events/{}/register", event_id)
}

async fn announce(pool: &SqlitePool, feed: &ParticipantFeed, event_id: &str, registration_id: &str) {
    match participant_service::load_participant(pool, registration_id).await {
        Ok(Some(participant)) => feed.publish(ParticipantChange::Registered {
            event_id: event_id.to_string(),
            participant,
        }),
        Ok(None) => {}
        Err(e) => warn!("Could not load participant {} for the feed: {}", registration_id, e),
    }
}

pub async fn register_individual_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(pool): State<SqlitePool>,
    State(feed): State<ParticipantFeed>,
) -> Response {
    let notice = match registration_service::register_individual(&pool, &auth_user.id, &event_id).await {
        Ok(registration_id) => {
            announce(&pool, &feed, &event_id, &registration_id).await;
            "registered_ok"
        }
        Err(e) => {
            warn!("Registration failed for {} on {}: {}", auth_user.id, event_id, e);
            e.notice()
        }
    };
    redirect_with_notice(&register_url(&event_id), notice)
}

pub async fn create_team_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(pool): State<SqlitePool>,
    State(feed): State<ParticipantFeed>,
    Form(form): Form<CreateTeamForm>,
) -> Response {
    let notice = match registration_service::create_team(&pool, &auth_user.id, &event_id, &form.team_name)
        .await
    {
        Ok(created) => {
            announce(&pool, &feed, &event_id, &created.registration_id).await;
            "team_created_ok"
        }
        Err(e) => {
            warn!("Team creation failed for {} on {}: {}", auth_user.id, event_id, e);
            e.notice()
        }
    };
    redirect_with_notice(&register_url(&event_id), notice)
}

pub async fn join_team_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(pool): State<SqlitePool>,
    State(feed): State<ParticipantFeed>,
    Form(form): Form<JoinTeamForm>,
) -> Response {
    let notice = match registration_service::join_team(&pool, &auth_user.id, &event_id, &form.join_code)
        .await
    {
        Ok(joined) => {
            announce(&pool, &feed, &event_id, &joined.registration_id).await;
            "team_joined_ok"
        }
        Err(e) => {
            warn!("Team join failed for {} on {}: {}", auth_user.id, event_id, e);
            e.notice()
        }
    };
    redirect_with_notice(&register_url(&event_id), notice)
}
