use std::convert::Infallible;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::Stream;
use serde::Deserialize;
use sqlx::SqlitePool;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::services::participant_feed::{ParticipantChange, ParticipantFeed};
use crate::services::participant_service::{self, ParticipantView, ParticipantsPageView};
use crate::web::routes::{redirect_with_notice, render, sanitize_return_to, NoticeQuery, PageChrome};

#[derive(Template)]
#[template(path = "admin/participants.html")]
pub struct ParticipantsTemplate {
    pub page: PageChrome,
    pub view: ParticipantsPageView,
}

pub async fn participants_page(
    Path(event_id): Path<String>,
    Query(query): Query<NoticeQuery>,
    State(pool): State<SqlitePool>,
) -> Result<Response, AppError> {
    let view = participant_service::load_participants_page(&pool, &event_id).await?;
    let template = ParticipantsTemplate {
        page: PageChrome::signed_in(query.notice.as_deref()),
        view,
    };
    Ok(render(&template)?.into_response())
}

/// Participant rows as JSON; the page builds its spreadsheet export from this.
pub async fn participants_json_handler(
    Path(event_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<ParticipantView>>, AppError> {
    Ok(Json(participant_service::list_participants(&pool, &event_id).await?))
}

/// Live changes for one event's participant list.
pub async fn participants_stream_handler(
    Path(event_id): Path<String>,
    State(feed): State<ParticipantFeed>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(feed.subscribe()).filter_map(move |msg| {
        // Lagged receivers skip what they missed.
        let change = msg.ok()?;
        if !change.concerns(&event_id) {
            return None;
        }
        match Event::default().event("participant").json_data(&change) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                debug!("Could not encode participant change: {}", e);
                None
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
pub struct DeleteRegistrationForm {
    pub return_to: Option<String>,
}

pub async fn delete_registration_handler(
    Path(registration_id): Path<String>,
    State(pool): State<SqlitePool>,
    State(feed): State<ParticipantFeed>,
    axum::Form(form): axum::Form<DeleteRegistrationForm>,
) -> Response {
    let fallback = form
        .return_to
        .as_deref()
        .and_then(sanitize_return_to)
        .unwrap_or("/admin/events")
        .to_string();

    match participant_service::remove_registration(&pool, &registration_id).await {
        Ok(event_id) => {
            feed.publish(ParticipantChange::Removed {
                event_id: event_id.clone(),
                registration_id,
            });
            redirect_with_notice(&format!("/admin/events/{}/participants", event_id), "deleted_ok")
        }
        Err(e) => {
            warn!("Registration delete failed for {}: {}", registration_id, e);
            redirect_with_notice(&fallback, e.notice())
        }
    }
}
