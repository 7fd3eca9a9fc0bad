use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::warn;

use crate::config::Config;
use crate::error::AppError;
use crate::models::TeamMemberRow;
use crate::services::contact_service::{self, ContactForm};
use crate::services::event_service::{self, EventCardView, EventDetailView, EventsPageView, HomeView};
use crate::services::gallery_service::{self, GalleryView};
use crate::services::team_members_service;
use crate::web::routes::{redirect_with_notice, render, NoticeQuery, PageChrome};

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageChrome,
    pub home: HomeView,
}

pub async fn home_handler(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
) -> Result<Response, AppError> {
    let home = event_service::load_home_view(&pool).await?;
    let template = HomeTemplate {
        page: PageChrome::new(&headers, &config, query.notice.as_deref()),
        home,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub page: PageChrome,
    pub members: Vec<TeamMemberRow>,
}

pub async fn about_handler(
    headers: HeaderMap,
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
) -> Result<Response, AppError> {
    let members = team_members_service::list_members(&pool).await?;
    let template = AboutTemplate {
        page: PageChrome::new(&headers, &config, None),
        members,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Debug, Deserialize, Default)]
pub struct EventsQuery {
    pub category: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "events.html")]
pub struct EventsTemplate {
    pub page: PageChrome,
    pub events: EventsPageView,
}

pub async fn events_handler(
    headers: HeaderMap,
    Query(query): Query<EventsQuery>,
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
) -> Result<Response, AppError> {
    let events = event_service::load_events_page(&pool, query.category).await?;
    let template = EventsTemplate {
        page: PageChrome::new(&headers, &config, query.notice.as_deref()),
        events,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Template)]
#[template(path = "event_detail.html")]
pub struct EventDetailTemplate {
    pub page: PageChrome,
    pub event: EventDetailView,
}

pub async fn event_detail_handler(
    headers: HeaderMap,
    Path(event_id): Path<String>,
    Query(query): Query<NoticeQuery>,
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
) -> Result<Response, AppError> {
    let event = event_service::load_event_detail(&pool, &event_id)
        .await?
        .ok_or(AppError::EventNotFound)?;
    let template = EventDetailTemplate {
        page: PageChrome::new(&headers, &config, query.notice.as_deref()),
        event,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Template)]
#[template(path = "esummit.html")]
pub struct EsummitTemplate {
    pub page: PageChrome,
    pub events: Vec<EventCardView>,
}

pub async fn esummit_handler(
    headers: HeaderMap,
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
) -> Result<Response, AppError> {
    let events = event_service::load_esummit_events(&pool).await?;
    let template = EsummitTemplate {
        page: PageChrome::new(&headers, &config, None),
        events,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Template)]
#[template(path = "gallery.html")]
pub struct GalleryTemplate {
    pub page: PageChrome,
    pub gallery: GalleryView,
}

pub async fn gallery_handler(
    headers: HeaderMap,
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
) -> Result<Response, AppError> {
    let gallery = gallery_service::load_public_gallery(&pool).await?;
    let template = GalleryTemplate {
        page: PageChrome::new(&headers, &config, None),
        gallery,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub page: PageChrome,
    pub error: Option<String>,
}

pub async fn contact_page(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    State(config): State<Arc<Config>>,
) -> Result<Response, AppError> {
    let template = ContactTemplate {
        page: PageChrome::new(&headers, &config, query.notice.as_deref()),
        error: None,
    };
    Ok(render(&template)?.into_response())
}

pub async fn contact_handler(
    headers: HeaderMap,
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    match contact_service::submit_message(&pool, &form).await {
        Ok(()) => Ok(redirect_with_notice("/contact", "message_sent_ok")),
        Err(AppError::Validation(msg)) => {
            let template = ContactTemplate {
                page: PageChrome::new(&headers, &config, None),
                error: Some(msg),
            };
            Ok(render(&template)?.into_response())
        }
        Err(e) => {
            warn!("Contact submit failed: {}", e);
            Ok(redirect_with_notice("/contact", e.notice()))
        }
    }
}

pub async fn healthz_handler(State(pool): State<SqlitePool>) -> Response {
    let db_ok = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&pool)
        .await
        .is_ok();
    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "database": db_ok,
        "build": env!("ECELL_BUILD_ID"),
    }))
    .into_response()
}
