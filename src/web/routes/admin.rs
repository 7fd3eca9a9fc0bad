use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{ContactMessageRow, EventStatus, TeamMemberRow};
use crate::services::contact_service;
use crate::services::event_service::{self, EventCardView, EventForm};
use crate::services::gallery_service::{self, CollectionForm, GalleryView, ImageForm, SectionForm};
use crate::services::participant_service::{self, DashboardView};
use crate::services::team_members_service::{self, TeamMemberForm};
use crate::web::routes::{redirect_with_notice, render, NoticeQuery, PageChrome};

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageChrome,
    pub stats: DashboardView,
    pub events: Vec<EventCardView>,
}

pub async fn dashboard_handler(
    Query(query): Query<NoticeQuery>,
    State(pool): State<SqlitePool>,
) -> Result<Response, AppError> {
    let stats = participant_service::load_dashboard(&pool).await?;
    let events = event_service::list_all_events(&pool).await?;
    let template = DashboardTemplate {
        page: PageChrome::signed_in(query.notice.as_deref()),
        stats,
        events,
    };
    Ok(render(&template)?.into_response())
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Template)]
#[template(path = "admin/events.html")]
pub struct AdminEventsTemplate {
    pub page: PageChrome,
    pub events: Vec<EventCardView>,
}

pub async fn events_handler(
    Query(query): Query<NoticeQuery>,
    State(pool): State<SqlitePool>,
) -> Result<Response, AppError> {
    let events = event_service::list_all_events(&pool).await?;
    let template = AdminEventsTemplate {
        page: PageChrome::signed_in(query.notice.as_deref()),
        events,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Template)]
#[template(path = "admin/event_form.html")]
pub struct EventFormTemplate {
    pub page: PageChrome,
    pub event_id: Option<String>,
    pub form: EventForm,
    pub statuses: Vec<&'static str>,
    pub error: Option<String>,
}

impl EventFormTemplate {
    fn new(event_id: Option<String>, form: EventForm, error: Option<String>) -> Self {
        Self {
            page: PageChrome::signed_in(None),
            event_id,
            form,
            statuses: EventStatus::ALL.iter().map(|s| s.as_str()).collect(),
            error,
        }
    }

    pub fn status_selected(&self, status: &str) -> bool {
        self.form.status.eq_ignore_ascii_case(status)
    }

    pub fn action(&self) -> String {
        match &self.event_id {
            Some(id) => format!("/admin/events/{}", id),
            None => "/admin/events".to_string(),
        }
    }
}

pub async fn new_event_page() -> Result<Response, AppError> {
    let form = EventForm {
        status: EventStatus::Upcoming.as_str().to_string(),
        registrations_open: Some("on".to_string()),
        min_team_size: Some("1".to_string()),
        max_team_size: Some("4".to_string()),
        details: Some("{}".to_string()),
        ..EventForm::default()
    };
    Ok(render(&EventFormTemplate::new(None, form, None))?.into_response())
}

pub async fn create_event_handler(
    State(pool): State<SqlitePool>,
    Form(form): Form<EventForm>,
) -> Result<Response, AppError> {
    match event_service::create_event(&pool, &form).await {
        Ok(id) => {
            info!("Created event {}", id);
            Ok(redirect_with_notice("/admin/events", "saved_ok"))
        }
        Err(AppError::Validation(msg)) => {
            Ok(render(&EventFormTemplate::new(None, form, Some(msg)))?.into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn edit_event_page(
    Path(event_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Result<Response, AppError> {
    let form = event_service::load_event_form(&pool, &event_id)
        .await?
        .ok_or(AppError::EventNotFound)?;
    Ok(render(&EventFormTemplate::new(Some(event_id), form, None))?.into_response())
}

pub async fn update_event_handler(
    Path(event_id): Path<String>,
    State(pool): State<SqlitePool>,
    Form(form): Form<EventForm>,
) -> Result<Response, AppError> {
    match event_service::update_event(&pool, &event_id, &form).await {
        Ok(()) => Ok(redirect_with_notice("/admin/events", "saved_ok")),
        Err(AppError::Validation(msg)) => {
            Ok(render(&EventFormTemplate::new(Some(event_id), form, Some(msg)))?.into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn delete_event_handler(
    Path(event_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    let notice = match event_service::delete_event(&pool, &event_id).await {
        Ok(()) => "deleted_ok",
        Err(e) => {
            warn!("Event delete failed for {}: {}", event_id, e);
            e.notice()
        }
    };
    redirect_with_notice("/admin/events", notice)
}

// ---------------------------------------------------------------------------
// Gallery
// ---------------------------------------------------------------------------

#[derive(Template)]
#[template(path = "admin/gallery.html")]
pub struct AdminGalleryTemplate {
    pub page: PageChrome,
    pub gallery: GalleryView,
}

pub async fn gallery_handler(
    Query(query): Query<NoticeQuery>,
    State(pool): State<SqlitePool>,
) -> Result<Response, AppError> {
    let gallery = gallery_service::load_gallery(&pool).await?;
    let template = AdminGalleryTemplate {
        page: PageChrome::signed_in(query.notice.as_deref()),
        gallery,
    };
    Ok(render(&template)?.into_response())
}

fn gallery_redirect(result: Result<(), AppError>, what: &str) -> Response {
    let notice = match result {
        Ok(()) => "saved_ok",
        Err(e) => {
            warn!("Gallery {} failed: {}", what, e);
            e.notice()
        }
    };
    redirect_with_notice("/admin/gallery", notice)
}

pub async fn create_section_handler(
    State(pool): State<SqlitePool>,
    Form(form): Form<SectionForm>,
) -> Response {
    let res = gallery_service::create_section(&pool, &form).await.map(|_| ());
    gallery_redirect(res, "section create")
}

pub async fn create_collection_handler(
    State(pool): State<SqlitePool>,
    Form(form): Form<CollectionForm>,
) -> Response {
    let res = gallery_service::create_collection(&pool, &form).await.map(|_| ());
    gallery_redirect(res, "collection create")
}

pub async fn create_image_handler(
    State(pool): State<SqlitePool>,
    Form(form): Form<ImageForm>,
) -> Response {
    let res = gallery_service::create_image(&pool, &form).await.map(|_| ());
    gallery_redirect(res, "image create")
}

pub async fn delete_section_handler(
    Path(id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    let res = gallery_service::delete_section(&pool, &id).await;
    deleted_redirect(res, "/admin/gallery", "section delete")
}

pub async fn delete_collection_handler(
    Path(id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    let res = gallery_service::delete_collection(&pool, &id).await;
    deleted_redirect(res, "/admin/gallery", "collection delete")
}

pub async fn delete_image_handler(
    Path(id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    let res = gallery_service::delete_image(&pool, &id).await;
    deleted_redirect(res, "/admin/gallery", "image delete")
}

fn deleted_redirect(result: Result<(), AppError>, target: &str, what: &str) -> Response {
    let notice = match result {
        Ok(()) => "deleted_ok",
        Err(e) => {
            warn!("Admin {} failed: {}", what, e);
            e.notice()
        }
    };
    redirect_with_notice(target, notice)
}

// ---------------------------------------------------------------------------
// Core team
// ---------------------------------------------------------------------------

#[derive(Template)]
#[template(path = "admin/team.html")]
pub struct AdminTeamTemplate {
    pub page: PageChrome,
    pub members: Vec<TeamMemberRow>,
}

pub async fn team_handler(
    Query(query): Query<NoticeQuery>,
    State(pool): State<SqlitePool>,
) -> Result<Response, AppError> {
    let members = team_members_service::list_members(&pool).await?;
    let template = AdminTeamTemplate {
        page: PageChrome::signed_in(query.notice.as_deref()),
        members,
    };
    Ok(render(&template)?.into_response())
}

pub async fn create_member_handler(
    State(pool): State<SqlitePool>,
    Form(form): Form<TeamMemberForm>,
) -> Response {
    let notice = match team_members_service::create_member(&pool, &form).await {
        Ok(_) => "saved_ok",
        Err(e) => {
            warn!("Team member create failed: {}", e);
            e.notice()
        }
    };
    redirect_with_notice("/admin/team", notice)
}

pub async fn update_member_handler(
    Path(id): Path<String>,
    State(pool): State<SqlitePool>,
    Form(form): Form<TeamMemberForm>,
) -> Response {
    let notice = match team_members_service::update_member(&pool, &id, &form).await {
        Ok(()) => "saved_ok",
        Err(e) => {
            warn!("Team member update failed for {}: {}", id, e);
            e.notice()
        }
    };
    redirect_with_notice("/admin/team", notice)
}

pub async fn delete_member_handler(
    Path(id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    let res = team_members_service::delete_member(&pool, &id).await;
    deleted_redirect(res, "/admin/team", "team member delete")
}

// ---------------------------------------------------------------------------
// Contact messages
// ---------------------------------------------------------------------------

#[derive(Template)]
#[template(path = "admin/messages.html")]
pub struct MessagesTemplate {
    pub page: PageChrome,
    pub messages: Vec<ContactMessageRow>,
}

pub async fn messages_handler(State(pool): State<SqlitePool>) -> Result<Response, AppError> {
    let messages = contact_service::list_messages(&pool).await?;
    let template = MessagesTemplate {
        page: PageChrome::signed_in(None),
        messages,
    };
    Ok(render(&template)?.into_response())
}
