use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::warn;

use crate::database::profiles_repo;
use crate::error::AppError;
use crate::services::checkin_service;
use crate::services::profile_service::{self, ProfileForm, ProfileView, GENDERS};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::routes::{redirect_with_notice, render, NoticeQuery, PageChrome};

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub page: PageChrome,
    pub profile: ProfileView,
    pub genders: [&'static str; 4],
    pub error: Option<String>,
}

async fn load_view(pool: &SqlitePool, user: &AuthenticatedUser) -> Result<ProfileView, AppError> {
    // Users created before their first login through this site have no row yet.
    profiles_repo::ensure_profile(pool, &user.id, user.email.as_deref()).await?;
    profile_service::load_profile_view(pool, &user.id)
        .await?
        .ok_or(AppError::ProfileNotFound)
}

pub async fn profile_page(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<NoticeQuery>,
    State(pool): State<SqlitePool>,
) -> Result<Response, AppError> {
    let profile = load_view(&pool, &auth_user).await?;
    let template = ProfileTemplate {
        page: PageChrome::signed_in(query.notice.as_deref()),
        profile,
        genders: GENDERS,
        error: None,
    };
    Ok(render(&template)?.into_response())
}

pub async fn profile_save_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    profiles_repo::ensure_profile(&pool, &auth_user.id, auth_user.email.as_deref()).await?;
    match profile_service::update_profile(&pool, &auth_user.id, &form).await {
        Ok(()) => Ok(redirect_with_notice("/profile", "profile_saved_ok")),
        Err(AppError::Validation(msg)) => {
            let profile = load_view(&pool, &auth_user).await?;
            let template = ProfileTemplate {
                page: PageChrome::signed_in(None),
                profile,
                genders: GENDERS,
                error: Some(msg),
            };
            Ok(render(&template)?.into_response())
        }
        Err(e) => {
            warn!("Profile save failed for {}: {}", auth_user.id, e);
            Ok(redirect_with_notice("/profile", e.notice()))
        }
    }
}

/// The string the attendee's QR code encodes; the page renders it client-side.
pub async fn profile_qr_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Response {
    Json(json!({
        "userId": auth_user.id,
        "payload": checkin_service::qr_payload(&auth_user.id),
    }))
    .into_response()
}
