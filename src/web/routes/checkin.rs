use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::CheckInDay;
use crate::services::checkin_service::{self, ScanOutcome};
use crate::services::participant_feed::{ParticipantChange, ParticipantFeed};
use crate::web::routes::{render, PageChrome};

#[derive(Template)]
#[template(path = "admin/checkin.html")]
pub struct CheckinTemplate {
    pub page: PageChrome,
}

pub async fn checkin_page() -> Result<Response, AppError> {
    let template = CheckinTemplate {
        page: PageChrome::signed_in(None),
    };
    Ok(render(&template)?.into_response())
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub code: String,
    #[serde(default)]
    pub day: CheckInDay,
}

pub async fn scan_handler(
    State(pool): State<SqlitePool>,
    State(feed): State<ParticipantFeed>,
    Json(req): Json<ScanRequest>,
) -> Response {
    let outcome = match checkin_service::scan(&pool, &req.code, req.day).await {
        Ok(o) => o,
        Err(e) => {
            warn!("Check-in scan failed: {}", e);
            return AppError::Database(e).into_response();
        }
    };

    if let ScanOutcome::CheckedIn { attendee, day } = &outcome {
        feed.publish(ParticipantChange::CheckedIn {
            user_id: attendee.user_id.clone(),
            day: *day,
        });
    } else {
        info!("Scan rejected: {}", outcome.message());
    }

    let status = match outcome {
        ScanOutcome::CheckedIn { .. } => StatusCode::OK,
        ScanOutcome::AlreadyCheckedIn { .. } => StatusCode::CONFLICT,
        ScanOutcome::IncompleteProfile { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ScanOutcome::NotFound { .. } => StatusCode::NOT_FOUND,
        ScanOutcome::InvalidCode => StatusCode::BAD_REQUEST,
    };
    let body = json!({
        "success": outcome.is_success(),
        "message": outcome.message(),
        "outcome": outcome,
    });
    (status, Json(body)).into_response()
}
