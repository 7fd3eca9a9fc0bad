use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::database::{events_repo, gallery_repo, profiles_repo, registrations_repo, teams_repo};
use crate::error::AppError;
use crate::models::{CheckInDay, ParticipantRow};
use crate::services::event_service::{build_card, EventCardView};

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
    pub registration_id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub college: String,
    pub role: String,
    pub team_id: Option<String>,
    pub team_name: Option<String>,
    pub registered_at: String,
    pub day_one_checked_in: bool,
    pub day_two_checked_in: bool,
}

impl From<ParticipantRow> for ParticipantView {
    fn from(row: ParticipantRow) -> Self {
        Self {
            registration_id: row.registration_id,
            user_id: row.user_id,
            name: row.full_name.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            phone: row.phone.unwrap_or_default(),
            college: row.college.unwrap_or_default(),
            role: row.role,
            team_id: row.team_id,
            team_name: row.team_name,
            registered_at: row.registered_at,
            day_one_checked_in: row.esummit_checked_in.unwrap_or(0) != 0,
            day_two_checked_in: row.esummit_day2_checked_in.unwrap_or(0) != 0,
        }
    }
}

impl ParticipantView {
    pub fn team_label(&self) -> &str {
        self.team_name.as_deref().unwrap_or("-")
    }
}

pub struct ParticipantsPageView {
    pub event: EventCardView,
    pub participants: Vec<ParticipantView>,
    pub team_count: usize,
}

pub async fn list_participants(
    pool: &SqlitePool,
    event_id: &str,
) -> Result<Vec<ParticipantView>, AppError> {
    if events_repo::load_event(pool, event_id).await?.is_none() {
        return Err(AppError::EventNotFound);
    }
    Ok(registrations_repo::list_participants(pool, event_id)
        .await?
        .into_iter()
        .map(ParticipantView::from)
        .collect())
}

pub async fn load_participants_page(
    pool: &SqlitePool,
    event_id: &str,
) -> Result<ParticipantsPageView, AppError> {
    let event = events_repo::load_event(pool, event_id)
        .await?
        .ok_or(AppError::EventNotFound)?;
    let participants: Vec<ParticipantView> = registrations_repo::list_participants(pool, event_id)
        .await?
        .into_iter()
        .map(ParticipantView::from)
        .collect();

    let mut team_ids: Vec<&str> = participants
        .iter()
        .filter_map(|p| p.team_id.as_deref())
        .collect();
    team_ids.sort_unstable();
    team_ids.dedup();
    let team_count = team_ids.len();

    Ok(ParticipantsPageView {
        event: build_card(&event),
        participants,
        team_count,
    })
}

pub async fn load_participant(
    pool: &SqlitePool,
    registration_id: &str,
) -> sqlx::Result<Option<ParticipantView>> {
    Ok(registrations_repo::load_participant(pool, registration_id)
        .await?
        .map(ParticipantView::from))
}

/// Deletes one registration and returns the event it belonged to.
///
/// Removing a leader leaves the team and its other members in place.
pub async fn remove_registration(pool: &SqlitePool, registration_id: &str) -> Result<String, AppError> {
    let event_id = registrations_repo::delete_registration(pool, registration_id)
        .await?
        .ok_or(AppError::NotFound)?;
    info!("Removed registration {} from event {}", registration_id, event_id);
    Ok(event_id)
}

pub struct DashboardView {
    pub events: i64,
    pub registrations: i64,
    pub teams: i64,
    pub gallery_images: i64,
    pub day_one_checked_in: i64,
    pub day_two_checked_in: i64,
}

pub async fn load_dashboard(pool: &SqlitePool) -> sqlx::Result<DashboardView> {
    Ok(DashboardView {
        events: events_repo::count_events(pool).await?,
        registrations: registrations_repo::count_registrations(pool).await?,
        teams: teams_repo::count_teams(pool).await?,
        gallery_images: gallery_repo::count_images(pool).await?,
        day_one_checked_in: profiles_repo::count_checked_in(pool, CheckInDay::One).await?,
        day_two_checked_in: profiles_repo::count_checked_in(pool, CheckInDay::Two).await?,
    })
}
