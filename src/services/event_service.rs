use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::events_repo::{self, EventWrite};
use crate::error::AppError;
use crate::models::{EventDetails, EventRow, EventStatus};

#[derive(Debug, Clone)]
pub struct EventCardView {
    pub id: String,
    pub title: String,
    pub date_label: String,
    pub time_label: String,
    pub venue: Option<String>,
    pub category: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    pub featured: bool,
    pub is_team_event: bool,
    pub is_esummit: bool,
    pub registrations_open: bool,
    pub team_size_label: Option<String>,
}

pub struct EventDetailView {
    pub card: EventCardView,
    pub description: Option<String>,
    pub details: EventDetails,
    pub min_team_size: i64,
    pub max_team_size: i64,
}

pub struct EventsPageView {
    pub upcoming: Vec<EventCardView>,
    pub ongoing: Vec<EventCardView>,
    pub past: Vec<EventCardView>,
    pub categories: Vec<String>,
    pub selected_category: Option<String>,
}

impl EventsPageView {
    pub fn is_selected(&self, category: &str) -> bool {
        self.selected_category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(category))
    }
}

pub struct HomeView {
    pub featured: Vec<EventCardView>,
    pub upcoming: Vec<EventCardView>,
}

pub async fn load_home_view(pool: &SqlitePool) -> sqlx::Result<HomeView> {
    let featured = events_repo::list_featured(pool, 3).await?;
    let upcoming = events_repo::list_events(pool, None)
        .await?
        .into_iter()
        .filter(|e| e.status == EventStatus::Upcoming.as_str())
        .take(6)
        .map(|e| build_card(&e))
        .collect();
    Ok(HomeView {
        featured: featured.iter().map(build_card).collect(),
        upcoming,
    })
}

pub async fn load_events_page(
    pool: &SqlitePool,
    category: Option<String>,
) -> sqlx::Result<EventsPageView> {
    let category = category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let rows = events_repo::list_events(pool, category.as_deref()).await?;
    let categories = events_repo::list_categories(pool).await?;

    let mut view = EventsPageView {
        upcoming: Vec::new(),
        ongoing: Vec::new(),
        past: Vec::new(),
        categories,
        selected_category: category,
    };
    for row in &rows {
        let card = build_card(row);
        match EventStatus::parse(&row.status) {
            Some(EventStatus::Ongoing) => view.ongoing.push(card),
            Some(EventStatus::Past) => view.past.push(card),
            _ => view.upcoming.push(card),
        }
    }
    // Most recent first for the archive.
    view.past.reverse();
    Ok(view)
}

pub async fn load_esummit_events(pool: &SqlitePool) -> sqlx::Result<Vec<EventCardView>> {
    let rows = events_repo::list_esummit_events(pool).await?;
    Ok(rows.iter().map(build_card).collect())
}

pub async fn load_event_detail(
    pool: &SqlitePool,
    event_id: &str,
) -> sqlx::Result<Option<EventDetailView>> {
    let Some(row) = events_repo::load_event(pool, event_id).await? else {
        return Ok(None);
    };
    Ok(Some(EventDetailView {
        card: build_card(&row),
        description: row.description.clone(),
        details: row.parsed_details(),
        min_team_size: row.min_team_size,
        max_team_size: row.max_team_size,
    }))
}

pub async fn list_all_events(pool: &SqlitePool) -> sqlx::Result<Vec<EventCardView>> {
    let rows = events_repo::list_events(pool, None).await?;
    Ok(rows.iter().map(build_card).collect())
}

pub fn build_card(row: &EventRow) -> EventCardView {
    let team_size_label = if row.is_team_event() {
        if row.min_team_size == row.max_team_size {
            Some(format!("Teams of {}", row.max_team_size))
        } else {
            Some(format!(
                "Teams of {}-{}",
                row.min_team_size, row.max_team_size
            ))
        }
    } else {
        None
    };

    EventCardView {
        id: row.id.clone(),
        title: row.title.clone(),
        date_label: format_date_label(&row.event_date),
        time_label: row.event_time.clone().unwrap_or_default(),
        venue: row.venue.clone().filter(|v| !v.trim().is_empty()),
        category: row.category.clone().filter(|v| !v.trim().is_empty()),
        status: row.status.clone(),
        image_url: row.image_url.clone().filter(|v| !v.trim().is_empty()),
        featured: row.featured == 1,
        is_team_event: row.is_team_event(),
        is_esummit: row.is_esummit == 1,
        registrations_open: row.registrations_open(),
        team_size_label,
    }
}

// ---------------------------------------------------------------------------
// Admin CRUD
// ---------------------------------------------------------------------------

/// Raw admin form. HTML checkboxes are absent when unticked.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EventForm {
    pub title: String,
    pub description: Option<String>,
    pub event_date: String,
    pub event_time: Option<String>,
    pub venue: Option<String>,
    pub category: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    pub featured: Option<String>,
    pub is_team_event: Option<String>,
    pub is_esummit: Option<String>,
    pub registrations_open: Option<String>,
    pub min_team_size: Option<String>,
    pub max_team_size: Option<String>,
    pub details: Option<String>,
}

impl EventForm {
    pub fn from_row(row: &EventRow) -> Self {
        let flag = |v: i64| (v == 1).then(|| "on".to_string());
        Self {
            title: row.title.clone(),
            description: row.description.clone(),
            event_date: row.event_date.clone(),
            event_time: row.event_time.clone(),
            venue: row.venue.clone(),
            category: row.category.clone(),
            status: row.status.clone(),
            image_url: row.image_url.clone(),
            featured: flag(row.featured),
            is_team_event: flag(row.is_team_event),
            is_esummit: flag(row.is_esummit),
            registrations_open: flag(row.registrations_open),
            min_team_size: Some(row.min_team_size.to_string()),
            max_team_size: Some(row.max_team_size.to_string()),
            details: Some(row.details.clone()),
        }
    }
}

pub fn validate_event_form(form: &EventForm) -> Result<EventWrite, AppError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }

    let event_date = form.event_date.trim();
    if parse_ymd(event_date).is_none() {
        return Err(AppError::Validation("Date must be YYYY-MM-DD".into()));
    }

    let event_time = non_blank(form.event_time.as_deref());
    if let Some(t) = event_time.as_deref() {
        if !is_valid_hhmm(t) {
            return Err(AppError::Validation("Time must be HH:MM".into()));
        }
    }

    let status = EventStatus::parse(&form.status).ok_or_else(|| {
        AppError::Validation("Status must be upcoming, ongoing or past".into())
    })?;

    let is_team_event = form.is_team_event.is_some();
    let (min_team_size, max_team_size) = if is_team_event {
        let min = parse_size(form.min_team_size.as_deref(), 1)?;
        let max = parse_size(form.max_team_size.as_deref(), 4)?;
        if min < 1 || max < min {
            return Err(AppError::Validation(
                "Team size must satisfy 1 <= min <= max".into(),
            ));
        }
        (min, max)
    } else {
        (1, 1)
    };

    let details = match non_blank(form.details.as_deref()) {
        None => "{}".to_string(),
        Some(raw) => {
            let value: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|e| AppError::Validation(format!("Details are not valid JSON: {}", e)))?;
            if !value.is_object() {
                return Err(AppError::Validation(
                    "Details must be a JSON object".into(),
                ));
            }
            raw
        }
    };

    Ok(EventWrite {
        title: title.to_string(),
        description: non_blank(form.description.as_deref()),
        event_date: event_date.to_string(),
        event_time,
        venue: non_blank(form.venue.as_deref()),
        category: non_blank(form.category.as_deref()),
        status: status.as_str().to_string(),
        image_url: non_blank(form.image_url.as_deref()),
        featured: form.featured.is_some(),
        is_team_event,
        is_esummit: form.is_esummit.is_some(),
        registrations_open: form.registrations_open.is_some(),
        min_team_size,
        max_team_size,
        details,
    })
}

/// Current values of an event, for the admin edit form.
pub async fn load_event_form(pool: &SqlitePool, id: &str) -> sqlx::Result<Option<EventForm>> {
    Ok(events_repo::load_event(pool, id)
        .await?
        .map(|row| EventForm::from_row(&row)))
}

pub async fn create_event(pool: &SqlitePool, form: &EventForm) -> Result<String, AppError> {
    let write = validate_event_form(form)?;
    let id = Uuid::new_v4().to_string();
    events_repo::insert_event(pool, &id, &write).await?;
    Ok(id)
}

pub async fn update_event(pool: &SqlitePool, id: &str, form: &EventForm) -> Result<(), AppError> {
    let write = validate_event_form(form)?;
    if events_repo::update_event(pool, id, &write).await? == 0 {
        return Err(AppError::EventNotFound);
    }
    Ok(())
}

pub async fn delete_event(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    if events_repo::delete_event(pool, id).await? == 0 {
        return Err(AppError::EventNotFound);
    }
    Ok(())
}

fn parse_size(raw: Option<&str>, default: i64) -> Result<i64, AppError> {
    match non_blank(raw) {
        None => Ok(default),
        Some(v) => v
            .parse::<i64>()
            .map_err(|_| AppError::Validation("Team size must be a number".into())),
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn is_valid_hhmm(value: &str) -> bool {
    let Some((h, m)) = value.split_once(':') else {
        return false;
    };
    let (Ok(h), Ok(m)) = (h.parse::<u32>(), m.parse::<u32>()) else {
        return false;
    };
    h < 24 && m < 60
}

/// "2026-02-14" -> "Sat, 14 Feb 2026". Unparseable input is returned as-is.
pub fn format_date_label(date: &str) -> String {
    let date = date.get(0..10).unwrap_or(date);
    let Some((y, m, d)) = parse_ymd(date) else {
        return date.to_string();
    };

    let wd_name = match weekday_sun0(y, m, d) {
        0 => "Sun",
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        _ => "",
    };

    let month = match m {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "",
    };

    format!("{}, {} {} {}", wd_name, d, month, y)
}

fn parse_ymd(date: &str) -> Option<(i32, i32, i32)> {
    let mut parts = date.split('-');
    let y: i32 = parts.next()?.parse().ok()?;
    let m: i32 = parts.next()?.parse().ok()?;
    let d: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !(1..=12).contains(&m) {
        return None;
    }
    if !(1..=days_in_month(y, m)).contains(&d) {
        return None;
    }
    Some((y, m, d))
}

fn days_in_month(y: i32, m: i32) -> i32 {
    match m {
        2 if (y % 4 == 0 && y % 100 != 0) || y % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn weekday_sun0(y: i32, m: i32, d: i32) -> i32 {
    let t = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
    let mut year = y;
    if m < 3 {
        year -= 1;
    }
    (year + year / 4 - year / 100 + year / 400 + t[(m - 1) as usize] + d) % 7
}
