use sqlx::SqlitePool;

use crate::models::EventRow;

const EVENT_COLUMNS: &str = r#"
  id,
  title,
  description,
  event_date,
  event_time,
  venue,
  category,
  status,
  image_url,
  featured,
  is_team_event,
  is_esummit,
  registrations_open,
  min_team_size,
  max_team_size,
  details,
  created_at,
  updated_at
"#;

/// Validated column values for an insert or update.
#[derive(Debug, Clone)]
pub struct EventWrite {
    pub title: String,
    pub description: Option<String>,
    pub event_date: String,
    pub event_time: Option<String>,
    pub venue: Option<String>,
    pub category: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    pub featured: bool,
    pub is_team_event: bool,
    pub is_esummit: bool,
    pub registrations_open: bool,
    pub min_team_size: i64,
    pub max_team_size: i64,
    pub details: String,
}

pub async fn list_events(pool: &SqlitePool, category: Option<&str>) -> sqlx::Result<Vec<EventRow>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events
         WHERE (?1 IS NULL OR lower(category) = lower(?1))
         ORDER BY event_date ASC, COALESCE(event_time, '') ASC"
    );
    sqlx::query_as::<_, EventRow>(&sql)
        .bind(category)
        .fetch_all(pool)
        .await
}

pub async fn list_featured(pool: &SqlitePool, limit: i64) -> sqlx::Result<Vec<EventRow>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events
         WHERE featured = 1 AND status != 'past'
         ORDER BY event_date ASC
         LIMIT ?1"
    );
    sqlx::query_as::<_, EventRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn list_esummit_events(pool: &SqlitePool) -> sqlx::Result<Vec<EventRow>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events
         WHERE is_esummit = 1
         ORDER BY event_date ASC, COALESCE(event_time, '') ASC"
    );
    sqlx::query_as::<_, EventRow>(&sql).fetch_all(pool).await
}

pub async fn list_categories(pool: &SqlitePool) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
SELECT DISTINCT category
FROM events
WHERE category IS NOT NULL AND TRIM(category) != ''
ORDER BY category ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn load_event(pool: &SqlitePool, event_id: &str) -> sqlx::Result<Option<EventRow>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1 LIMIT 1");
    sqlx::query_as::<_, EventRow>(&sql)
        .bind(event_id)
        .fetch_optional(pool)
        .await
}

const SQL_INSERT_EVENT: &str = r#"
INSERT INTO events (
  id,
  title,
  description,
  event_date,
  event_time,
  venue,
  category,
  status,
  image_url,
  featured,
  is_team_event,
  is_esummit,
  registrations_open,
  min_team_size,
  max_team_size,
  details
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
"#;

pub async fn insert_event(pool: &SqlitePool, id: &str, event: &EventWrite) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_EVENT)
        .bind(id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.event_date)
        .bind(&event.event_time)
        .bind(&event.venue)
        .bind(&event.category)
        .bind(&event.status)
        .bind(&event.image_url)
        .bind(event.featured)
        .bind(event.is_team_event)
        .bind(event.is_esummit)
        .bind(event.registrations_open)
        .bind(event.min_team_size)
        .bind(event.max_team_size)
        .bind(&event.details)
        .execute(pool)
        .await?;
    Ok(())
}

const SQL_UPDATE_EVENT: &str = r#"
UPDATE events SET
  title = ?2,
  description = ?3,
  event_date = ?4,
  event_time = ?5,
  venue = ?6,
  category = ?7,
  status = ?8,
  image_url = ?9,
  featured = ?10,
  is_team_event = ?11,
  is_esummit = ?12,
  registrations_open = ?13,
  min_team_size = ?14,
  max_team_size = ?15,
  details = ?16,
  updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
WHERE id = ?1
"#;

pub async fn update_event(pool: &SqlitePool, id: &str, event: &EventWrite) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_EVENT)
        .bind(id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.event_date)
        .bind(&event.event_time)
        .bind(&event.venue)
        .bind(&event.category)
        .bind(&event.status)
        .bind(&event.image_url)
        .bind(event.featured)
        .bind(event.is_team_event)
        .bind(event.is_esummit)
        .bind(event.registrations_open)
        .bind(event.min_team_size)
        .bind(event.max_team_size)
        .bind(&event.details)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_event(pool: &SqlitePool, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM events WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_events(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events")
        .fetch_one(pool)
        .await
}
