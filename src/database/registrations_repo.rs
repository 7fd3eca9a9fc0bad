use sqlx::{SqliteConnection, SqlitePool};

use crate::models::{ParticipantRow, RegistrationRow, UserRegistrationRow};

pub struct NewRegistration<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub event_id: &'a str,
    pub team_id: Option<&'a str>,
    pub role: &'a str, // leader|member|individual
}

const SQL_INSERT_REGISTRATION: &str = r#"
INSERT INTO registrations (
  id,
  user_id,
  event_id,
  team_id,
  role
) VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub async fn insert_registration(
    conn: &mut SqliteConnection,
    reg: NewRegistration<'_>,
) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_REGISTRATION)
        .bind(reg.id)
        .bind(reg.user_id)
        .bind(reg.event_id)
        .bind(reg.team_id)
        .bind(reg.role)
        .execute(conn)
        .await?;
    Ok(())
}

// Single statement so the capacity check and the insert cannot interleave
// with another join on the same team.
const SQL_INSERT_MEMBER_IF_CAPACITY: &str = r#"
INSERT INTO registrations (
  id,
  user_id,
  event_id,
  team_id,
  role
)
SELECT ?1, ?2, ?3, ?4, ?5
WHERE (SELECT COUNT(*) FROM registrations WHERE team_id = ?4) < ?6
"#;

/// Returns the number of inserted rows: 0 means the team was already full.
pub async fn insert_registration_if_capacity(
    conn: &mut SqliteConnection,
    reg: NewRegistration<'_>,
    max_team_size: i64,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_MEMBER_IF_CAPACITY)
        .bind(reg.id)
        .bind(reg.user_id)
        .bind(reg.event_id)
        .bind(reg.team_id)
        .bind(reg.role)
        .bind(max_team_size)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub async fn load_registration(
    pool: &SqlitePool,
    user_id: &str,
    event_id: &str,
) -> sqlx::Result<Option<RegistrationRow>> {
    sqlx::query_as::<_, RegistrationRow>(
        r#"
SELECT id, user_id, event_id, team_id, role, created_at
FROM registrations
WHERE user_id = ?1 AND event_id = ?2
LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_optional(pool)
    .await
}

pub async fn count_team_registrations(pool: &SqlitePool, team_id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM registrations WHERE team_id = ?1")
        .bind(team_id)
        .fetch_one(pool)
        .await
}

const SQL_PARTICIPANT_SELECT: &str = r#"
SELECT
  r.id AS registration_id,
  r.user_id,
  r.role,
  r.created_at AS registered_at,
  r.team_id,
  t.name AS team_name,
  p.full_name,
  p.email,
  p.phone,
  p.college,
  p.esummit_checked_in,
  p.esummit_day2_checked_in
FROM registrations r
LEFT JOIN teams t ON t.id = r.team_id
LEFT JOIN profiles p ON p.id = r.user_id
"#;

pub async fn list_participants(
    pool: &SqlitePool,
    event_id: &str,
) -> sqlx::Result<Vec<ParticipantRow>> {
    let sql = format!(
        "{SQL_PARTICIPANT_SELECT}
         WHERE r.event_id = ?1
         ORDER BY COALESCE(t.name, ''), CASE r.role WHEN 'leader' THEN 0 ELSE 1 END, r.created_at"
    );
    sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(event_id)
        .fetch_all(pool)
        .await
}

pub async fn load_participant(
    pool: &SqlitePool,
    registration_id: &str,
) -> sqlx::Result<Option<ParticipantRow>> {
    let sql = format!("{SQL_PARTICIPANT_SELECT} WHERE r.id = ?1 LIMIT 1");
    sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(registration_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_user_registrations(
    pool: &SqlitePool,
    user_id: &str,
) -> sqlx::Result<Vec<UserRegistrationRow>> {
    sqlx::query_as::<_, UserRegistrationRow>(
        r#"
SELECT
  e.id AS event_id,
  e.title,
  e.event_date,
  r.role,
  t.name AS team_name
FROM registrations r
JOIN events e ON e.id = r.event_id
LEFT JOIN teams t ON t.id = r.team_id
WHERE r.user_id = ?1
ORDER BY e.event_date ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Deletes a registration, returning the event it belonged to.
pub async fn delete_registration(
    pool: &SqlitePool,
    registration_id: &str,
) -> sqlx::Result<Option<String>> {
    sqlx::query_scalar::<_, String>("DELETE FROM registrations WHERE id = ?1 RETURNING event_id")
        .bind(registration_id)
        .fetch_optional(pool)
        .await
}

pub async fn count_registrations(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM registrations")
        .fetch_one(pool)
        .await
}
