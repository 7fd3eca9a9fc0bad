use sqlx::{SqliteConnection, SqlitePool};

use crate::models::{TeamMemberEntryRow, TeamRow};

pub struct NewTeam<'a> {
    pub id: &'a str,
    pub event_id: &'a str,
    pub name: &'a str,
    pub join_code: &'a str,
    pub leader_id: &'a str,
}

const SQL_INSERT_TEAM: &str = r#"
INSERT INTO teams (
  id,
  event_id,
  name,
  join_code,
  leader_id
) VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub async fn insert_team(conn: &mut SqliteConnection, team: NewTeam<'_>) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_TEAM)
        .bind(team.id)
        .bind(team.event_id)
        .bind(team.name)
        .bind(team.join_code)
        .bind(team.leader_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn find_team_by_code(
    pool: &SqlitePool,
    event_id: &str,
    join_code: &str,
) -> sqlx::Result<Option<TeamRow>> {
    sqlx::query_as::<_, TeamRow>(
        r#"
SELECT id, event_id, name, join_code, leader_id, created_at
FROM teams
WHERE event_id = ?1 AND join_code = ?2
LIMIT 1
        "#,
    )
    .bind(event_id)
    .bind(join_code)
    .fetch_optional(pool)
    .await
}

pub async fn load_team(pool: &SqlitePool, team_id: &str) -> sqlx::Result<Option<TeamRow>> {
    sqlx::query_as::<_, TeamRow>(
        r#"
SELECT id, event_id, name, join_code, leader_id, created_at
FROM teams
WHERE id = ?1
LIMIT 1
        "#,
    )
    .bind(team_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_team_members(
    pool: &SqlitePool,
    team_id: &str,
) -> sqlx::Result<Vec<TeamMemberEntryRow>> {
    sqlx::query_as::<_, TeamMemberEntryRow>(
        r#"
SELECT
  r.user_id,
  r.role,
  p.full_name,
  p.email
FROM registrations r
LEFT JOIN profiles p ON p.id = r.user_id
WHERE r.team_id = ?1
ORDER BY CASE r.role WHEN 'leader' THEN 0 ELSE 1 END, r.created_at ASC
        "#,
    )
    .bind(team_id)
    .fetch_all(pool)
    .await
}

pub async fn count_teams(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teams")
        .fetch_one(pool)
        .await
}
