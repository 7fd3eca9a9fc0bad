use sqlx::SqlitePool;

use crate::models::TeamMemberRow;

pub struct TeamMemberWrite<'a> {
    pub name: &'a str,
    pub position: &'a str,
    pub image_url: Option<&'a str>,
    pub linkedin_url: Option<&'a str>,
    pub display_order: i64,
}

pub async fn list_team_members(pool: &SqlitePool) -> sqlx::Result<Vec<TeamMemberRow>> {
    sqlx::query_as::<_, TeamMemberRow>(
        r#"
SELECT id, name, position, image_url, linkedin_url, display_order
FROM team_members
ORDER BY display_order ASC, name ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn insert_team_member(
    pool: &SqlitePool,
    id: &str,
    m: TeamMemberWrite<'_>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
INSERT INTO team_members (id, name, position, image_url, linkedin_url, display_order)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(id)
    .bind(m.name)
    .bind(m.position)
    .bind(m.image_url)
    .bind(m.linkedin_url)
    .bind(m.display_order)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_team_member(
    pool: &SqlitePool,
    id: &str,
    m: TeamMemberWrite<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(
        r#"
UPDATE team_members SET
  name = ?2,
  position = ?3,
  image_url = ?4,
  linkedin_url = ?5,
  display_order = ?6
WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(m.name)
    .bind(m.position)
    .bind(m.image_url)
    .bind(m.linkedin_url)
    .bind(m.display_order)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn delete_team_member(pool: &SqlitePool, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM team_members WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
