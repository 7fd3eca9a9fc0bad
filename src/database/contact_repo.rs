use sqlx::SqlitePool;

use crate::models::ContactMessageRow;

pub struct NewContactMessage<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub subject: Option<&'a str>,
    pub message: &'a str,
}

const SQL_INSERT_CONTACT_MESSAGE: &str = r#"
INSERT INTO contact_messages (
  id,
  name,
  email,
  subject,
  message
) VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub async fn insert_contact_message(
    pool: &SqlitePool,
    msg: NewContactMessage<'_>,
) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_CONTACT_MESSAGE)
        .bind(msg.id)
        .bind(msg.name)
        .bind(msg.email)
        .bind(msg.subject)
        .bind(msg.message)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_contact_messages(
    pool: &SqlitePool,
    limit: i64,
) -> sqlx::Result<Vec<ContactMessageRow>> {
    sqlx::query_as::<_, ContactMessageRow>(
        r#"
SELECT id, name, email, subject, message, created_at
FROM contact_messages
ORDER BY created_at DESC
LIMIT ?1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
