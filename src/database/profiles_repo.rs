use sqlx::SqlitePool;

use crate::models::{CheckInDay, ProfileRow};

pub const SQL_LOAD_PROFILE: &str = r#"
SELECT
  id,
  email,
  full_name,
  phone,
  age,
  gender,
  college,
  avatar_url,
  is_admin,
  esummit_checked_in,
  esummit_checked_in_at,
  esummit_day2_checked_in,
  esummit_day2_checked_in_at,
  created_at,
  updated_at
FROM profiles
WHERE id = ?1
LIMIT 1
"#;

pub async fn load_profile(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<ProfileRow>> {
    sqlx::query_as::<_, ProfileRow>(SQL_LOAD_PROFILE)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Creates an empty profile for a freshly authenticated user. Existing rows are left alone.
pub async fn ensure_profile(
    pool: &SqlitePool,
    user_id: &str,
    email: Option<&str>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
INSERT INTO profiles (id, email)
VALUES (?1, ?2)
ON CONFLICT (id) DO UPDATE SET email = COALESCE(profiles.email, excluded.email)
        "#,
    )
    .bind(user_id)
    .bind(email)
    .execute(pool)
    .await?;
    Ok(())
}

pub struct ProfileUpdate<'a> {
    pub full_name: &'a str,
    pub phone: &'a str,
    pub age: i64,
    pub gender: &'a str,
    pub college: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    update: ProfileUpdate<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(
        r#"
UPDATE profiles SET
  full_name = ?2,
  phone = ?3,
  age = ?4,
  gender = ?5,
  college = ?6,
  avatar_url = COALESCE(?7, avatar_url),
  updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
WHERE id = ?1
        "#,
    )
    .bind(user_id)
    .bind(update.full_name)
    .bind(update.phone)
    .bind(update.age)
    .bind(update.gender)
    .bind(update.college)
    .bind(update.avatar_url)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn set_admin(pool: &SqlitePool, user_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query("UPDATE profiles SET is_admin = 1 WHERE id = ?1 AND is_admin = 0")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_CHECK_IN_DAY_ONE: &str = r#"
UPDATE profiles SET
  esummit_checked_in = 1,
  esummit_checked_in_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
WHERE id = ?1 AND esummit_checked_in = 0
"#;

const SQL_CHECK_IN_DAY_TWO: &str = r#"
UPDATE profiles SET
  esummit_day2_checked_in = 1,
  esummit_day2_checked_in_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
WHERE id = ?1 AND esummit_day2_checked_in = 0
"#;

/// Flips the check-in flag only while it is still unset. 0 rows means someone got there first.
pub async fn mark_checked_in(pool: &SqlitePool, user_id: &str, day: CheckInDay) -> sqlx::Result<u64> {
    let sql = match day {
        CheckInDay::One => SQL_CHECK_IN_DAY_ONE,
        CheckInDay::Two => SQL_CHECK_IN_DAY_TWO,
    };
    let res = sqlx::query(sql).bind(user_id).execute(pool).await?;
    Ok(res.rows_affected())
}

pub async fn count_checked_in(pool: &SqlitePool, day: CheckInDay) -> sqlx::Result<i64> {
    let sql = match day {
        CheckInDay::One => "SELECT COUNT(*) FROM profiles WHERE esummit_checked_in = 1",
        CheckInDay::Two => "SELECT COUNT(*) FROM profiles WHERE esummit_day2_checked_in = 1",
    };
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await
}
