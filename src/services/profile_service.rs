use serde::Deserialize;
use sqlx::SqlitePool;

use crate::database::{profiles_repo, registrations_repo};
use crate::error::AppError;
use crate::models::CheckInDay;
use crate::services::checkin_service;
use crate::services::event_service::{format_date_label, non_blank};

pub const GENDERS: [&str; 4] = ["male", "female", "non_binary", "prefer_not_to_say"];

pub struct MyRegistrationView {
    pub event_id: String,
    pub title: String,
    pub date_label: String,
    pub role: String,
    pub team_name: Option<String>,
}

pub struct ProfileView {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub age: Option<i64>,
    pub gender: String,
    pub college: String,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub missing_fields: Vec<&'static str>,
    pub day_one_checked_in: bool,
    pub day_two_checked_in: bool,
    pub qr_payload: String,
    pub registrations: Vec<MyRegistrationView>,
}

impl ProfileView {
    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty()
    }

    pub fn missing_label(&self) -> String {
        self.missing_fields.join(", ")
    }

    pub fn gender_is(&self, gender: &str) -> bool {
        self.gender == gender
    }

    pub fn age_value(&self) -> String {
        self.age.map(|a| a.to_string()).unwrap_or_default()
    }
}

pub async fn load_profile_view(
    pool: &SqlitePool,
    user_id: &str,
) -> sqlx::Result<Option<ProfileView>> {
    let Some(row) = profiles_repo::load_profile(pool, user_id).await? else {
        return Ok(None);
    };
    let registrations = registrations_repo::list_user_registrations(pool, user_id)
        .await?
        .into_iter()
        .map(|r| MyRegistrationView {
            date_label: format_date_label(&r.event_date),
            event_id: r.event_id,
            title: r.title,
            role: r.role,
            team_name: r.team_name,
        })
        .collect();

    Ok(Some(ProfileView {
        missing_fields: row.missing_fields(),
        day_one_checked_in: row.checked_in(CheckInDay::One).0,
        day_two_checked_in: row.checked_in(CheckInDay::Two).0,
        is_admin: row.is_admin(),
        qr_payload: checkin_service::qr_payload(&row.id),
        user_id: row.id,
        email: row.email.unwrap_or_default(),
        full_name: row.full_name.unwrap_or_default(),
        phone: row.phone.unwrap_or_default(),
        age: row.age,
        gender: row.gender.unwrap_or_default(),
        college: row.college.unwrap_or_default(),
        avatar_url: row.avatar_url,
        registrations,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub full_name: String,
    pub phone: String,
    pub age: String,
    pub gender: String,
    pub college: Option<String>,
    pub avatar_url: Option<String>,
}

pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    form: &ProfileForm,
) -> Result<(), AppError> {
    let full_name = non_blank(Some(&form.full_name))
        .ok_or_else(|| AppError::Validation("Name is required".into()))?;

    let phone = normalize_phone(&form.phone)
        .ok_or_else(|| AppError::Validation("Enter a valid phone number".into()))?;

    let age: i64 = form
        .age
        .trim()
        .parse()
        .map_err(|_| AppError::Validation("Age must be a number".into()))?;
    if !(10..=100).contains(&age) {
        return Err(AppError::Validation("Age must be between 10 and 100".into()));
    }

    let gender = form.gender.trim().to_lowercase();
    if !GENDERS.contains(&gender.as_str()) {
        return Err(AppError::Validation("Please select a gender".into()));
    }

    let college = non_blank(form.college.as_deref());
    let avatar_url = non_blank(form.avatar_url.as_deref());

    let updated = profiles_repo::update_profile(
        pool,
        user_id,
        profiles_repo::ProfileUpdate {
            full_name: &full_name,
            phone: &phone,
            age,
            gender: &gender,
            college: college.as_deref(),
            avatar_url: avatar_url.as_deref(),
        },
    )
    .await?;
    if updated == 0 {
        return Err(AppError::ProfileNotFound);
    }
    Ok(())
}

/// Keeps digits and a leading '+'; 7 to 15 digits.
fn normalize_phone(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let plus = raw.starts_with('+');
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let allowed = raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    if !allowed || !(7..=15).contains(&digits.len()) {
        return None;
    }
    Some(if plus { format!("+{}", digits) } else { digits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    fn form() -> ProfileForm {
        ProfileForm {
            full_name: "Asha Rao".into(),
            phone: "+91 98765-43210".into(),
            age: "20".into(),
            gender: "Female".into(),
            college: Some("  ".into()),
            avatar_url: None,
        }
    }

    #[test]
    fn phone_numbers_are_normalized() {
        assert_eq!(normalize_phone("+91 98765-43210").as_deref(), Some("+919876543210"));
        assert_eq!(normalize_phone("(040) 2345678").as_deref(), Some("0402345678"));
        assert!(normalize_phone("12345").is_none());
        assert!(normalize_phone("call me").is_none());
    }

    #[tokio::test]
    async fn saving_a_valid_form_completes_the_profile() {
        let pool = database::connect_in_memory().await.unwrap();
        profiles_repo::ensure_profile(&pool, "u1", Some("asha@example.com"))
            .await
            .unwrap();

        let before = load_profile_view(&pool, "u1").await.unwrap().unwrap();
        assert!(!before.is_complete());

        update_profile(&pool, "u1", &form()).await.unwrap();
        let after = load_profile_view(&pool, "u1").await.unwrap().unwrap();
        assert!(after.is_complete());
        assert_eq!(after.gender, "female");
        assert_eq!(after.phone, "+919876543210");
        assert_eq!(after.college, "");
        assert_eq!(after.qr_payload, r#"{"userId":"u1"}"#);
    }

    #[tokio::test]
    async fn invalid_fields_are_rejected() {
        let pool = database::connect_in_memory().await.unwrap();
        profiles_repo::ensure_profile(&pool, "u1", None).await.unwrap();

        let mut f = form();
        f.age = "7".into();
        assert!(matches!(
            update_profile(&pool, "u1", &f).await,
            Err(AppError::Validation(_))
        ));

        let mut f = form();
        f.gender = "robot".into();
        assert!(update_profile(&pool, "u1", &f).await.is_err());

        assert!(matches!(
            update_profile(&pool, "nobody", &form()).await,
            Err(AppError::ProfileNotFound)
        ));
    }
}
