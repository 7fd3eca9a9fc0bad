use serde::Serialize;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationRow {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub team_id: Option<String>,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationRole {
    Leader,
    Member,
    Individual,
}

impl RegistrationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationRole::Leader => "leader",
            RegistrationRole::Member => "member",
            RegistrationRole::Individual => "individual",
        }
    }
}

// Admin participant list: registration joined with profile and team.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantRow {
    pub registration_id: String,
    pub user_id: String,
    pub role: String,
    pub registered_at: String,
    pub team_id: Option<String>,
    pub team_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub college: Option<String>,
    pub esummit_checked_in: Option<i64>,
    pub esummit_day2_checked_in: Option<i64>,
}

// A user's own registrations, for the profile page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRegistrationRow {
    pub event_id: String,
    pub title: String,
    pub event_date: String,
    pub role: String,
    pub team_name: Option<String>,
}
