use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub event_date: String,
    pub event_time: Option<String>,
    pub venue: Option<String>,
    pub category: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    pub featured: i64,
    pub is_team_event: i64,
    pub is_esummit: i64,
    pub registrations_open: i64,
    pub min_team_size: i64,
    pub max_team_size: i64,
    pub details: String,
    pub created_at: String,
    pub updated_at: String,
}

impl EventRow {
    pub fn is_team_event(&self) -> bool {
        self.is_team_event == 1
    }

    pub fn registrations_open(&self) -> bool {
        self.registrations_open == 1
    }

    /// Lenient parse of the free-form `details` blob; malformed JSON yields empty details.
    pub fn parsed_details(&self) -> EventDetails {
        serde_json::from_str(&self.details).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Past,
}

impl EventStatus {
    pub const ALL: [EventStatus; 3] = [EventStatus::Upcoming, EventStatus::Ongoing, EventStatus::Past];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Past => "past",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "upcoming" => Some(EventStatus::Upcoming),
            "ongoing" => Some(EventStatus::Ongoing),
            "past" => Some(EventStatus::Past),
            _ => None,
        }
    }
}

// Shape of the `details` column. Every list is optional in stored data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDetails {
    pub agenda: Vec<AgendaItem>,
    pub speakers: Vec<Speaker>,
    pub gallery: Vec<String>,
    pub faq: Vec<FaqItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaItem {
    pub time: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Speaker {
    pub name: String,
    pub designation: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}
