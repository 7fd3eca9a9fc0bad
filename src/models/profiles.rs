use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub college: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: i64,
    pub esummit_checked_in: i64,
    pub esummit_checked_in_at: Option<String>,
    pub esummit_day2_checked_in: i64,
    pub esummit_day2_checked_in_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProfileRow {
    /// Names of the required fields that are still blank. Empty means complete.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(self.full_name.as_deref()) {
            missing.push("name");
        }
        if is_blank(self.phone.as_deref()) {
            missing.push("phone");
        }
        if !self.age.is_some_and(|a| a > 0) {
            missing.push("age");
        }
        if is_blank(self.gender.as_deref()) {
            missing.push("gender");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin == 1
    }

    pub fn checked_in(&self, day: CheckInDay) -> (bool, Option<&str>) {
        match day {
            CheckInDay::One => (
                self.esummit_checked_in == 1,
                self.esummit_checked_in_at.as_deref(),
            ),
            CheckInDay::Two => (
                self.esummit_day2_checked_in == 1,
                self.esummit_day2_checked_in_at.as_deref(),
            ),
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|s| s.trim().is_empty()).unwrap_or(true)
}

/// The two independent summit check-in flags on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckInDay {
    #[default]
    #[serde(rename = "1", alias = "one")]
    One,
    #[serde(rename = "2", alias = "two")]
    Two,
}

impl CheckInDay {
    pub fn label(&self) -> &'static str {
        match self {
            CheckInDay::One => "Day 1",
            CheckInDay::Two => "Day 2",
        }
    }
}
