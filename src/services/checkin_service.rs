use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::profiles_repo;
use crate::models::{CheckInDay, ProfileRow};

#[derive(Debug, Clone, Serialize)]
pub struct AttendeeView {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub college: Option<String>,
}

impl From<&ProfileRow> for AttendeeView {
    fn from(p: &ProfileRow) -> Self {
        Self {
            user_id: p.id.clone(),
            name: p
                .full_name
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "Unnamed attendee".to_string()),
            email: p.email.clone(),
            phone: p.phone.clone(),
            college: p.college.clone(),
        }
    }
}

/// Result of one scan. Only `CheckedIn` mutates the profile.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    CheckedIn {
        attendee: AttendeeView,
        day: CheckInDay,
    },
    AlreadyCheckedIn {
        attendee: AttendeeView,
        day: CheckInDay,
        checked_in_at: Option<String>,
    },
    IncompleteProfile {
        attendee: AttendeeView,
        missing: Vec<&'static str>,
    },
    NotFound {
        user_id: String,
    },
    InvalidCode,
}

impl ScanOutcome {
    pub fn message(&self) -> String {
        match self {
            ScanOutcome::CheckedIn { attendee, day } => {
                format!("{} checked in for {}", attendee.name, day.label())
            }
            ScanOutcome::AlreadyCheckedIn {
                attendee,
                day,
                checked_in_at,
            } => match checked_in_at {
                Some(at) => format!(
                    "{} is already checked in for {} (at {})",
                    attendee.name,
                    day.label(),
                    at
                ),
                None => format!("{} is already checked in for {}", attendee.name, day.label()),
            },
            ScanOutcome::IncompleteProfile { attendee, missing } => format!(
                "{} must complete their profile first (missing: {})",
                attendee.name,
                missing.join(", ")
            ),
            ScanOutcome::NotFound { .. } => "No attendee found for this QR code".to_string(),
            ScanOutcome::InvalidCode => "Not a valid attendee QR code".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScanOutcome::CheckedIn { .. })
    }
}

#[derive(Deserialize)]
struct QrPayload {
    #[serde(rename = "userId")]
    user_id: String,
}

/// Payload embedded in an attendee's QR code.
pub fn qr_payload(user_id: &str) -> String {
    serde_json::json!({ "userId": user_id }).to_string()
}

/// Extracts the user id from a scanned string: either `{"userId": "..."}` or a bare uuid.
pub fn parse_scanned_code(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let candidate = if raw.starts_with('{') {
        serde_json::from_str::<QrPayload>(raw).ok()?.user_id
    } else {
        raw.to_string()
    };
    let candidate = candidate.trim();
    if !is_hyphenated_uuid(candidate) {
        return None;
    }
    Some(candidate.to_lowercase())
}

// 8-4-4-4-12 hex digits. `Uuid::parse_str` alone also takes braced/urn/simple forms.
fn is_hyphenated_uuid(value: &str) -> bool {
    if value.len() != 36 {
        return false;
    }
    let hyphens_ok = value
        .char_indices()
        .all(|(i, c)| matches!(i, 8 | 13 | 18 | 23) == (c == '-'));
    hyphens_ok && Uuid::parse_str(value).is_ok()
}

pub async fn scan(pool: &SqlitePool, raw: &str, day: CheckInDay) -> sqlx::Result<ScanOutcome> {
    let Some(user_id) = parse_scanned_code(raw) else {
        return Ok(ScanOutcome::InvalidCode);
    };

    let Some(profile) = profiles_repo::load_profile(pool, &user_id).await? else {
        return Ok(ScanOutcome::NotFound { user_id });
    };
    let attendee = AttendeeView::from(&profile);

    let missing = profile.missing_fields();
    if !missing.is_empty() {
        return Ok(ScanOutcome::IncompleteProfile { attendee, missing });
    }

    let (already, at) = profile.checked_in(day);
    if already {
        return Ok(ScanOutcome::AlreadyCheckedIn {
            attendee,
            day,
            checked_in_at: at.map(|s| s.to_string()),
        });
    }

    if profiles_repo::mark_checked_in(pool, &user_id, day).await? == 0 {
        // A parallel scan flipped the flag after our read.
        let checked_in_at = profiles_repo::load_profile(pool, &user_id)
            .await?
            .and_then(|p| p.checked_in(day).1.map(|s| s.to_string()));
        return Ok(ScanOutcome::AlreadyCheckedIn {
            attendee,
            day,
            checked_in_at,
        });
    }

    info!("Checked in {} for {}", user_id, day.label());
    Ok(ScanOutcome::CheckedIn { attendee, day })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use crate::database::profiles_repo::ProfileUpdate;

    async fn seed_profile(pool: &SqlitePool, complete: bool) -> String {
        let id = Uuid::new_v4().to_string();
        profiles_repo::ensure_profile(pool, &id, Some("guest@example.com"))
            .await
            .unwrap();
        if complete {
            profiles_repo::update_profile(
                pool,
                &id,
                ProfileUpdate {
                    full_name: "Guest",
                    phone: "12345",
                    age: 21,
                    gender: "male",
                    college: Some("IIT"),
                    avatar_url: None,
                },
            )
            .await
            .unwrap();
        }
        id
    }

    #[test]
    fn scanned_code_accepts_json_payload_or_bare_uuid() {
        let id = "3f2b8c1e-9a4d-4b7e-8c2f-1a2b3c4d5e6f";
        assert_eq!(parse_scanned_code(id).as_deref(), Some(id));
        assert_eq!(parse_scanned_code(&qr_payload(id)).as_deref(), Some(id));
        assert_eq!(
            parse_scanned_code(&format!("  {}  ", id.to_uppercase())).as_deref(),
            Some(id)
        );
    }

    #[test]
    fn scanned_code_rejects_everything_else() {
        assert!(parse_scanned_code("").is_none());
        assert!(parse_scanned_code("hello").is_none());
        assert!(parse_scanned_code("3f2b8c1e9a4d4b7e8c2f1a2b3c4d5e6f").is_none());
        assert!(parse_scanned_code("{3f2b8c1e-9a4d-4b7e-8c2f-1a2b3c4d5e6f}").is_none());
        assert!(parse_scanned_code(r#"{"userId": "not-a-uuid"}"#).is_none());
        assert!(parse_scanned_code(r#"{"id": "3f2b8c1e-9a4d-4b7e-8c2f-1a2b3c4d5e6f"}"#).is_none());
    }

    #[tokio::test]
    async fn rescan_is_rejected_without_second_mutation() {
        let pool = database::connect_in_memory().await.unwrap();
        let id = seed_profile(&pool, true).await;

        let first = scan(&pool, &qr_payload(&id), CheckInDay::One).await.unwrap();
        assert!(first.is_success());
        let stamped = profiles_repo::load_profile(&pool, &id)
            .await
            .unwrap()
            .unwrap()
            .esummit_checked_in_at;
        assert!(stamped.is_some());

        let second = scan(&pool, &id, CheckInDay::One).await.unwrap();
        match second {
            ScanOutcome::AlreadyCheckedIn { checked_in_at, .. } => {
                assert_eq!(checked_in_at, stamped)
            }
            other => panic!("expected already checked in, got {other:?}"),
        }
        let after = profiles_repo::load_profile(&pool, &id).await.unwrap().unwrap();
        assert_eq!(after.esummit_checked_in_at, stamped);
    }

    #[tokio::test]
    async fn incomplete_profile_blocks_check_in() {
        let pool = database::connect_in_memory().await.unwrap();
        let id = seed_profile(&pool, false).await;

        let outcome = scan(&pool, &id, CheckInDay::One).await.unwrap();
        match outcome {
            ScanOutcome::IncompleteProfile { missing, .. } => {
                assert!(missing.contains(&"phone"));
                assert!(missing.contains(&"age"));
                assert!(missing.contains(&"gender"));
            }
            other => panic!("expected incomplete profile, got {other:?}"),
        }
        let profile = profiles_repo::load_profile(&pool, &id).await.unwrap().unwrap();
        assert_eq!(profile.esummit_checked_in, 0);
    }

    #[tokio::test]
    async fn days_are_independent() {
        let pool = database::connect_in_memory().await.unwrap();
        let id = seed_profile(&pool, true).await;

        assert!(scan(&pool, &id, CheckInDay::Two).await.unwrap().is_success());
        let profile = profiles_repo::load_profile(&pool, &id).await.unwrap().unwrap();
        assert_eq!(profile.esummit_checked_in, 0);
        assert_eq!(profile.esummit_day2_checked_in, 1);

        assert!(scan(&pool, &id, CheckInDay::One).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn unknown_and_invalid_codes() {
        let pool = database::connect_in_memory().await.unwrap();
        let unknown = Uuid::new_v4().to_string();
        assert!(matches!(
            scan(&pool, &unknown, CheckInDay::One).await.unwrap(),
            ScanOutcome::NotFound { .. }
        ));
        assert!(matches!(
            scan(&pool, "garbage", CheckInDay::One).await.unwrap(),
            ScanOutcome::InvalidCode
        ));
    }
}
