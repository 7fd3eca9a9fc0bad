use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{self, events_repo, profiles_repo, registrations_repo, teams_repo};
use crate::error::AppError;
use crate::models::{EventRow, ProfileRow, RegistrationRole};
use crate::services::event_service::{self, EventCardView};

pub const JOIN_CODE_LEN: usize = 6;
const JOIN_CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const JOIN_CODE_ATTEMPTS: usize = 5;
const TEAM_NAME_MAX_CHARS: usize = 60;

// 7 * 36; bytes at or above it would favour the first four symbols.
const JOIN_CODE_BYTE_LIMIT: u8 = 252;

/// Random 6-character code over `[A-Z0-9]`, uniform across all 36^6 codes.
pub fn generate_join_code() -> String {
    let mut code = String::with_capacity(JOIN_CODE_LEN);
    while code.len() < JOIN_CODE_LEN {
        let uuid = Uuid::new_v4();
        // Bytes 6 and 8 carry the uuid version and variant bits.
        let random: Vec<u8> = uuid
            .as_bytes()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 6 && *i != 8)
            .map(|(_, b)| *b)
            .collect();
        fill_join_code(&mut code, &random);
    }
    code
}

fn fill_join_code(code: &mut String, random: &[u8]) {
    for b in random.iter().filter(|b| **b < JOIN_CODE_BYTE_LIMIT) {
        if code.len() == JOIN_CODE_LEN {
            return;
        }
        code.push(JOIN_CODE_ALPHABET[(*b as usize) % JOIN_CODE_ALPHABET.len()] as char);
    }
}

pub fn normalize_join_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[derive(Debug, Clone)]
pub struct CreatedTeam {
    pub team_id: String,
    pub join_code: String,
    pub registration_id: String,
}

#[derive(Debug, Clone)]
pub struct JoinedTeam {
    pub team_id: String,
    pub team_name: String,
    pub registration_id: String,
}

pub async fn register_individual(
    pool: &SqlitePool,
    user_id: &str,
    event_id: &str,
) -> Result<String, AppError> {
    let event = load_open_event(pool, event_id).await?;
    if event.is_team_event() {
        return Err(AppError::TeamEventRequiresTeam);
    }
    require_complete_profile(pool, user_id).await?;

    let registration_id = Uuid::new_v4().to_string();
    let mut conn = pool.acquire().await?;
    registrations_repo::insert_registration(
        &mut *conn,
        registrations_repo::NewRegistration {
            id: &registration_id,
            user_id,
            event_id,
            team_id: None,
            role: RegistrationRole::Individual.as_str(),
        },
    )
    .await
    .map_err(registration_error)?;

    info!("Registered {} for event {}", user_id, event_id);
    Ok(registration_id)
}

pub async fn create_team(
    pool: &SqlitePool,
    user_id: &str,
    event_id: &str,
    team_name: &str,
) -> Result<CreatedTeam, AppError> {
    create_team_with(pool, user_id, event_id, team_name, generate_join_code).await
}

async fn create_team_with(
    pool: &SqlitePool,
    user_id: &str,
    event_id: &str,
    team_name: &str,
    mut next_code: impl FnMut() -> String,
) -> Result<CreatedTeam, AppError> {
    let team_name = team_name.trim();
    if team_name.is_empty() {
        return Err(AppError::TeamNameRequired);
    }
    if team_name.chars().count() > TEAM_NAME_MAX_CHARS {
        return Err(AppError::TeamNameTooLong);
    }

    let event = load_open_event(pool, event_id).await?;
    if !event.is_team_event() {
        return Err(AppError::NotATeamEvent);
    }
    require_complete_profile(pool, user_id).await?;

    let team_id = Uuid::new_v4().to_string();
    let registration_id = Uuid::new_v4().to_string();

    // Team row and leader registration commit together or not at all.
    let mut tx = pool.begin().await?;

    let mut join_code = None;
    for attempt in 1..=JOIN_CODE_ATTEMPTS {
        let code = next_code();
        let res = teams_repo::insert_team(
            &mut *tx,
            teams_repo::NewTeam {
                id: &team_id,
                event_id,
                name: team_name,
                join_code: &code,
                leader_id: user_id,
            },
        )
        .await;
        match res {
            Ok(()) => {
                join_code = Some(code);
                break;
            }
            Err(e) if database::is_unique_violation(&e) => {
                warn!(
                    "Join code collision for event {} (attempt {}/{})",
                    event_id, attempt, JOIN_CODE_ATTEMPTS
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
    let Some(join_code) = join_code else {
        return Err(AppError::JoinCodesExhausted);
    };

    registrations_repo::insert_registration(
        &mut *tx,
        registrations_repo::NewRegistration {
            id: &registration_id,
            user_id,
            event_id,
            team_id: Some(&team_id),
            role: RegistrationRole::Leader.as_str(),
        },
    )
    .await
    .map_err(registration_error)?;

    tx.commit().await?;

    info!(
        "Team '{}' ({}) created for event {} by {}",
        team_name, team_id, event_id, user_id
    );
    Ok(CreatedTeam {
        team_id,
        join_code,
        registration_id,
    })
}

pub async fn join_team(
    pool: &SqlitePool,
    user_id: &str,
    event_id: &str,
    raw_code: &str,
) -> Result<JoinedTeam, AppError> {
    let event = load_open_event(pool, event_id).await?;
    if !event.is_team_event() {
        return Err(AppError::NotATeamEvent);
    }
    require_complete_profile(pool, user_id).await?;

    let code = normalize_join_code(raw_code);
    if code.len() != JOIN_CODE_LEN {
        return Err(AppError::InvalidJoinCode);
    }
    let team = teams_repo::find_team_by_code(pool, event_id, &code)
        .await?
        .ok_or(AppError::InvalidJoinCode)?;

    let members = registrations_repo::count_team_registrations(pool, &team.id).await?;
    if members >= event.max_team_size {
        return Err(AppError::TeamFull);
    }

    let registration_id = Uuid::new_v4().to_string();
    let mut conn = pool.acquire().await?;
    let inserted = registrations_repo::insert_registration_if_capacity(
        &mut *conn,
        registrations_repo::NewRegistration {
            id: &registration_id,
            user_id,
            event_id,
            team_id: Some(&team.id),
            role: RegistrationRole::Member.as_str(),
        },
        event.max_team_size,
    )
    .await
    .map_err(registration_error)?;
    if inserted == 0 {
        // Another join took the last seat between the count and the insert.
        return Err(AppError::TeamFull);
    }

    info!("{} joined team {} for event {}", user_id, team.id, event_id);
    Ok(JoinedTeam {
        team_id: team.id,
        team_name: team.name,
        registration_id,
    })
}

async fn load_open_event(pool: &SqlitePool, event_id: &str) -> Result<EventRow, AppError> {
    let event = events_repo::load_event(pool, event_id)
        .await?
        .ok_or(AppError::EventNotFound)?;
    if !event.registrations_open() {
        return Err(AppError::RegistrationsClosed);
    }
    Ok(event)
}

async fn require_complete_profile(pool: &SqlitePool, user_id: &str) -> Result<ProfileRow, AppError> {
    let profile = profiles_repo::load_profile(pool, user_id)
        .await?
        .ok_or(AppError::ProfileNotFound)?;
    let missing = profile.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::IncompleteProfile(missing));
    }
    Ok(profile)
}

fn registration_error(err: sqlx::Error) -> AppError {
    if database::is_unique_violation(&err) {
        AppError::AlreadyRegistered
    } else {
        AppError::Database(err)
    }
}

// ---------------------------------------------------------------------------
// Registration page
// ---------------------------------------------------------------------------

pub struct TeamMemberView {
    pub name: String,
    pub role: String,
}

pub struct TeamView {
    pub id: String,
    pub name: String,
    pub join_code: String,
    pub members: Vec<TeamMemberView>,
    pub member_count: i64,
    pub seats_left: i64,
    pub meets_minimum: bool,
    pub is_leader: bool,
}

pub struct RegistrationPageView {
    pub event: EventCardView,
    pub min_team_size: i64,
    pub max_team_size: i64,
    pub role: Option<String>,
    pub team: Option<TeamView>,
    pub missing_profile_fields: Vec<&'static str>,
}

impl RegistrationPageView {
    pub fn is_registered(&self) -> bool {
        self.role.is_some()
    }

    pub fn profile_complete(&self) -> bool {
        self.missing_profile_fields.is_empty()
    }

    pub fn missing_label(&self) -> String {
        self.missing_profile_fields.join(", ")
    }
}

pub async fn load_registration_view(
    pool: &SqlitePool,
    user_id: &str,
    event_id: &str,
) -> sqlx::Result<Option<RegistrationPageView>> {
    let Some(event) = events_repo::load_event(pool, event_id).await? else {
        return Ok(None);
    };
    let missing_profile_fields = profiles_repo::load_profile(pool, user_id)
        .await?
        .map(|p| p.missing_fields())
        .unwrap_or_else(|| vec!["name", "phone", "age", "gender"]);

    let registration = registrations_repo::load_registration(pool, user_id, event_id).await?;

    let mut team = None;
    if let Some(team_id) = registration.as_ref().and_then(|r| r.team_id.as_deref()) {
        if let Some(row) = teams_repo::load_team(pool, team_id).await? {
            let members = teams_repo::list_team_members(pool, team_id).await?;
            let member_count = members.len() as i64;
            team = Some(TeamView {
                is_leader: row.leader_id == user_id,
                id: row.id,
                name: row.name,
                join_code: row.join_code,
                members: members
                    .into_iter()
                    .map(|m| TeamMemberView {
                        name: m
                            .full_name
                            .filter(|s| !s.trim().is_empty())
                            .or(m.email)
                            .unwrap_or_else(|| "Member".to_string()),
                        role: m.role,
                    })
                    .collect(),
                member_count,
                seats_left: (event.max_team_size - member_count).max(0),
                meets_minimum: member_count >= event.min_team_size,
            });
        }
    }

    Ok(Some(RegistrationPageView {
        event: event_service::build_card(&event),
        min_team_size: event.min_team_size,
        max_team_size: event.max_team_size,
        role: registration.map(|r| r.role),
        team,
        missing_profile_fields,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::events_repo::EventWrite;
    use crate::database::profiles_repo::ProfileUpdate;

    async fn seed_event(pool: &SqlitePool, team: bool, max_team_size: i64, open: bool) -> String {
        let id = Uuid::new_v4().to_string();
        events_repo::insert_event(
            pool,
            &id,
            &EventWrite {
                title: "Startup Sprint".into(),
                description: None,
                event_date: "2026-02-14".into(),
                event_time: None,
                venue: None,
                category: None,
                status: "upcoming".into(),
                image_url: None,
                featured: false,
                is_team_event: team,
                is_esummit: true,
                registrations_open: open,
                min_team_size: 1,
                max_team_size,
                details: "{}".into(),
            },
        )
        .await
        .unwrap();
        id
    }

    async fn seed_user(pool: &SqlitePool, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        profiles_repo::ensure_profile(pool, &id, Some(&format!("{name}@example.com")))
            .await
            .unwrap();
        profiles_repo::update_profile(
            pool,
            &id,
            ProfileUpdate {
                full_name: name,
                phone: "9999999999",
                age: 20,
                gender: "female",
                college: None,
                avatar_url: None,
            },
        )
        .await
        .unwrap();
        id
    }

    #[test]
    fn join_codes_are_six_uppercase_alphanumerics() {
        for _ in 0..50 {
            let code = generate_join_code();
            assert_eq!(code.len(), JOIN_CODE_LEN);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn third_member_is_rejected_when_team_is_full() {
        let pool = database::connect_in_memory().await.unwrap();
        let event = seed_event(&pool, true, 2, true).await;
        let a = seed_user(&pool, "Alice").await;
        let b = seed_user(&pool, "Bob").await;
        let c = seed_user(&pool, "Carol").await;

        let team = create_team(&pool, &a, &event, "Alpha").await.unwrap();
        join_team(&pool, &b, &event, &team.join_code).await.unwrap();

        let err = join_team(&pool, &c, &event, &team.join_code)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TeamFull));
        assert_eq!(err.to_string(), "Team is full.");
        assert_eq!(
            registrations_repo::count_team_registrations(&pool, &team.team_id)
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn concurrent_joins_never_exceed_capacity() {
        let pool = database::connect_in_memory().await.unwrap();
        let event = seed_event(&pool, true, 3, true).await;
        let leader = seed_user(&pool, "Lead").await;
        let team = create_team(&pool, &leader, &event, "Racers").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..6 {
            let pool = pool.clone();
            let event = event.clone();
            let code = team.join_code.clone();
            let user = seed_user(&pool, &format!("Joiner{i}")).await;
            handles.push(tokio::spawn(async move {
                join_team(&pool, &user, &event, &code).await
            }));
        }
        let mut joined = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => joined += 1,
                Err(AppError::TeamFull) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(joined, 2);
        assert_eq!(
            registrations_repo::count_team_registrations(&pool, &team.team_id)
                .await
                .unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn join_code_is_case_insensitive_and_scoped_to_event() {
        let pool = database::connect_in_memory().await.unwrap();
        let event = seed_event(&pool, true, 4, true).await;
        let other_event = seed_event(&pool, true, 4, true).await;
        let a = seed_user(&pool, "Alice").await;
        let b = seed_user(&pool, "Bob").await;

        let team = create_team(&pool, &a, &event, "Alpha").await.unwrap();
        let lower = format!("  {}  ", team.join_code.to_lowercase());

        assert!(matches!(
            join_team(&pool, &b, &other_event, &lower).await,
            Err(AppError::InvalidJoinCode)
        ));
        let joined = join_team(&pool, &b, &event, &lower).await.unwrap();
        assert_eq!(joined.team_name, "Alpha");
    }

    #[tokio::test]
    async fn unknown_code_is_invalid() {
        let pool = database::connect_in_memory().await.unwrap();
        let event = seed_event(&pool, true, 4, true).await;
        let b = seed_user(&pool, "Bob").await;
        assert!(matches!(
            join_team(&pool, &b, &event, "ZZZZZZ").await,
            Err(AppError::InvalidJoinCode)
        ));
        assert!(matches!(
            join_team(&pool, &b, &event, "ABC").await,
            Err(AppError::InvalidJoinCode)
        ));
    }

    #[tokio::test]
    async fn second_registration_for_same_event_fails_as_duplicate() {
        let pool = database::connect_in_memory().await.unwrap();
        let event = seed_event(&pool, false, 1, true).await;
        let a = seed_user(&pool, "Alice").await;

        register_individual(&pool, &a, &event).await.unwrap();
        assert!(matches!(
            register_individual(&pool, &a, &event).await,
            Err(AppError::AlreadyRegistered)
        ));
    }

    #[test]
    fn bytes_past_the_last_full_cycle_are_skipped() {
        let mut code = String::new();
        fill_join_code(&mut code, &[252, 255, 0, 251, 253, 36, 1, 2, 3, 4]);
        assert_eq!(code, "A9ABCD");

        // Short of random bytes, the code stays partial until the next draw.
        let mut partial = String::new();
        fill_join_code(&mut partial, &[254, 25]);
        assert_eq!(partial, "Z");
    }

    #[tokio::test]
    async fn colliding_join_code_is_retried() {
        let pool = database::connect_in_memory().await.unwrap();
        let event = seed_event(&pool, true, 4, true).await;
        let a = seed_user(&pool, "Alice").await;
        let b = seed_user(&pool, "Bob").await;

        let first = create_team_with(&pool, &a, &event, "Alpha", || "AAAAAA".to_string())
            .await
            .unwrap();
        assert_eq!(first.join_code, "AAAAAA");

        let mut codes = vec!["BBBBBB", "AAAAAA"];
        let second = create_team_with(&pool, &b, &event, "Beta", || {
            codes.pop().unwrap_or("CCCCCC").to_string()
        })
        .await
        .unwrap();
        assert_eq!(second.join_code, "BBBBBB");
        assert_eq!(teams_repo::count_teams(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn exhausted_join_codes_leave_nothing_behind() {
        let pool = database::connect_in_memory().await.unwrap();
        let event = seed_event(&pool, true, 4, true).await;
        let a = seed_user(&pool, "Alice").await;
        let b = seed_user(&pool, "Bob").await;

        create_team_with(&pool, &a, &event, "Alpha", || "AAAAAA".to_string())
            .await
            .unwrap();

        let mut attempts = 0;
        let err = create_team_with(&pool, &b, &event, "Beta", || {
            attempts += 1;
            "AAAAAA".to_string()
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::JoinCodesExhausted));
        assert_eq!(err.to_string(), "Could not allocate a team code, please try again");
        assert_eq!(attempts, JOIN_CODE_ATTEMPTS);
        assert_eq!(teams_repo::count_teams(&pool).await.unwrap(), 1);

        let registered = registrations_repo::load_registration(&pool, &b, &event)
            .await
            .unwrap();
        assert!(registered.is_none());
    }

    #[tokio::test]
    async fn blank_team_name_is_rejected() {
        let pool = database::connect_in_memory().await.unwrap();
        let event = seed_event(&pool, true, 4, true).await;
        let a = seed_user(&pool, "Alice").await;

        let err = create_team(&pool, &a, &event, "   ").await.unwrap_err();
        assert_eq!(err.notice(), "team_name_required");
    }

    #[tokio::test]
    async fn failed_leader_registration_leaves_no_team_behind() {
        let pool = database::connect_in_memory().await.unwrap();
        let event = seed_event(&pool, true, 4, true).await;
        let a = seed_user(&pool, "Alice").await;

        create_team(&pool, &a, &event, "First").await.unwrap();
        assert!(matches!(
            create_team(&pool, &a, &event, "Second").await,
            Err(AppError::AlreadyRegistered)
        ));
        assert_eq!(teams_repo::count_teams(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn member_of_one_team_cannot_join_another() {
        let pool = database::connect_in_memory().await.unwrap();
        let event = seed_event(&pool, true, 4, true).await;
        let a = seed_user(&pool, "Alice").await;
        let b = seed_user(&pool, "Bob").await;
        let c = seed_user(&pool, "Carol").await;

        let alpha = create_team(&pool, &a, &event, "Alpha").await.unwrap();
        let beta = create_team(&pool, &b, &event, "Beta").await.unwrap();
        join_team(&pool, &c, &event, &alpha.join_code).await.unwrap();
        assert!(matches!(
            join_team(&pool, &c, &event, &beta.join_code).await,
            Err(AppError::AlreadyRegistered)
        ));
    }

    #[tokio::test]
    async fn incomplete_profile_blocks_every_registration_path() {
        let pool = database::connect_in_memory().await.unwrap();
        let solo = seed_event(&pool, false, 1, true).await;
        let teams = seed_event(&pool, true, 4, true).await;
        let leader = seed_user(&pool, "Lead").await;
        let team = create_team(&pool, &leader, &teams, "Alpha").await.unwrap();

        let newcomer = Uuid::new_v4().to_string();
        profiles_repo::ensure_profile(&pool, &newcomer, Some("new@example.com"))
            .await
            .unwrap();

        let is_incomplete =
            |r: &Result<_, AppError>| matches!(r, Err(AppError::IncompleteProfile(f)) if f.contains(&"phone"));
        assert!(is_incomplete(&register_individual(&pool, &newcomer, &solo).await.map(|_| ())));
        assert!(is_incomplete(
            &create_team(&pool, &newcomer, &teams, "Beta").await.map(|_| ())
        ));
        assert!(is_incomplete(
            &join_team(&pool, &newcomer, &teams, &team.join_code).await.map(|_| ())
        ));
    }

    #[tokio::test]
    async fn event_kind_and_open_flag_are_enforced() {
        let pool = database::connect_in_memory().await.unwrap();
        let solo = seed_event(&pool, false, 1, true).await;
        let teams = seed_event(&pool, true, 4, true).await;
        let closed = seed_event(&pool, false, 1, false).await;
        let a = seed_user(&pool, "Alice").await;

        assert!(matches!(
            register_individual(&pool, &a, &teams).await,
            Err(AppError::TeamEventRequiresTeam)
        ));
        assert!(matches!(
            create_team(&pool, &a, &solo, "Alpha").await,
            Err(AppError::NotATeamEvent)
        ));
        assert!(matches!(
            register_individual(&pool, &a, &closed).await,
            Err(AppError::RegistrationsClosed)
        ));
        assert!(matches!(
            register_individual(&pool, &a, "missing").await,
            Err(AppError::EventNotFound)
        ));
    }

    #[tokio::test]
    async fn registration_view_shows_team_and_seats() {
        let pool = database::connect_in_memory().await.unwrap();
        let event = seed_event(&pool, true, 3, true).await;
        let a = seed_user(&pool, "Alice").await;
        let b = seed_user(&pool, "Bob").await;
        let team = create_team(&pool, &a, &event, "Alpha").await.unwrap();
        join_team(&pool, &b, &event, &team.join_code).await.unwrap();

        let view = load_registration_view(&pool, &b, &event)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(view.role.as_deref(), Some("member"));
        let t = view.team.unwrap();
        assert_eq!(t.join_code, team.join_code);
        assert_eq!(t.member_count, 2);
        assert_eq!(t.seats_left, 1);
        assert!(!t.is_leader);
        assert_eq!(t.members[0].name, "Alice");
        assert_eq!(t.members[0].role, "leader");
    }
}
