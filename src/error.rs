use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Event not found")]
    EventNotFound,

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Not found")]
    NotFound,

    #[error("Registrations are closed for this event")]
    RegistrationsClosed,

    #[error("This is a team event, create or join a team to register")]
    TeamEventRequiresTeam,

    #[error("This event does not take team registrations")]
    NotATeamEvent,

    #[error("Please complete your profile before continuing (missing: {})", .0.join(", "))]
    IncompleteProfile(Vec<&'static str>),

    #[error("You are already registered for this event")]
    AlreadyRegistered,

    #[error("Invalid team code")]
    InvalidJoinCode,

    #[error("Team is full.")]
    TeamFull,

    #[error("Team name is required")]
    TeamNameRequired,

    #[error("Team name must be at most 60 characters")]
    TeamNameTooLong,

    #[error("Could not allocate a team code, please try again")]
    JoinCodesExhausted,

    #[error("{0}")]
    Validation(String),

    #[error("Please log in to continue")]
    Unauthorized,

    #[error("You do not have access to this page")]
    Forbidden,

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::EventNotFound | AppError::ProfileNotFound | AppError::NotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::RegistrationsClosed
            | AppError::TeamEventRequiresTeam
            | AppError::NotATeamEvent
            | AppError::IncompleteProfile(_)
            | AppError::InvalidJoinCode
            | AppError::TeamNameRequired
            | AppError::TeamNameTooLong
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::JoinCodesExhausted => StatusCode::SERVICE_UNAVAILABLE,
            AppError::AlreadyRegistered | AppError::TeamFull => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short code carried through `?notice=` after a form redirect.
    pub fn notice(&self) -> &'static str {
        match self {
            AppError::EventNotFound => "event_not_found",
            AppError::ProfileNotFound => "profile_not_found",
            AppError::NotFound => "not_found",
            AppError::RegistrationsClosed => "registrations_closed",
            AppError::TeamEventRequiresTeam => "team_required",
            AppError::NotATeamEvent => "not_team_event",
            AppError::IncompleteProfile(_) => "profile_incomplete",
            AppError::AlreadyRegistered => "already_registered",
            AppError::InvalidJoinCode => "invalid_code",
            AppError::TeamFull => "team_full",
            AppError::TeamNameRequired => "team_name_required",
            AppError::TeamNameTooLong => "team_name_too_long",
            AppError::JoinCodesExhausted => "code_exhausted",
            AppError::Validation(_) => "invalid_input",
            AppError::Unauthorized => "login_required",
            AppError::Forbidden => "forbidden",
            AppError::Upstream(_) => "upstream_error",
            AppError::Database(_) | AppError::Template(_) => "error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
            // Internals stay in the log.
            return (status, "Something went wrong, please try again").into_response();
        }
        (status, self.to_string()).into_response()
    }
}

/// User-facing message for a notice code set by a redirect.
pub fn notice_message(code: &str) -> Option<&'static str> {
    let msg = match code {
        "registered_ok" => "You are registered!",
        "team_created_ok" => "Team created. Share the join code with your teammates.",
        "team_joined_ok" => "You joined the team.",
        "profile_saved_ok" => "Profile saved.",
        "message_sent_ok" => "Thanks! We will get back to you soon.",
        "saved_ok" => "Saved.",
        "deleted_ok" => "Deleted.",
        "signup_ok" => "Account created. Check your inbox to confirm your email, then log in.",
        "event_not_found" => "Event not found.",
        "profile_not_found" => "Profile not found.",
        "not_found" => "Not found.",
        "registrations_closed" => "Registrations are closed for this event.",
        "team_required" => "This is a team event, create or join a team to register.",
        "not_team_event" => "This event does not take team registrations.",
        "profile_incomplete" => "Please complete your profile (name, phone, age, gender) first.",
        "already_registered" => "You are already registered for this event.",
        "invalid_code" => "Invalid team code.",
        "team_full" => "Team is full.",
        "team_name_required" => "Team name is required.",
        "team_name_too_long" => "Team name must be at most 60 characters.",
        "code_exhausted" => "Could not allocate a team code, please try again.",
        "invalid_input" => "Please check the form and try again.",
        "login_required" => "Please log in to continue.",
        "forbidden" => "You do not have access to that page.",
        "upstream_error" => "The service is unavailable right now, please try again.",
        "error" => "Something went wrong, please try again.",
        _ => return None,
    };
    Some(msg)
}
