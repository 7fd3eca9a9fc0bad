pub mod admin;
pub mod auth;
pub mod checkin;
pub mod pages;
pub mod participants;
pub mod profile;
pub mod registration;
pub mod uploads;

use askama::Template;
use axum::{
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{notice_message, AppError};
use crate::web::middleware::auth::current_user;

/// Data every page layout needs: nav state and the toast after a redirect.
pub struct PageChrome {
    pub signed_in: bool,
    pub notice: Option<&'static str>,
    pub notice_is_error: bool,
}

impl PageChrome {
    pub fn new(headers: &HeaderMap, config: &Config, notice: Option<&str>) -> Self {
        Self::with_state(current_user(headers, config).is_some(), notice)
    }

    /// For pages behind the auth middleware.
    pub fn signed_in(notice: Option<&str>) -> Self {
        Self::with_state(true, notice)
    }

    pub fn anonymous(notice: Option<&str>) -> Self {
        Self::with_state(false, notice)
    }

    fn with_state(signed_in: bool, notice: Option<&str>) -> Self {
        let code = notice.unwrap_or_default();
        Self {
            signed_in,
            notice: notice_message(code),
            notice_is_error: !code.is_empty() && !code.ends_with("_ok"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}

/// Redirects to `target` with `notice=<code>` appended.
pub fn redirect_with_notice(target: &str, notice: &str) -> Response {
    let sep = if target.contains('?') { "&" } else { "?" };
    Redirect::to(&format!("{}{}notice={}", target, sep, notice)).into_response()
}

/// Only same-site absolute paths are accepted as redirect targets.
pub fn sanitize_return_to(value: &str) -> Option<&str> {
    let v = value.trim();
    if !v.starts_with('/') {
        return None;
    }
    if v.starts_with("//") || v.contains("://") || v.contains('\\') {
        return None;
    }
    Some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_to_rejects_offsite_targets() {
        assert_eq!(sanitize_return_to(" /profile "), Some("/profile"));
        assert_eq!(sanitize_return_to("//evil.example"), None);
        assert_eq!(sanitize_return_to("https://evil.example"), None);
        assert_eq!(sanitize_return_to("/\\evil.example"), None);
        assert_eq!(sanitize_return_to("profile"), None);
    }

    #[test]
    fn notices_are_classified() {
        let ok = PageChrome::signed_in(Some("registered_ok"));
        assert!(ok.notice.is_some());
        assert!(!ok.notice_is_error);

        let err = PageChrome::signed_in(Some("team_full"));
        assert_eq!(err.notice, Some("Team is full."));
        assert!(err.notice_is_error);

        assert!(PageChrome::signed_in(Some("made_up")).notice.is_none());
    }
}
