use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Base URL of the hosted auth service (`/auth/v1/...` lives below it).
    pub auth_api_url: String,
    /// Base URL of the hosted storage service (`/storage/v1/...` lives below it).
    pub storage_api_url: String,
    pub anon_key: Option<String>,
    /// HS256 secret for access tokens. Without it tokens are confirmed with the auth service.
    pub jwt_secret: Option<String>,
    /// Emails promoted to admin on login.
    pub admin_emails: Vec<String>,
    pub assets_dir: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: try_load("DATABASE_URL", "sqlite://ecell.db?mode=rwc"),
            host: try_load("HOST", "127.0.0.1"),
            port: try_load("PORT", "3000"),
            auth_api_url: try_load("AUTH_API_URL", "http://127.0.0.1:54321"),
            storage_api_url: try_load("STORAGE_API_URL", "http://127.0.0.1:54321"),
            anon_key: optional("SUPABASE_ANON_KEY"),
            jwt_secret: optional("AUTH_JWT_SECRET"),
            admin_emails: optional("ADMIN_EMAILS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            assets_dir: try_load("ASSETS_DIR", "assets"),
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            auth_api_url: "http://127.0.0.1:54321".to_string(),
            storage_api_url: "http://127.0.0.1:54321".to_string(),
            anon_key: None,
            jwt_secret: None,
            admin_emails: Vec::new(),
            assets_dir: "assets".to_string(),
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = optional(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    match raw.parse() {
        Ok(v) => v,
        Err(e) => {
            warn!("Invalid {key} value ({e}), using default: {default}");
            fallback(default)
        }
    }
}

fn fallback<T: FromStr>(default: &str) -> T
where
    T::Err: Display,
{
    match default.parse() {
        Ok(v) => v,
        // Defaults are literals above; a parse failure here is a programming error.
        Err(e) => panic!("default value {default:?} does not parse: {e}"),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_emails_are_case_insensitive() {
        let config = Config {
            admin_emails: parse_list(" Lead@ecell.org, ,ops@ecell.org"),
            ..Config::default()
        };
        assert_eq!(config.admin_emails.len(), 2);
        assert!(config.is_admin_email("lead@ECELL.org"));
        assert!(!config.is_admin_email("someone@ecell.org"));
    }
}
