use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::Config;
use crate::database::profiles_repo;
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<u64>,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct AuthErrorBody {
    #[serde(alias = "error_description", alias = "msg")]
    message: Option<String>,
}

fn auth_url(config: &Config, path: &str) -> String {
    format!("{}{}", config.auth_api_url.trim_end_matches('/'), path)
}

/// Password sign-in against the hosted auth service.
pub async fn sign_in(config: &Config, email: &str, password: &str) -> Result<AuthTokens, AppError> {
    let url = auth_url(config, "/auth/v1/token?grant_type=password");
    let client = reqwest::Client::new();
    let mut req = client
        .post(&url)
        .json(&json!({ "email": email, "password": password }));
    if let Some(key) = config.anon_key.as_deref() {
        req = req.header("apikey", key);
    }

    let resp = req.send().await.map_err(|e| {
        warn!("Auth service unreachable at {}: {}", url, e);
        AppError::Upstream("auth service unreachable".into())
    })?;

    let status = resp.status();
    if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(AppError::Validation("Invalid email or password".into()));
    }
    if !status.is_success() {
        warn!("Auth service returned {} for sign-in", status);
        return Err(AppError::Upstream(format!("auth service returned {}", status)));
    }

    resp.json::<AuthTokens>().await.map_err(|e| {
        warn!("Could not parse auth response: {}", e);
        AppError::Upstream("unexpected auth response".into())
    })
}

pub async fn sign_up(
    config: &Config,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<(), AppError> {
    let url = auth_url(config, "/auth/v1/signup");
    let client = reqwest::Client::new();
    let mut req = client.post(&url).json(&json!({
        "email": email,
        "password": password,
        "data": { "full_name": full_name }
    }));
    if let Some(key) = config.anon_key.as_deref() {
        req = req.header("apikey", key);
    }

    let resp = req.send().await.map_err(|e| {
        warn!("Auth service unreachable at {}: {}", url, e);
        AppError::Upstream("auth service unreachable".into())
    })?;

    let status = resp.status();
    if status.is_client_error() {
        let message = resp
            .json::<AuthErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| "Could not create the account".to_string());
        return Err(AppError::Validation(message));
    }
    if !status.is_success() {
        return Err(AppError::Upstream(format!("auth service returned {}", status)));
    }
    info!("Signed up {}", email);
    Ok(())
}

/// Asks the hosted auth service who owns `access_token`.
///
/// Used when no local signing secret is configured, so a token is only trusted once the
/// issuer has confirmed it.
pub async fn fetch_user(config: &Config, access_token: &str) -> Result<TokenClaims, AppError> {
    let url = auth_url(config, "/auth/v1/user");
    let client = reqwest::Client::new();
    let mut req = client.get(&url).bearer_auth(access_token);
    if let Some(key) = config.anon_key.as_deref() {
        req = req.header("apikey", key);
    }

    let resp = req.send().await.map_err(|e| {
        warn!("Auth service unreachable at {}: {}", url, e);
        AppError::Upstream("auth service unreachable".into())
    })?;

    let status = resp.status();
    if status.is_client_error() {
        return Err(AppError::Unauthorized);
    }
    if !status.is_success() {
        return Err(AppError::Upstream(format!("auth service returned {}", status)));
    }

    let user = resp.json::<AuthUser>().await.map_err(|e| {
        warn!("Could not parse auth user response: {}", e);
        AppError::Upstream("unexpected auth response".into())
    })?;
    Ok(TokenClaims {
        sub: user.id,
        email: user.email,
        exp: None,
    })
}

/// Makes sure the profile row exists after a successful sign-in and applies admin promotion.
pub async fn complete_login(
    pool: &SqlitePool,
    config: &Config,
    tokens: &AuthTokens,
) -> Result<TokenClaims, AppError> {
    let claims = decode_access_token(&tokens.access_token, config.jwt_secret.as_deref())
        .ok_or(AppError::Upstream("auth service issued an unreadable token".into()))?;

    profiles_repo::ensure_profile(pool, &claims.sub, claims.email.as_deref()).await?;
    if let Some(email) = claims.email.as_deref() {
        if config.is_admin_email(email) && profiles_repo::set_admin(pool, &claims.sub).await? > 0 {
            info!("Promoted {} to admin", email);
        }
    }
    Ok(claims)
}

/// Decodes a JWT access token.
///
/// With a secret the HS256 signature must match; without one only the payload is read and
/// the caller has to confirm the token through [`fetch_user`] before trusting it.
/// Expired tokens are rejected either way.
pub fn decode_access_token(token: &str, secret: Option<&str>) -> Option<TokenClaims> {
    let mut parts = token.split('.');
    let (header, payload, signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    if let Some(secret) = secret {
        let sig = general_purpose::URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig).ok()?;
    }

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&payload_bytes).ok()?;
    if claims.sub.trim().is_empty() {
        return None;
    }

    if let Some(exp) = claims.exp {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if exp <= now {
            return None;
        }
    }
    Some(claims)
}

/// HS256-signs a claims object. Used for local tooling and tests.
pub fn sign_token(claims: &serde_json::Value, secret: &str) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
    let signing_input = format!("{}.{}", header, payload);
    let signature = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(signing_input.as_bytes());
            general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    };
    format!("{}.{}", signing_input, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    fn far_future() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + 3600
    }

    #[test]
    fn signed_tokens_are_verified() {
        let token = sign_token(
            &json!({ "sub": "user-1", "email": "a@b.co", "exp": far_future() }),
            "secret",
        );
        let claims = decode_access_token(&token, Some("secret")).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("a@b.co"));

        assert!(decode_access_token(&token, Some("other-secret")).is_none());
        // Payload-only mode still reads it.
        assert!(decode_access_token(&token, None).is_some());
    }

    #[test]
    fn tampered_and_expired_tokens_are_rejected() {
        let token = sign_token(&json!({ "sub": "user-1", "exp": far_future() }), "secret");
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"sub":"admin"}"#);
        parts[1] = &forged;
        assert!(decode_access_token(&parts.join("."), Some("secret")).is_none());

        let expired = sign_token(&json!({ "sub": "user-1", "exp": 1 }), "secret");
        assert!(decode_access_token(&expired, Some("secret")).is_none());

        assert!(decode_access_token("not-a-jwt", None).is_none());
    }

    #[tokio::test]
    async fn login_creates_profile_and_promotes_admins() {
        let pool = database::connect_in_memory().await.unwrap();
        let config = Config {
            jwt_secret: Some("secret".into()),
            admin_emails: vec!["lead@ecell.org".into()],
            ..Config::default()
        };
        let tokens = AuthTokens {
            access_token: sign_token(
                &json!({ "sub": "lead-id", "email": "Lead@ecell.org", "exp": far_future() }),
                "secret",
            ),
            refresh_token: "r".into(),
        };

        let claims = complete_login(&pool, &config, &tokens).await.unwrap();
        assert_eq!(claims.sub, "lead-id");
        let profile = profiles_repo::load_profile(&pool, "lead-id")
            .await
            .unwrap()
            .unwrap();
        assert!(profile.is_admin());
        assert_eq!(profile.email.as_deref(), Some("Lead@ecell.org"));

        // Second login keeps the row as is.
        complete_login(&pool, &config, &tokens).await.unwrap();
    }
}
