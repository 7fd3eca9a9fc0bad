use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use cookie::Cookie;
use sqlx::SqlitePool;
use tracing::warn;

use crate::config::Config;
use crate::database::profiles_repo;
use crate::error::AppError;
use crate::services::auth_service;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: Option<String>,
    pub access_token: String,
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|hv| hv.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// The user named by the access token cookie.
///
/// Without a signing secret this is an unconfirmed read of the payload, fit for nav state
/// only. Access control goes through [`authenticate`].
pub fn current_user(headers: &HeaderMap, config: &Config) -> Option<AuthenticatedUser> {
    let token = cookie_value(headers, ACCESS_COOKIE)?;
    let claims = auth_service::decode_access_token(&token, config.jwt_secret.as_deref())?;
    Some(AuthenticatedUser {
        id: claims.sub,
        email: claims.email,
        access_token: token,
    })
}

/// The signed-in user, once the token is verified locally or confirmed by the auth service.
pub async fn authenticate(headers: &HeaderMap, config: &Config) -> Option<AuthenticatedUser> {
    let user = current_user(headers, config)?;
    if config.jwt_secret.is_some() {
        return Some(user);
    }

    match auth_service::fetch_user(config, &user.access_token).await {
        Ok(claims) if claims.sub == user.id => Some(AuthenticatedUser {
            id: user.id,
            email: claims.email.or(user.email),
            access_token: user.access_token,
        }),
        Ok(claims) => {
            warn!("Token subject {} does not match auth user {}", user.id, claims.sub);
            None
        }
        Err(AppError::Unauthorized) => None,
        Err(e) => {
            warn!("Could not confirm session for {}: {}", user.id, e);
            None
        }
    }
}

pub async fn require_auth(
    State(config): State<Arc<Config>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = authenticate(request.headers(), &config).await;
    if let Some(user) = user {
        request.extensions_mut().insert(user);
        return next.run(request).await;
    }

    let path = request.uri().path();
    if path.starts_with("/api/") {
        return AppError::Unauthorized.into_response();
    }
    let return_to = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let query = serde_urlencoded::to_string([("return_to", return_to)]).unwrap_or_default();
    Redirect::to(&format!("/login?{}", query)).into_response()
}

/// Runs behind `require_auth`; lets only profiles flagged as admin through.
pub async fn require_admin(
    State(pool): State<SqlitePool>,
    request: Request,
    next: Next,
) -> Response {
    let Some(user_id) = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.id.clone())
    else {
        return AppError::Unauthorized.into_response();
    };

    match profiles_repo::load_profile(&pool, &user_id).await {
        Ok(Some(profile)) if profile.is_admin() => next.run(request).await,
        Ok(_) => {
            warn!("Non-admin {} tried {}", user_id, request.uri().path());
            AppError::Forbidden.into_response()
        }
        Err(e) => AppError::Database(e).into_response(),
    }
}
