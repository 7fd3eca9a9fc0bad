use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use cookie::{time::Duration, Cookie, SameSite};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth_service::{self, AuthTokens};
use crate::web::middleware::auth::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::web::routes::{redirect_with_notice, render, sanitize_return_to, PageChrome};

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: PageChrome,
    pub return_to: String,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoginQuery {
    pub return_to: Option<String>,
    pub notice: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
    return_to: Option<String>,
}

fn return_target(raw: Option<&str>) -> String {
    raw.and_then(sanitize_return_to)
        .unwrap_or("/profile")
        .to_string()
}

fn login_template(
    return_to: String,
    email: String,
    error: Option<String>,
    notice: Option<&str>,
) -> LoginTemplate {
    LoginTemplate {
        page: PageChrome::anonymous(notice),
        return_to,
        email,
        error,
    }
}

pub async fn login_page(Query(query): Query<LoginQuery>) -> Result<Response, AppError> {
    let template = login_template(
        return_target(query.return_to.as_deref()),
        String::new(),
        None,
        query.notice.as_deref(),
    );
    Ok(render(&template)?.into_response())
}

pub async fn login_handler(
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim().to_string();
    let return_to = return_target(form.return_to.as_deref());

    let tokens = match auth_service::sign_in(&config, &email, &form.password).await {
        Ok(t) => t,
        Err(e) => {
            warn!("Login failed for {}: {}", email, e);
            let message = match e {
                AppError::Validation(msg) => msg,
                _ => "Login is unavailable right now, please try again".to_string(),
            };
            return Ok(render(&login_template(return_to, email, Some(message), None))?.into_response());
        }
    };

    let claims = auth_service::complete_login(&pool, &config, &tokens).await?;
    info!("User {} logged in", claims.sub);

    let mut response = Redirect::to(&return_to).into_response();
    append_session_cookies(&mut response, &tokens);
    Ok(response)
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub page: PageChrome,
    pub email: String,
    pub full_name: String,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct SignupForm {
    email: String,
    password: String,
    full_name: String,
}

fn signup_template(email: String, full_name: String, error: Option<String>) -> SignupTemplate {
    SignupTemplate {
        page: PageChrome::anonymous(None),
        email,
        full_name,
        error,
    }
}

pub async fn signup_page() -> Result<Response, AppError> {
    Ok(render(&signup_template(String::new(), String::new(), None))?.into_response())
}

pub async fn signup_handler(
    State(config): State<Arc<Config>>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim().to_string();
    let full_name = form.full_name.trim().to_string();
    if full_name.is_empty() || email.is_empty() || form.password.len() < 6 {
        let error = "Name, email and a password of at least 6 characters are required";
        return Ok(render(&signup_template(email, full_name, Some(error.into())))?.into_response());
    }

    match auth_service::sign_up(&config, &email, &form.password, &full_name).await {
        Ok(()) => Ok(redirect_with_notice("/login", "signup_ok")),
        Err(e) => {
            warn!("Signup failed for {}: {}", email, e);
            let message = match e {
                AppError::Validation(msg) => msg,
                _ => "Signup is unavailable right now, please try again".to_string(),
            };
            Ok(render(&signup_template(email, full_name, Some(message)))?.into_response())
        }
    }
}

pub async fn logout_handler() -> Response {
    let mut response = Redirect::to("/").into_response();
    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        let mut c = session_cookie(name, String::new());
        c.set_max_age(Duration::ZERO);
        append_cookie(&mut response, &c);
    }
    response
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut c = Cookie::new(name, value);
    c.set_path("/");
    c.set_http_only(true);
    c.set_same_site(SameSite::Lax);
    c
}

fn append_session_cookies(response: &mut Response, tokens: &AuthTokens) {
    append_cookie(response, &session_cookie(ACCESS_COOKIE, tokens.access_token.clone()));
    append_cookie(response, &session_cookie(REFRESH_COOKIE, tokens.refresh_token.clone()));
}

fn append_cookie(response: &mut Response, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(v) => {
            response.headers_mut().append(header::SET_COOKIE, v);
        }
        Err(e) => warn!("Could not encode cookie {}: {}", cookie.name(), e),
    }
}
