use super::redirect;
use crate::db::get_db_pool;
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::{rate_limit, session, user};
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DbErr;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login).service(view_login);
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub client: ClientCtx,
    pub registered: bool,
}

#[derive(Deserialize)]
pub struct FormData {
    email: String,
    password: String,
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    registered: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginResult {
    Success(i32),
    BadEmail,
    BadPassword,
}

/// Checks credentials. Emails are matched case-insensitively.
pub async fn login(email: &str, password: &str) -> Result<LoginResult, DbErr> {
    let user = match user::find_by_email(get_db_pool(), email).await? {
        Some(user) => user,
        None => return Ok(LoginResult::BadEmail),
    };

    if session::verify_password(password, &user.password) {
        Ok(LoginResult::Success(user.id))
    } else {
        Ok(LoginResult::BadPassword)
    }
}

#[post("/auth/login")]
pub async fn post_login(
    req: HttpRequest,
    cookies: actix_session::Session,
    form: web::Form<FormData>,
) -> Result<HttpResponse, Error> {
    validate_csrf_token(&cookies, &form.csrf_token)?;

    let ip = crate::ip::client_ip_or_unknown(&req);
    let email = user::normalize_email(&form.email);

    if let Err(e) = rate_limit::check_login_rate_limit(&ip, &email) {
        log::warn!("Rate limit exceeded for login: ip={}", ip);
        return Err(error::ErrorTooManyRequests(e.to_string()));
    }

    let result = login(&email, &form.password).await.map_err(|e| {
        log::error!("post_login: {}", e);
        error::ErrorInternalServerError("DB error")
    })?;

    let user_id = match result {
        LoginResult::Success(user_id) => user_id,
        failure => {
            log::debug!("login failure: {:?} for {}", failure, email);
            // Use generic message to avoid account enumeration
            return Err(error::ErrorUnauthorized("Invalid email or password."));
        }
    };

    session::log_in(&cookies, user_id)?;
    rate_limit::clear_login_attempts(&ip, &email);
    log::info!("User {} logged in", user_id);

    Ok(redirect("/survey/dashboard"))
}

#[get("/auth/login")]
pub async fn view_login(
    client: ClientCtx,
    query: web::Query<LoginQuery>,
) -> Result<impl Responder, Error> {
    if client.is_user() {
        return Ok(redirect("/survey/dashboard"));
    }

    Ok(LoginTemplate {
        client,
        registered: query.registered,
    }
    .to_response())
}
