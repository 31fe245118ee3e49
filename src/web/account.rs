use super::redirect;
use crate::db::get_db_pool;
use crate::email::templates::send_otp_email;
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::registration::{self, PendingRegistration, DUPLICATE_EMAIL};
use crate::survey::SurveyError;
use crate::{app_config, rate_limit, session, user};
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_register)
        .service(post_register)
        .service(view_verify_otp)
        .service(post_verify_otp)
        .service(post_resend_otp);
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub client: ClientCtx,
}

#[derive(Template)]
#[template(path = "verify_otp.html")]
pub struct VerifyOtpTemplate {
    pub client: ClientCtx,
    pub email: String,
    pub resent: bool,
}

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 255))]
    username: String,
    #[validate(email, length(max = 255))]
    email: String,
    #[validate(length(min = 8, max = 1000))]
    password: String,
    confirm_password: String,
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct OtpForm {
    otp: String,
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfForm {
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    resent: bool,
}

async fn mail_code(pending: &PendingRegistration) -> Result<(), Error> {
    let security = app_config::security();
    send_otp_email(
        &app_config::email(),
        &app_config::site().name,
        &pending.email,
        &pending.username,
        &pending.code,
        security.otp_lifetime_seconds as i64,
    )
    .await
    .map_err(|e| {
        log::error!("Failed to send verification code to {}: {}", pending.email, e);
        error::ErrorInternalServerError("Failed to send verification email")
    })
}

#[get("/auth/register")]
pub async fn view_register(client: ClientCtx) -> impl Responder {
    RegisterTemplate { client }.to_response()
}

#[post("/auth/register")]
pub async fn post_register(
    req: HttpRequest,
    cookies: actix_session::Session,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, Error> {
    validate_csrf_token(&cookies, &form.csrf_token)?;

    let ip = crate::ip::client_ip_or_unknown(&req);
    if let Err(e) = rate_limit::check_registration_rate_limit(&ip) {
        log::warn!("Rate limit exceeded for registration: ip={}", ip);
        return Err(error::ErrorTooManyRequests(format!(
            "Too many registration attempts. Please wait {} seconds.",
            e.retry_after_seconds
        )));
    }

    form.validate().map_err(|e| {
        log::debug!("User registration validation failed: {}", e);
        error::ErrorBadRequest("Invalid registration data")
    })?;
    if form.username.trim().is_empty() {
        return Err(error::ErrorBadRequest("Username is required"));
    }

    if form.password != form.confirm_password {
        return Err(error::ErrorBadRequest("Passwords do not match"));
    }

    let taken = user::email_exists(get_db_pool(), &form.email)
        .await
        .map_err(|e| {
            log::error!("post_register: {}", e);
            error::ErrorInternalServerError("DB error")
        })?;
    if taken {
        return Err(error::ErrorBadRequest(DUPLICATE_EMAIL));
    }

    let password_hash = session::hash_password(&form.password).map_err(|e| {
        log::error!("Failed to hash password: {}", e);
        error::ErrorInternalServerError("Failed to create user")
    })?;

    let security = app_config::security();
    let pending = PendingRegistration::new(
        &form.username,
        &form.email,
        password_hash,
        security.otp_length as usize,
        security.otp_lifetime_seconds as i64,
    );

    mail_code(&pending).await?;
    registration::store_pending(&cookies, &pending)?;
    log::info!("Verification code sent to {}", pending.email);

    Ok(redirect("/auth/verify-otp"))
}

#[get("/auth/verify-otp")]
pub async fn view_verify_otp(
    client: ClientCtx,
    cookies: actix_session::Session,
    query: web::Query<VerifyQuery>,
) -> Result<HttpResponse, Error> {
    let pending = match registration::load_pending(&cookies) {
        Some(pending) => pending,
        None => return Ok(redirect("/auth/register")),
    };

    Ok(VerifyOtpTemplate {
        client,
        email: pending.email,
        resent: query.resent,
    }
    .to_response())
}

#[post("/auth/verify-otp")]
pub async fn post_verify_otp(
    req: HttpRequest,
    cookies: actix_session::Session,
    form: web::Form<OtpForm>,
) -> Result<HttpResponse, Error> {
    validate_csrf_token(&cookies, &form.csrf_token)?;

    let ip = crate::ip::client_ip_or_unknown(&req);
    if let Err(e) = rate_limit::check_otp_rate_limit(&ip) {
        log::warn!("Rate limit exceeded for code verification: ip={}", ip);
        return Err(error::ErrorTooManyRequests(e.to_string()));
    }

    let pending = registration::load_pending(&cookies).ok_or_else(|| {
        error::ErrorBadRequest("No pending registration. Please register again.")
    })?;

    if let Err(rejection) = pending.check_code(&form.otp) {
        log::warn!("Code rejected for {}: {:?}", pending.email, rejection);
        return Err(error::ErrorBadRequest(rejection.message()));
    }

    match registration::create_user(get_db_pool(), &pending).await {
        Ok(_) => {}
        Err(SurveyError::Validation(msg)) => {
            registration::clear_pending(&cookies);
            return Err(error::ErrorBadRequest(msg));
        }
        Err(e) => {
            log::error!("post_verify_otp: {}", e);
            return Err(error::ErrorInternalServerError("Failed to create user"));
        }
    }

    registration::clear_pending(&cookies);
    Ok(redirect("/auth/login?registered=true"))
}

#[post("/auth/resend-otp")]
pub async fn post_resend_otp(
    req: HttpRequest,
    cookies: actix_session::Session,
    form: web::Form<CsrfForm>,
) -> Result<HttpResponse, Error> {
    validate_csrf_token(&cookies, &form.csrf_token)?;

    let ip = crate::ip::client_ip_or_unknown(&req);
    if let Err(e) = rate_limit::check_otp_rate_limit(&ip) {
        log::warn!("Rate limit exceeded for code resend: ip={}", ip);
        return Err(error::ErrorTooManyRequests(e.to_string()));
    }

    let mut pending = registration::load_pending(&cookies).ok_or_else(|| {
        error::ErrorBadRequest("No pending registration. Please register again.")
    })?;

    let security = app_config::security();
    pending.reissue(
        security.otp_length as usize,
        security.otp_lifetime_seconds as i64,
    );

    mail_code(&pending).await?;
    registration::store_pending(&cookies, &pending)?;
    log::info!("Verification code re-sent to {}", pending.email);

    Ok(redirect("/auth/verify-otp?resent=true"))
}
