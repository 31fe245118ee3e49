use super::login_redirect;
use crate::session;
use actix_web::{get, post, HttpResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_logout).service(post_logout);
}

#[get("/auth/logout")]
pub async fn view_logout(cookies: actix_session::Session) -> HttpResponse {
    session::log_out(&cookies);
    login_redirect()
}

#[post("/auth/logout")]
pub async fn post_logout(cookies: actix_session::Session) -> HttpResponse {
    session::log_out(&cookies);
    login_redirect()
}
