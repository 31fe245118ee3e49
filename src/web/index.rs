use super::{login_redirect, redirect};
use crate::middleware::ClientCtx;
use actix_web::{get, HttpResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[get("/")]
pub async fn view_index(client: ClientCtx) -> HttpResponse {
    if client.is_user() {
        redirect("/survey/dashboard")
    } else {
        login_redirect()
    }
}
