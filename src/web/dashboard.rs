use super::login_redirect;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::survey::{self, SurveySummary};
use actix_web::{error, get, Error, HttpResponse};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard);
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub client: ClientCtx,
    pub surveys: Vec<SurveySummary>,
    pub total_responses: i64,
}

#[get("/survey/dashboard")]
pub async fn view_dashboard(client: ClientCtx) -> Result<HttpResponse, Error> {
    let owner_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(login_redirect()),
    };

    let surveys = survey::list_for_owner(get_db_pool(), owner_id)
        .await
        .map_err(|e| {
            log::error!("view_dashboard: {}", e);
            error::ErrorInternalServerError("DB error")
        })?;
    let total_responses = surveys.iter().map(|s| s.response_count).sum();

    Ok(DashboardTemplate {
        client,
        surveys,
        total_responses,
    }
    .to_response())
}
