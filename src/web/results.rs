use super::login_redirect;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::results::{survey_results, SurveyResults};
use actix_web::{get, web, HttpResponse};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_results);
}

#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate {
    pub client: ClientCtx,
    pub results: SurveyResults,
}

#[get("/survey/results/{survey_id}")]
pub async fn view_results(
    client: ClientCtx,
    path: web::Path<i32>,
) -> Result<HttpResponse, crate::survey::SurveyError> {
    let owner_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(login_redirect()),
    };

    let results = survey_results(get_db_pool(), path.into_inner(), owner_id).await?;
    Ok(ResultsTemplate { client, results }.to_response())
}
