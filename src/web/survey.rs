use super::login_redirect;
use crate::db::get_db_pool;
use crate::middleware::csrf::validate_csrf_header;
use crate::middleware::ClientCtx;
use crate::survey::{self, QuestionKind, SurveyError, SurveyPayload};
use actix_web::{get, post, web, HttpRequest, HttpResponse, ResponseError};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_create)
        .service(save_survey)
        .service(publish_survey)
        .service(delete_survey)
        .service(fetch_questions);
}

#[derive(Template)]
#[template(path = "survey_create.html")]
pub struct CreateSurveyTemplate {
    pub client: ClientCtx,
    pub kinds: Vec<String>,
}

#[derive(Deserialize)]
pub struct SurveyRef {
    survey_id: i32,
}

/// Owner endpoints require a login and the CSRF header.
fn require_owner(
    client: &ClientCtx,
    req: &HttpRequest,
    cookies: &actix_session::Session,
) -> Result<i32, SurveyError> {
    let user_id = client.get_id().ok_or(SurveyError::Unauthorized)?;
    validate_csrf_header(req, cookies)
        .map_err(|_| SurveyError::Forbidden("Invalid CSRF token".to_string()))?;
    Ok(user_id)
}

/// `{success: false, error}` with the error's status.
fn failure(e: SurveyError) -> HttpResponse {
    HttpResponse::build(e.status_code()).json(json!({
        "success": false,
        "error": e.public_message(),
    }))
}

#[get("/survey/create")]
pub async fn view_create(client: ClientCtx) -> HttpResponse {
    if !client.is_user() {
        return login_redirect();
    }

    CreateSurveyTemplate {
        client,
        kinds: QuestionKind::KNOWN.iter().map(|k| k.tag().to_string()).collect(),
    }
    .to_response()
}

#[post("/survey/save")]
pub async fn save_survey(
    client: ClientCtx,
    req: HttpRequest,
    cookies: actix_session::Session,
    payload: web::Json<SurveyPayload>,
) -> Result<HttpResponse, SurveyError> {
    let owner_id = require_owner(&client, &req, &cookies)?;

    let new_survey = survey::validate_survey(&payload).map_err(|e| {
        log::debug!("Survey rejected for user {}: {}", owner_id, e);
        e
    })?;
    let created = survey::create_survey(get_db_pool(), owner_id, new_survey).await?;

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "survey_id": created.id,
        "redirect": "/survey/dashboard",
    })))
}

#[post("/survey/publish")]
pub async fn publish_survey(
    client: ClientCtx,
    req: HttpRequest,
    cookies: actix_session::Session,
    body: web::Json<SurveyRef>,
) -> HttpResponse {
    let owner_id = match require_owner(&client, &req, &cookies) {
        Ok(id) => id,
        Err(e) => return failure(e),
    };

    match survey::publish_survey(get_db_pool(), body.survey_id, owner_id).await {
        Ok(outcome) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": outcome.message(),
        })),
        Err(e) => failure(e),
    }
}

#[post("/survey/delete")]
pub async fn delete_survey(
    client: ClientCtx,
    req: HttpRequest,
    cookies: actix_session::Session,
    body: web::Json<SurveyRef>,
) -> HttpResponse {
    let owner_id = match require_owner(&client, &req, &cookies) {
        Ok(id) => id,
        Err(e) => return failure(e),
    };

    match survey::delete_survey(get_db_pool(), body.survey_id, owner_id).await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Survey deleted",
        })),
        Err(e) => failure(e),
    }
}

/// Open to respondents; no CSRF header required.
#[post("/survey/fetch-questions")]
pub async fn fetch_questions(
    client: ClientCtx,
    body: web::Json<SurveyRef>,
) -> Result<HttpResponse, SurveyError> {
    let schema = survey::fetch_schema(get_db_pool(), body.survey_id, client.get_id()).await?;
    Ok(HttpResponse::Ok().json(schema))
}
