use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;

/// Errors raised by survey operations.
#[derive(Debug)]
pub enum SurveyError {
    /// Malformed or missing input
    Validation(String),
    /// Caller is not logged in
    Unauthorized,
    /// Caller may not access the survey
    Forbidden(String),
    /// Unknown survey or question
    NotFound(String),
    /// A service we depend on (storage, email) failed
    Upstream(String),
    /// Database failure
    Database(DbErr),
}

impl SurveyError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SurveyError::Validation(msg.into())
    }

    pub fn survey_not_found() -> Self {
        SurveyError::NotFound("Survey not found".to_string())
    }

    /// Message safe to show to the client.
    pub fn public_message(&self) -> String {
        match self {
            SurveyError::Validation(msg)
            | SurveyError::Forbidden(msg)
            | SurveyError::NotFound(msg)
            | SurveyError::Upstream(msg) => msg.clone(),
            SurveyError::Unauthorized => "Login required".to_string(),
            SurveyError::Database(_) => "Database error".to_string(),
        }
    }
}

impl std::fmt::Display for SurveyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyError::Validation(msg) => write!(f, "Validation error: {}", msg),
            SurveyError::Unauthorized => write!(f, "Login required"),
            SurveyError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            SurveyError::NotFound(msg) => write!(f, "Not found: {}", msg),
            SurveyError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            SurveyError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for SurveyError {}

impl From<DbErr> for SurveyError {
    fn from(e: DbErr) -> Self {
        SurveyError::Database(e)
    }
}

impl ResponseError for SurveyError {
    fn status_code(&self) -> StatusCode {
        match self {
            SurveyError::Validation(_) => StatusCode::BAD_REQUEST,
            SurveyError::Unauthorized => StatusCode::UNAUTHORIZED,
            SurveyError::Forbidden(_) => StatusCode::FORBIDDEN,
            SurveyError::NotFound(_) => StatusCode::NOT_FOUND,
            SurveyError::Upstream(_) | SurveyError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            SurveyError::Database(e) => log::error!("survey database error: {}", e),
            SurveyError::Upstream(msg) => log::error!("survey upstream error: {}", msg),
            _ => {}
        }

        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.public_message() }))
    }
}
