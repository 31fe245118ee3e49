//! Surveys: authoring, storage, answer capture and submission.

mod answer;
mod error;
mod kind;
pub mod options;
mod store;
mod submit;
mod validate;

pub use answer::{AnswerRules, CapturedAnswer, SubmissionForm, UploadedFile};
pub use error::SurveyError;
pub use kind::QuestionKind;
pub use store::{
    can_view, create_survey, delete_survey, fetch_schema, find_owned_survey, find_survey,
    list_for_owner, load_questions, publish_survey, PublishOutcome, QuestionSchema,
    SurveyHeader, SurveySchema, SurveySummary,
};
pub use submit::submit_response;
pub use validate::{
    validate_question, validate_survey, NewQuestion, NewSurvey, QuestionSpec, SurveyInfo,
    SurveyPayload,
};
