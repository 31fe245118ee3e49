//! Recording a respondent's submission.

use super::{can_view, find_survey, load_questions, AnswerRules, CapturedAnswer};
use super::{SubmissionForm, SurveyError};
use crate::orm::{answers, responses};
use crate::platform::Platform;
use crate::storage::{self, StorageBackend};
use sea_orm::{entity::*, DatabaseConnection, TransactionTrait};

/// Value columns of one answer row.
#[derive(Debug, Default, PartialEq)]
struct AnswerColumns {
    text: Option<String>,
    number: Option<f64>,
    file_url: Option<String>,
}

/// Validates and stores a submission, returning the new response id.
///
/// Every answer is captured before any file is uploaded, and every upload
/// finishes before the response and its answers are written together.
pub async fn submit_response(
    db: &DatabaseConnection,
    backend: &dyn StorageBackend,
    upload_folder: &str,
    viewer: Option<i32>,
    survey_id: i32,
    platform: Platform,
    mut form: SubmissionForm,
) -> Result<i32, SurveyError> {
    let survey = find_survey(db, survey_id).await?;
    if !can_view(&survey, viewer) {
        return Err(SurveyError::Forbidden(
            "This survey is not published".to_string(),
        ));
    }

    let questions = load_questions(db, survey.id).await?;

    let mut captured = Vec::with_capacity(questions.len());
    for question in &questions {
        let rules = AnswerRules::from(question);
        let file = form.take_file(question.id);
        let answer = rules.capture(form.values_for(question.id), file)?;
        captured.push((rules, answer));
    }

    let mut rows = Vec::with_capacity(captured.len());
    for (rules, answer) in captured {
        let columns = match answer {
            CapturedAnswer::Empty => AnswerColumns::default(),
            CapturedAnswer::Text(text) => AnswerColumns {
                text: Some(text),
                ..Default::default()
            },
            CapturedAnswer::Number(number) => AnswerColumns {
                number: Some(number),
                ..Default::default()
            },
            CapturedAnswer::PendingFile(file) => {
                let extension = file.extension();
                let url = storage::store_file(
                    backend,
                    upload_folder,
                    file.data,
                    extension.as_deref(),
                    file.content_type.as_deref(),
                )
                .await
                .map_err(|e| {
                    log::error!(
                        "Upload for question {} of survey {} failed: {}",
                        rules.question_id,
                        survey.id,
                        e
                    );
                    SurveyError::Upstream(format!("File upload failed for \"{}\"", rules.text))
                })?;
                AnswerColumns {
                    file_url: Some(url),
                    ..Default::default()
                }
            }
        };
        rows.push((rules.question_id, columns));
    }

    let txn = db.begin().await?;

    let response = responses::ActiveModel {
        survey_id: Set(survey.id),
        user_id: Set(viewer),
        submitted_at: Set(chrono::Utc::now().naive_utc()),
        platform: Set(Some(platform.label().to_string())),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for (question_id, columns) in rows {
        answers::ActiveModel {
            response_id: Set(response.id),
            question_id: Set(question_id),
            answer_text: Set(columns.text),
            answer_number: Set(columns.number),
            file_url: Set(columns.file_url),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    log::info!(
        "Response {} recorded for survey {} via {}",
        response.id,
        survey.id,
        platform
    );
    Ok(response.id)
}
