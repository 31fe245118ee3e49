//! Persistence for surveys and their questions.

use super::{options, NewSurvey, SurveyError};
use crate::orm::{answers, questions, responses, surveys};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult,
    Statement, TransactionTrait,
};
use serde::Serialize;

/// Inserts a validated survey and its questions in one transaction.
/// Questions keep the order they were submitted in.
pub async fn create_survey(
    db: &DatabaseConnection,
    owner_id: i32,
    survey: NewSurvey,
) -> Result<surveys::Model, SurveyError> {
    let now = chrono::Utc::now().naive_utc();
    let txn = db.begin().await?;

    let created = surveys::ActiveModel {
        user_id: Set(owner_id),
        title: Set(survey.title),
        description: Set(survey.description),
        publish: Set(survey.publish),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for (position, question) in survey.questions.into_iter().enumerate() {
        questions::ActiveModel {
            survey_id: Set(created.id),
            position: Set(position as i32),
            text: Set(question.text),
            qtype: Set(question.kind.tag().to_string()),
            required: Set(question.required),
            allowed_types: Set(question.allowed_types.map(|list| options::encode_list(&list))),
            max_size_mb: Set(question.max_size_mb),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    log::info!(
        "Survey {} created by user {} (published: {})",
        created.id,
        owner_id,
        created.publish
    );
    Ok(created)
}

pub async fn find_survey(
    db: &DatabaseConnection,
    survey_id: i32,
) -> Result<surveys::Model, SurveyError> {
    surveys::Entity::find_by_id(survey_id)
        .one(db)
        .await?
        .ok_or_else(SurveyError::survey_not_found)
}

/// Loads a survey the caller must own. 404 before 403.
pub async fn find_owned_survey(
    db: &DatabaseConnection,
    survey_id: i32,
    owner_id: i32,
) -> Result<surveys::Model, SurveyError> {
    let survey = find_survey(db, survey_id).await?;
    if survey.user_id != owner_id {
        log::warn!(
            "User {} attempted to manage survey {} owned by {}",
            owner_id,
            survey_id,
            survey.user_id
        );
        return Err(SurveyError::Forbidden(
            "You do not own this survey".to_string(),
        ));
    }
    Ok(survey)
}

/// Questions of a survey in submission order.
pub async fn load_questions<C: ConnectionTrait>(
    db: &C,
    survey_id: i32,
) -> Result<Vec<questions::Model>, SurveyError> {
    Ok(questions::Entity::find()
        .filter(questions::Column::SurveyId.eq(survey_id))
        .order_by_asc(questions::Column::Position)
        .order_by_asc(questions::Column::Id)
        .all(db)
        .await?)
}

/// Published surveys are open to everyone; drafts only to their owner.
pub fn can_view(survey: &surveys::Model, viewer: Option<i32>) -> bool {
    survey.publish || viewer == Some(survey.user_id)
}

#[derive(Debug, Serialize)]
pub struct SurveyHeader {
    pub id: i32,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionSchema {
    pub id: i32,
    pub text: String,
    #[serde(rename = "type")]
    pub qtype: String,
    pub required: bool,
    /// Option labels, or accepted extensions for uploads.
    pub options: Vec<String>,
    pub max_size_mb: Option<i32>,
}

impl From<questions::Model> for QuestionSchema {
    fn from(q: questions::Model) -> Self {
        Self {
            options: options::parse_list(q.allowed_types.as_deref()),
            id: q.id,
            text: q.text,
            qtype: q.qtype,
            required: q.required,
            max_size_mb: q.max_size_mb,
        }
    }
}

/// What a respondent needs to render a survey.
#[derive(Debug, Serialize)]
pub struct SurveySchema {
    pub survey: SurveyHeader,
    pub questions: Vec<QuestionSchema>,
}

pub async fn fetch_schema(
    db: &DatabaseConnection,
    survey_id: i32,
    viewer: Option<i32>,
) -> Result<SurveySchema, SurveyError> {
    let survey = find_survey(db, survey_id).await?;
    if !can_view(&survey, viewer) {
        return Err(SurveyError::Forbidden(
            "This survey is not published".to_string(),
        ));
    }

    let questions = load_questions(db, survey.id)
        .await?
        .into_iter()
        .map(QuestionSchema::from)
        .collect();

    Ok(SurveySchema {
        survey: SurveyHeader {
            id: survey.id,
            title: survey.title,
            description: survey.description,
        },
        questions,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    AlreadyPublished,
}

impl PublishOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            PublishOutcome::Published => "Survey published",
            PublishOutcome::AlreadyPublished => "Survey is already published",
        }
    }
}

pub async fn publish_survey(
    db: &DatabaseConnection,
    survey_id: i32,
    owner_id: i32,
) -> Result<PublishOutcome, SurveyError> {
    let survey = find_owned_survey(db, survey_id, owner_id).await?;
    if survey.publish {
        return Ok(PublishOutcome::AlreadyPublished);
    }

    let mut active: surveys::ActiveModel = survey.into();
    active.publish = Set(true);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(db).await?;

    log::info!("Survey {} published by user {}", survey_id, owner_id);
    Ok(PublishOutcome::Published)
}

/// Removes a survey with its questions, responses and answers.
pub async fn delete_survey(
    db: &DatabaseConnection,
    survey_id: i32,
    owner_id: i32,
) -> Result<(), SurveyError> {
    let survey = find_owned_survey(db, survey_id, owner_id).await?;
    let txn = db.begin().await?;

    let response_ids: Vec<i32> = responses::Entity::find()
        .filter(responses::Column::SurveyId.eq(survey.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    if !response_ids.is_empty() {
        answers::Entity::delete_many()
            .filter(answers::Column::ResponseId.is_in(response_ids))
            .exec(&txn)
            .await?;
    }
    responses::Entity::delete_many()
        .filter(responses::Column::SurveyId.eq(survey.id))
        .exec(&txn)
        .await?;
    questions::Entity::delete_many()
        .filter(questions::Column::SurveyId.eq(survey.id))
        .exec(&txn)
        .await?;
    surveys::Entity::delete_many()
        .filter(surveys::Column::Id.eq(survey.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    log::info!("Survey {} deleted by user {}", survey_id, owner_id);
    Ok(())
}

/// One dashboard row.
#[derive(Debug, Clone, FromQueryResult)]
pub struct SurveySummary {
    pub id: i32,
    pub title: String,
    pub publish: bool,
    pub created_at: chrono::NaiveDateTime,
    pub question_count: i64,
    pub response_count: i64,
}

/// The owner's surveys, newest first, with per-survey counts.
pub async fn list_for_owner(
    db: &DatabaseConnection,
    owner_id: i32,
) -> Result<Vec<SurveySummary>, SurveyError> {
    let sql = r#"
        SELECT s.id, s.title, s.publish, s.created_at,
            (SELECT COUNT(*) FROM questions q WHERE q.survey_id = s.id) AS question_count,
            (SELECT COUNT(*) FROM responses r WHERE r.survey_id = s.id) AS response_count
        FROM surveys s
        WHERE s.user_id = $1
        ORDER BY s.created_at DESC, s.id DESC
    "#;

    Ok(SurveySummary::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql,
        vec![owner_id.into()],
    ))
    .all(db)
    .await?)
}
