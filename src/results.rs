//! Owner-facing results: responses grouped by referral platform.

use crate::orm::{answers, questions, responses, surveys, users};
use crate::platform::Platform;
use crate::survey::{find_owned_survey, load_questions, options, SurveyError};
use sea_orm::{entity::*, query::*, DatabaseConnection};
use std::collections::HashMap;

/// One answer as shown to the survey owner.
#[derive(Clone, Debug)]
pub struct AnswerView {
    pub question: String,
    pub kind: String,
    pub value: Option<String>,
    pub file_url: Option<String>,
    /// Option labels of the question, for context.
    pub options: Vec<String>,
}

impl AnswerView {
    fn new(question: &questions::Model, answer: Option<&answers::Model>) -> Self {
        let value = answer.and_then(|a| {
            a.answer_text
                .clone()
                .or_else(|| a.answer_number.map(|n| n.to_string()))
        });
        Self {
            question: question.text.clone(),
            kind: question.qtype.clone(),
            value,
            file_url: answer.and_then(|a| a.file_url.clone()),
            options: options::parse_list(question.allowed_types.as_deref()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResponseView {
    pub id: i32,
    pub respondent: String,
    pub submitted_at: chrono::NaiveDateTime,
    pub platform: Platform,
    pub answers: Vec<AnswerView>,
}

#[derive(Clone, Debug)]
pub struct PlatformGroup {
    pub platform: Platform,
    pub responses: Vec<ResponseView>,
}

impl PlatformGroup {
    pub fn count(&self) -> usize {
        self.responses.len()
    }
}

#[derive(Clone, Debug)]
pub struct SurveyResults {
    pub survey: surveys::Model,
    pub total: usize,
    pub groups: Vec<PlatformGroup>,
}

/// Groups responses in platform order, newest first within each group.
/// Platforms without responses are left out.
pub fn group_by_platform(responses: Vec<ResponseView>) -> Vec<PlatformGroup> {
    let mut buckets: HashMap<Platform, Vec<ResponseView>> = HashMap::new();
    for response in responses {
        buckets.entry(response.platform).or_default().push(response);
    }

    Platform::ALL
        .iter()
        .filter_map(|platform| {
            let mut responses = buckets.remove(platform)?;
            responses.sort_by(|a, b| {
                b.submitted_at
                    .cmp(&a.submitted_at)
                    .then_with(|| b.id.cmp(&a.id))
            });
            Some(PlatformGroup {
                platform: *platform,
                responses,
            })
        })
        .collect()
}

pub async fn survey_results(
    db: &DatabaseConnection,
    survey_id: i32,
    owner_id: i32,
) -> Result<SurveyResults, SurveyError> {
    let survey = find_owned_survey(db, survey_id, owner_id).await?;
    let questions = load_questions(db, survey.id).await?;

    let response_rows = responses::Entity::find()
        .filter(responses::Column::SurveyId.eq(survey.id))
        .all(db)
        .await?;

    let response_ids: Vec<i32> = response_rows.iter().map(|r| r.id).collect();
    let mut answers_by_response: HashMap<(i32, i32), answers::Model> = HashMap::new();
    if !response_ids.is_empty() {
        for answer in answers::Entity::find()
            .filter(answers::Column::ResponseId.is_in(response_ids))
            .all(db)
            .await?
        {
            answers_by_response.insert((answer.response_id, answer.question_id), answer);
        }
    }

    let user_ids: Vec<i32> = response_rows.iter().filter_map(|r| r.user_id).collect();
    let usernames: HashMap<i32, String> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect()
    };

    let views: Vec<ResponseView> = response_rows
        .into_iter()
        .map(|response| {
            let answers = questions
                .iter()
                .map(|q| AnswerView::new(q, answers_by_response.get(&(response.id, q.id))))
                .collect();
            let respondent = response
                .user_id
                .and_then(|id| usernames.get(&id).cloned())
                .unwrap_or_else(|| crate::constants::GUEST_USERNAME.to_string());
            ResponseView {
                id: response.id,
                respondent,
                submitted_at: response.submitted_at,
                platform: Platform::from_label(response.platform.as_deref()),
                answers,
            }
        })
        .collect();

    let total = views.len();
    Ok(SurveyResults {
        survey,
        total,
        groups: group_by_platform(views),
    })
}
