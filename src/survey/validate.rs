//! Creation-time validation of a survey and its questions.
//!
//! Everything here runs in memory. A payload either validates completely
//! into a [`NewSurvey`] or is rejected before anything touches the database.

use super::{QuestionKind, SurveyError};
use crate::constants::{
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, MAX_UPLOAD_SIZE_MB, MIN_UPLOAD_SIZE_MB,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Longest tag the `qtype` column holds.
const MAX_TAG_LENGTH: usize = 50;

pub(super) static FILE_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\.[A-Za-z0-9]+$").expect("file extension pattern"));

/// Body of `POST /survey/save`.
#[derive(Debug, Default, Deserialize)]
pub struct SurveyPayload {
    #[serde(default)]
    pub info: SurveyInfo,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SurveyInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub publish: bool,
}

/// One question as sent by the editor.
///
/// `allowed_types` and `max_size_mb` stay loosely typed so that a wrong
/// shape is reported against the question instead of failing the whole body.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionSpec {
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "type")]
    pub qtype: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_types: Option<serde_json::Value>,
    #[serde(default)]
    pub max_size_mb: Option<serde_json::Value>,
}

/// A survey that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSurvey {
    pub title: String,
    pub description: String,
    pub publish: bool,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub text: String,
    pub kind: QuestionKind,
    pub required: bool,
    /// Extensions for uploads, option labels for choice kinds.
    pub allowed_types: Option<Vec<String>>,
    pub max_size_mb: Option<i32>,
}

pub fn validate_survey(payload: &SurveyPayload) -> Result<NewSurvey, SurveyError> {
    let title = payload.info.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
        return Err(SurveyError::validation(format!(
            "Title is required (≤{} chars)",
            MAX_TITLE_LENGTH
        )));
    }

    let description = payload.info.description.as_deref().unwrap_or("").trim();
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(SurveyError::validation(format!(
            "Description must be ≤{} chars",
            MAX_DESCRIPTION_LENGTH
        )));
    }

    if payload.questions.is_empty() {
        return Err(SurveyError::validation("At least one question required"));
    }

    let questions = payload
        .questions
        .iter()
        .enumerate()
        .map(|(idx, spec)| validate_question(idx + 1, spec))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NewSurvey {
        title: title.to_string(),
        description: description.to_string(),
        publish: payload.info.publish,
        questions,
    })
}

/// Validates one question. `idx` is 1-based and appears in every error.
pub fn validate_question(idx: usize, spec: &QuestionSpec) -> Result<NewQuestion, SurveyError> {
    let text = spec.text.trim();
    if text.is_empty() {
        return Err(SurveyError::validation(format!(
            "Question {}: text required",
            idx
        )));
    }

    let tag = spec.qtype.trim();
    if tag.is_empty() {
        return Err(SurveyError::validation(format!(
            "Question {}: type required",
            idx
        )));
    }
    if tag.chars().count() > MAX_TAG_LENGTH {
        return Err(SurveyError::validation(format!(
            "Question {}: type must be ≤{} chars",
            idx, MAX_TAG_LENGTH
        )));
    }
    let kind = QuestionKind::from_tag(tag);

    let (allowed_types, max_size_mb) = match &kind {
        QuestionKind::FileUpload => {
            let extensions = file_extensions(spec.allowed_types.as_ref()).ok_or_else(|| {
                SurveyError::validation(format!("Question {}: invalid file types", idx))
            })?;
            let max_mb = upload_limit(spec.max_size_mb.as_ref()).ok_or_else(|| {
                SurveyError::validation(format!(
                    "Question {}: max_size_mb must be {}–{}",
                    idx, MIN_UPLOAD_SIZE_MB, MAX_UPLOAD_SIZE_MB
                ))
            })?;
            (Some(extensions), Some(max_mb))
        }
        k if k.is_choice() => {
            let options = choice_options(spec);
            if options.is_empty() {
                return Err(SurveyError::validation(format!(
                    "Question {}: at least one option required",
                    idx
                )));
            }
            (Some(options), None)
        }
        _ => (None, None),
    };

    Ok(NewQuestion {
        text: text.to_string(),
        kind,
        required: spec.required,
        allowed_types,
        max_size_mb,
    })
}

/// A missing list means any extension. Any entry failing the pattern,
/// or a value that is not a list of strings, is rejected.
fn file_extensions(value: Option<&serde_json::Value>) -> Option<Vec<String>> {
    let items = match value {
        None | Some(serde_json::Value::Null) => return Some(Vec::new()),
        Some(serde_json::Value::Array(items)) => items,
        Some(_) => return None,
    };

    items
        .iter()
        .map(|item| match item.as_str() {
            Some(ext) if FILE_EXTENSION.is_match(ext) => Some(ext.to_lowercase()),
            _ => None,
        })
        .collect()
}

/// Only a JSON integer within bounds is accepted; `5.0` and `"5"` are not.
fn upload_limit(value: Option<&serde_json::Value>) -> Option<i32> {
    let mb = value?.as_i64()?;
    if (MIN_UPLOAD_SIZE_MB..=MAX_UPLOAD_SIZE_MB).contains(&mb) {
        i32::try_from(mb).ok()
    } else {
        None
    }
}

/// Options come from `options`, falling back to `allowed_types` for
/// editors that reuse that field.
fn choice_options(spec: &QuestionSpec) -> Vec<String> {
    let raw: Vec<String> = match (&spec.options, &spec.allowed_types) {
        (Some(options), _) => options.clone(),
        (None, Some(serde_json::Value::Array(items))) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> SurveyPayload {
        serde_json::from_value(value).unwrap()
    }

    fn error_message(result: Result<NewSurvey, SurveyError>) -> String {
        match result {
            Err(SurveyError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_minimal_rating_survey() {
        let survey = validate_survey(&payload(json!({
            "info": {"title": "Feedback", "description": "", "publish": false},
            "questions": [{"text": "Rate us", "type": "Rating (1–5)", "required": true}]
        })))
        .unwrap();

        assert_eq!(survey.title, "Feedback");
        assert_eq!(survey.description, "");
        assert!(!survey.publish);
        assert_eq!(survey.questions.len(), 1);
        assert_eq!(survey.questions[0].kind, QuestionKind::Rating);
        assert!(survey.questions[0].required);
        assert_eq!(survey.questions[0].allowed_types, None);
    }

    #[test]
    fn test_title_rules() {
        let blank = payload(json!({"info": {"title": "   "}, "questions": [{"text": "a", "type": "Text Response"}]}));
        assert!(error_message(validate_survey(&blank)).starts_with("Title is required"));

        let long = payload(json!({
            "info": {"title": "x".repeat(256)},
            "questions": [{"text": "a", "type": "Text Response"}]
        }));
        assert!(validate_survey(&long).is_err());

        let exact = payload(json!({
            "info": {"title": "é".repeat(255)},
            "questions": [{"text": "a", "type": "Text Response"}]
        }));
        assert!(validate_survey(&exact).is_ok());
    }

    #[test]
    fn test_description_limit() {
        let long = payload(json!({
            "info": {"title": "T", "description": "d".repeat(2001)},
            "questions": [{"text": "a", "type": "Text Response"}]
        }));
        assert_eq!(
            error_message(validate_survey(&long)),
            "Description must be ≤2000 chars"
        );
    }

    #[test]
    fn test_requires_a_question() {
        let empty = payload(json!({"info": {"title": "T"}, "questions": []}));
        assert_eq!(
            error_message(validate_survey(&empty)),
            "At least one question required"
        );
    }

    #[test]
    fn test_question_index_in_errors() {
        let p = payload(json!({
            "info": {"title": "T"},
            "questions": [
                {"text": "fine", "type": "Text Response"},
                {"text": "  ", "type": "Text Response"}
            ]
        }));
        assert_eq!(error_message(validate_survey(&p)), "Question 2: text required");
    }

    #[test]
    fn test_file_upload_extensions() {
        for bad in [json!(["pdf"]), json!([".p df"]), json!([".pdf", "*.png"]), json!([""]), json!(".pdf")] {
            let spec: QuestionSpec = serde_json::from_value(json!({
                "text": "CV", "type": "File Upload", "allowed_types": bad, "max_size_mb": 5
            }))
            .unwrap();
            match validate_question(3, &spec) {
                Err(SurveyError::Validation(msg)) => assert_eq!(msg, "Question 3: invalid file types"),
                other => panic!("expected rejection, got {:?}", other),
            }
        }

        let spec: QuestionSpec = serde_json::from_value(json!({
            "text": "CV", "type": "File Upload", "allowed_types": [".PDF", ".docx"], "max_size_mb": 5
        }))
        .unwrap();
        let q = validate_question(1, &spec).unwrap();
        assert_eq!(
            q.allowed_types,
            Some(vec![".pdf".to_string(), ".docx".to_string()])
        );
        assert_eq!(q.max_size_mb, Some(5));
    }

    #[test]
    fn test_file_upload_size_limit() {
        for bad in [json!(0), json!(101), json!(5.5), json!("5"), json!(null)] {
            let spec: QuestionSpec = serde_json::from_value(json!({
                "text": "CV", "type": "File Upload", "allowed_types": [".pdf"], "max_size_mb": bad
            }))
            .unwrap();
            match validate_question(1, &spec) {
                Err(SurveyError::Validation(msg)) => {
                    assert_eq!(msg, "Question 1: max_size_mb must be 1–100")
                }
                other => panic!("expected rejection, got {:?}", other),
            }
        }

        for good in [1, 100] {
            let spec: QuestionSpec = serde_json::from_value(json!({
                "text": "CV", "type": "File Upload", "max_size_mb": good
            }))
            .unwrap();
            let q = validate_question(1, &spec).unwrap();
            assert_eq!(q.max_size_mb, Some(good));
            assert_eq!(q.allowed_types, Some(Vec::new()));
        }
    }

    #[test]
    fn test_choice_questions_need_options() {
        for kind in ["Multiple Choice", "Checkboxes", "Multiple Selection"] {
            let spec: QuestionSpec = serde_json::from_value(json!({
                "text": "Pick", "type": kind, "options": ["", "  "]
            }))
            .unwrap();
            assert!(validate_question(1, &spec).is_err(), "{} accepted blank options", kind);
        }

        let spec: QuestionSpec = serde_json::from_value(json!({
            "text": "Pick", "type": "Multiple Choice", "options": [" Yes ", "", "No"]
        }))
        .unwrap();
        assert_eq!(
            validate_question(1, &spec).unwrap().allowed_types,
            Some(vec!["Yes".to_string(), "No".to_string()])
        );
    }

    #[test]
    fn test_choice_options_fall_back_to_allowed_types() {
        let spec: QuestionSpec = serde_json::from_value(json!({
            "text": "Pick", "type": "Checkboxes", "allowed_types": ["A", "B"]
        }))
        .unwrap();
        assert_eq!(
            validate_question(1, &spec).unwrap().allowed_types,
            Some(vec!["A".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn test_other_kinds_ignore_configuration() {
        let spec: QuestionSpec = serde_json::from_value(json!({
            "text": "When?", "type": "Date Picker", "allowed_types": ["junk"], "max_size_mb": 999
        }))
        .unwrap();
        let q = validate_question(1, &spec).unwrap();
        assert_eq!(q.kind, QuestionKind::DatePicker);
        assert_eq!(q.allowed_types, None);
        assert_eq!(q.max_size_mb, None);

        let spec: QuestionSpec =
            serde_json::from_value(json!({"text": "Sign here", "type": "Signature"})).unwrap();
        assert_eq!(
            validate_question(1, &spec).unwrap().kind,
            QuestionKind::Other("Signature".to_string())
        );
    }

    #[test]
    fn test_missing_type_rejected() {
        let spec: QuestionSpec = serde_json::from_value(json!({"text": "Hi"})).unwrap();
        match validate_question(4, &spec) {
            Err(SurveyError::Validation(msg)) => assert_eq!(msg, "Question 4: type required"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
