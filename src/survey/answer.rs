//! Submission-time coercion of raw form input into answer values.

use super::validate::FILE_EXTENSION;
use super::{options, QuestionKind, SurveyError};
use crate::constants::{ANSWER_FIELD_PREFIX, RATING_MAX, RATING_MIN};
use crate::orm::questions;
use std::collections::HashMap;

/// A file part received with a submission.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Lower-cased extension including the dot, e.g. `.pdf`.
    ///
    /// Only plain alphanumeric extensions count; anything else (separators,
    /// URL metacharacters) yields `None` so it never reaches a storage key.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.filename.rsplit_once('.')?;
        let ext = format!(".{}", ext.to_lowercase());
        if stem.is_empty() || !FILE_EXTENSION.is_match(&ext) {
            return None;
        }
        Some(ext)
    }
}

/// Raw fields of one submission, keyed by form field name.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub values: HashMap<String, Vec<String>>,
    pub files: HashMap<String, UploadedFile>,
}

impl SubmissionForm {
    pub fn field_name(question_id: i32) -> String {
        format!("{}{}", ANSWER_FIELD_PREFIX, question_id)
    }

    pub fn push_value(&mut self, name: &str, value: String) {
        self.values.entry(name.to_string()).or_default().push(value);
    }

    /// Browsers send an empty part for an untouched file input; those are dropped.
    pub fn insert_file(&mut self, name: &str, file: UploadedFile) {
        if !file.data.is_empty() {
            self.files.insert(name.to_string(), file);
        }
    }

    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn values_for(&self, question_id: i32) -> &[String] {
        self.values
            .get(&Self::field_name(question_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn take_file(&mut self, question_id: i32) -> Option<UploadedFile> {
        self.files.remove(&Self::field_name(question_id))
    }
}

/// What a question needs to know to judge an answer.
#[derive(Clone, Debug)]
pub struct AnswerRules {
    pub question_id: i32,
    pub text: String,
    pub kind: QuestionKind,
    pub required: bool,
    /// Option labels for choice kinds, extensions for uploads.
    pub allowed: Vec<String>,
    pub max_size_mb: Option<i32>,
}

impl From<&questions::Model> for AnswerRules {
    fn from(q: &questions::Model) -> Self {
        Self {
            question_id: q.id,
            text: q.text.clone(),
            kind: QuestionKind::from_tag(&q.qtype),
            required: q.required,
            allowed: options::parse_list(q.allowed_types.as_deref()),
            max_size_mb: q.max_size_mb,
        }
    }
}

/// A coerced answer. Files are uploaded after every answer has been captured.
#[derive(Clone, Debug, PartialEq)]
pub enum CapturedAnswer {
    Empty,
    Text(String),
    Number(f64),
    PendingFile(UploadedFile),
}

impl AnswerRules {
    fn required_error(&self) -> SurveyError {
        SurveyError::validation(format!("\"{}\" is required", self.text))
    }

    /// Coerces the raw input for this question.
    pub fn capture(
        &self,
        values: &[String],
        file: Option<UploadedFile>,
    ) -> Result<CapturedAnswer, SurveyError> {
        match self.kind {
            QuestionKind::FileUpload => self.capture_file(file),
            QuestionKind::Rating => self.capture_rating(first_filled(values)),
            QuestionKind::Slider => self.capture_slider(first_filled(values)),
            QuestionKind::MultipleChoice => self.capture_choice(first_filled(values)),
            QuestionKind::Checkboxes | QuestionKind::MultipleSelection => {
                self.capture_selection(values)
            }
            QuestionKind::TextResponse | QuestionKind::DatePicker | QuestionKind::Other(_) => {
                match first_filled(values) {
                    Some(text) => Ok(CapturedAnswer::Text(text.to_string())),
                    None if self.required => Err(self.required_error()),
                    None => Ok(CapturedAnswer::Empty),
                }
            }
        }
    }

    fn capture_file(&self, file: Option<UploadedFile>) -> Result<CapturedAnswer, SurveyError> {
        let file = match file {
            Some(file) => file,
            None if self.required => return Err(self.required_error()),
            None => return Ok(CapturedAnswer::Empty),
        };

        if !self.allowed.is_empty() {
            let accepted = file
                .extension()
                .map(|ext| self.allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
                .unwrap_or(false);
            if !accepted {
                return Err(SurveyError::validation(format!(
                    "\"{}\" accepts only {} files",
                    self.text,
                    self.allowed.join(", ")
                )));
            }
        }

        if let Some(max_mb) = self.max_size_mb {
            let limit = max_mb.max(0) as usize * 1024 * 1024;
            if file.data.len() > limit {
                return Err(SurveyError::validation(format!(
                    "\"{}\" must be at most {} MB",
                    self.text, max_mb
                )));
            }
        }

        Ok(CapturedAnswer::PendingFile(file))
    }

    fn capture_rating(&self, raw: Option<&str>) -> Result<CapturedAnswer, SurveyError> {
        let raw = match raw {
            Some(raw) => raw,
            None if self.required => return Err(self.required_error()),
            None => return Ok(CapturedAnswer::Empty),
        };

        match raw.parse::<i64>() {
            Ok(rating) if (RATING_MIN..=RATING_MAX).contains(&rating) => {
                Ok(CapturedAnswer::Number(rating as f64))
            }
            _ => Err(SurveyError::validation(format!(
                "Invalid rating for \"{}\": expected a whole number from {} to {}",
                self.text, RATING_MIN, RATING_MAX
            ))),
        }
    }

    fn capture_slider(&self, raw: Option<&str>) -> Result<CapturedAnswer, SurveyError> {
        let raw = match raw {
            Some(raw) => raw,
            None if self.required => return Err(self.required_error()),
            None => return Ok(CapturedAnswer::Empty),
        };

        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(CapturedAnswer::Number(value)),
            _ => Err(SurveyError::validation(format!(
                "Invalid value for \"{}\": expected a number",
                self.text
            ))),
        }
    }

    fn capture_choice(&self, raw: Option<&str>) -> Result<CapturedAnswer, SurveyError> {
        match raw {
            Some(choice) => {
                self.check_option(choice)?;
                Ok(CapturedAnswer::Text(choice.to_string()))
            }
            None if self.required => Err(self.required_error()),
            None => Ok(CapturedAnswer::Empty),
        }
    }

    fn capture_selection(&self, values: &[String]) -> Result<CapturedAnswer, SurveyError> {
        let selected: Vec<&str> = values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect();

        if selected.is_empty() {
            return if self.required {
                Err(self.required_error())
            } else {
                Ok(CapturedAnswer::Empty)
            };
        }

        for choice in &selected {
            self.check_option(choice)?;
        }
        Ok(CapturedAnswer::Text(selected.join(",")))
    }

    /// Questions saved without options accept any value.
    fn check_option(&self, choice: &str) -> Result<(), SurveyError> {
        if self.allowed.is_empty() || self.allowed.iter().any(|o| o == choice) {
            Ok(())
        } else {
            Err(SurveyError::validation(format!(
                "\"{}\" is not an option for \"{}\"",
                choice, self.text
            )))
        }
    }
}

/// First value that is not blank, trimmed.
fn first_filled(values: &[String]) -> Option<&str> {
    values.iter().map(|v| v.trim()).find(|v| !v.is_empty())
}
