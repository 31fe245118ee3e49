use std::fmt;

/// Question type tag, governing validation and answer shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestionKind {
    TextResponse,
    MultipleChoice,
    Checkboxes,
    Rating,
    Slider,
    DatePicker,
    FileUpload,
    MultipleSelection,
    /// Any other tag. Treated as free text.
    Other(String),
}

impl QuestionKind {
    /// The known kinds in the order the editor offers them.
    pub const KNOWN: [QuestionKind; 8] = [
        QuestionKind::TextResponse,
        QuestionKind::MultipleChoice,
        QuestionKind::Checkboxes,
        QuestionKind::Rating,
        QuestionKind::Slider,
        QuestionKind::DatePicker,
        QuestionKind::FileUpload,
        QuestionKind::MultipleSelection,
    ];

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "Text Response" => QuestionKind::TextResponse,
            "Multiple Choice" => QuestionKind::MultipleChoice,
            "Checkboxes" => QuestionKind::Checkboxes,
            // Older clients sent a plain hyphen.
            "Rating (1–5)" | "Rating (1-5)" => QuestionKind::Rating,
            "Slider/Range" => QuestionKind::Slider,
            "Date Picker" => QuestionKind::DatePicker,
            "File Upload" => QuestionKind::FileUpload,
            "Multiple Selection" => QuestionKind::MultipleSelection,
            other => QuestionKind::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            QuestionKind::TextResponse => "Text Response",
            QuestionKind::MultipleChoice => "Multiple Choice",
            QuestionKind::Checkboxes => "Checkboxes",
            QuestionKind::Rating => "Rating (1–5)",
            QuestionKind::Slider => "Slider/Range",
            QuestionKind::DatePicker => "Date Picker",
            QuestionKind::FileUpload => "File Upload",
            QuestionKind::MultipleSelection => "Multiple Selection",
            QuestionKind::Other(tag) => tag,
        }
    }

    /// Kinds whose configuration is a list of option labels.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            QuestionKind::MultipleChoice | QuestionKind::Checkboxes | QuestionKind::MultipleSelection
        )
    }

    /// Kinds that accept more than one selected option.
    pub fn is_multi_select(&self) -> bool {
        matches!(
            self,
            QuestionKind::Checkboxes | QuestionKind::MultipleSelection
        )
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
