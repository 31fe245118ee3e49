//! Application-wide constants
//!
//! Limits that are part of the data model rather than deployment tuning.

/// Maximum survey title length in characters.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum survey description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Bounds for a File Upload question's `max_size_mb`.
pub const MIN_UPLOAD_SIZE_MB: i64 = 1;
pub const MAX_UPLOAD_SIZE_MB: i64 = 100;

/// Inclusive bounds for a Rating (1–5) answer.
pub const RATING_MIN: i64 = 1;
pub const RATING_MAX: i64 = 5;

/// Form field prefix for answers, i.e. `q42` for question 42.
pub const ANSWER_FIELD_PREFIX: &str = "q";

/// Form field or query parameter carrying an explicit platform.
pub const PLATFORM_FIELD: &str = "platform";

/// Default username displayed for unauthenticated users
pub const GUEST_USERNAME: &str = "Guest";
