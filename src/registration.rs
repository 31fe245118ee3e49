//! Account registration confirmed by an emailed one-time code.
//!
//! The account details wait in the (encrypted) cookie session until the
//! respondent enters the code. Nothing is written to the database before then.

use crate::orm::users;
use crate::survey::SurveyError;
use crate::user::{email_exists, normalize_email};
use actix_session::Session;
use rand::Rng;
use sea_orm::{entity::*, DatabaseConnection, DbErr, TransactionTrait};
use serde::{Deserialize, Serialize};

const PENDING_KEY: &str = "pending_registration";

/// Account details awaiting code confirmation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PendingRegistration {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub code: String,
    /// Unix timestamp in seconds.
    pub expires_at: i64,
}

/// Why a submitted code was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRejection {
    Expired,
    Mismatch,
}

impl CodeRejection {
    pub fn message(&self) -> &'static str {
        match self {
            CodeRejection::Expired => "Your code has expired. Please request a new one.",
            CodeRejection::Mismatch => "Invalid verification code.",
        }
    }
}

/// A random numeric code of `length` digits.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl PendingRegistration {
    pub fn new(
        username: &str,
        email: &str,
        password_hash: String,
        code_length: usize,
        lifetime_seconds: i64,
    ) -> Self {
        Self {
            username: username.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            code: generate_code(code_length),
            expires_at: now() + lifetime_seconds,
        }
    }

    pub fn is_expired_at(&self, timestamp: i64) -> bool {
        timestamp >= self.expires_at
    }

    pub fn check_code_at(&self, code: &str, timestamp: i64) -> Result<(), CodeRejection> {
        if self.is_expired_at(timestamp) {
            return Err(CodeRejection::Expired);
        }
        if code.trim() != self.code {
            return Err(CodeRejection::Mismatch);
        }
        Ok(())
    }

    pub fn check_code(&self, code: &str) -> Result<(), CodeRejection> {
        self.check_code_at(code, now())
    }

    /// Issues a new code with a fresh expiry window.
    pub fn reissue(&mut self, code_length: usize, lifetime_seconds: i64) {
        self.code = generate_code(code_length);
        self.expires_at = now() + lifetime_seconds;
    }
}

pub fn store_pending(session: &Session, pending: &PendingRegistration) -> Result<(), actix_web::Error> {
    session.insert(PENDING_KEY, pending).map_err(|e| {
        log::error!("store_pending: {}", e);
        actix_web::error::ErrorInternalServerError("Failed to store registration")
    })
}

pub fn load_pending(session: &Session) -> Option<PendingRegistration> {
    match session.get::<PendingRegistration>(PENDING_KEY) {
        Ok(pending) => pending,
        Err(e) => {
            log::error!("load_pending: session.get() {}", e);
            None
        }
    }
}

pub fn clear_pending(session: &Session) {
    session.remove(PENDING_KEY);
}

fn is_unique_violation(e: &DbErr) -> bool {
    let msg = e.to_string();
    msg.contains("duplicate key") || msg.contains("unique constraint")
}

pub const DUPLICATE_EMAIL: &str =
    "Email already registered. Please use a different email or log in.";

/// Inserts the confirmed account.
pub async fn create_user(
    db: &DatabaseConnection,
    pending: &PendingRegistration,
) -> Result<users::Model, SurveyError> {
    if email_exists(db, &pending.email).await? {
        return Err(SurveyError::validation(DUPLICATE_EMAIL));
    }

    let txn = db.begin().await?;
    let user = users::ActiveModel {
        username: Set(pending.username.clone()),
        email: Set(pending.email.clone()),
        password: Set(pending.password_hash.clone()),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            SurveyError::validation(DUPLICATE_EMAIL)
        } else {
            SurveyError::from(e)
        }
    })?;
    txn.commit().await?;

    log::info!("User {} registered as {}", user.id, user.username);
    Ok(user)
}
