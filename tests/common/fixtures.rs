//! Test fixtures for creating test data
#![allow(dead_code)]

use actix_web::web::Bytes;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};
use std::sync::Mutex;
use surveyor::storage::{StorageBackend, StorageError};
use surveyor::survey::{validate_survey, SurveyPayload};

/// Test user fixture
pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password: String, // Plain text password for testing
}

/// Create a test user with known credentials
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<TestUser, DbErr> {
    use surveyor::orm::users;

    let password_hash = surveyor::session::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;
    let email = format!("{}@test.com", username.to_lowercase());

    let user = users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.clone()),
        password: Set(password_hash),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    let user_model = user.insert(db).await?;

    Ok(TestUser {
        id: user_model.id,
        username: username.to_string(),
        email,
        password: password.to_string(),
    })
}

/// Builds a payload from JSON, as the editor would send it.
pub fn payload(value: serde_json::Value) -> SurveyPayload {
    serde_json::from_value(value).expect("survey payload")
}

/// Creates a survey through validation and the store.
pub async fn create_test_survey(
    db: &DatabaseConnection,
    owner_id: i32,
    value: serde_json::Value,
) -> surveyor::orm::surveys::Model {
    let new_survey = validate_survey(&payload(value)).expect("valid survey");
    surveyor::survey::create_survey(db, owner_id, new_survey)
        .await
        .expect("survey created")
}

/// The "Feedback" survey with a single required rating question.
pub fn rating_survey(publish: bool) -> serde_json::Value {
    serde_json::json!({
        "info": { "title": "Feedback", "description": "", "publish": publish },
        "questions": [
            { "text": "Rate us", "type": "Rating (1–5)", "required": true }
        ]
    })
}

/// In-memory storage that records what it was given.
#[derive(Default)]
pub struct MemoryStorage {
    pub objects: Mutex<Vec<(String, Bytes)>>,
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn put_object(
        &self,
        data: Vec<u8>,
        key: &str,
        _content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), Bytes::from(data)));
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.lock().unwrap().iter().any(|(k, _)| k == key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://files.test/{}", key)
    }
}

/// Storage whose uploads always fail.
pub struct FailingStorage;

#[async_trait]
impl StorageBackend for FailingStorage {
    async fn put_object(
        &self,
        _data: Vec<u8>,
        _key: &str,
        _content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        Err(StorageError::S3("service unavailable".to_string()))
    }

    async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
        Ok(false)
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://files.test/{}", key)
    }
}
