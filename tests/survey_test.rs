mod common;

use common::database::{cleanup_test_data, count_rows, setup_test_database};
use common::fixtures::{create_test_survey, create_test_user, payload, rating_survey};
use serde_json::json;
use serial_test::serial;
use surveyor::survey::{self, PublishOutcome, SurveyError};

#[actix_rt::test]
#[serial]
async fn test_create_survey_stores_questions_in_order() {
    let db = setup_test_database().await.unwrap();
    cleanup_test_data(&db).await.unwrap();

    let owner = create_test_user(&db, "owner1", "password123").await.unwrap();
    let created = create_test_survey(
        &db,
        owner.id,
        json!({
            "info": { "title": "  Team lunch  ", "description": "Where next?", "publish": false },
            "questions": [
                { "text": "Venue", "type": "Multiple Choice", "required": true,
                  "options": ["Pizza", " ", "Tacos"] },
                { "text": "Budget", "type": "Slider/Range" },
                { "text": "Menu", "type": "File Upload",
                  "allowed_types": [".PDF", ".png"], "max_size_mb": 5 }
            ]
        }),
    )
    .await;

    assert_eq!(created.title, "Team lunch");
    assert!(!created.publish);

    let questions = survey::load_questions(&db, created.id).await.unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0].text, "Venue");
    assert_eq!(questions[1].text, "Budget");
    assert_eq!(questions[2].text, "Menu");
    assert_eq!(questions[2].max_size_mb, Some(5));

    cleanup_test_data(&db).await.unwrap();
}

#[actix_rt::test]
#[serial]
async fn test_invalid_question_rejects_whole_survey() {
    let db = setup_test_database().await.unwrap();
    cleanup_test_data(&db).await.unwrap();

    let result = survey::validate_survey(&payload(json!({
        "info": { "title": "Uploads" },
        "questions": [
            { "text": "Name", "type": "Text Response" },
            { "text": "Doc", "type": "File Upload", "allowed_types": ["pdf!"], "max_size_mb": 5 }
        ]
    })));

    assert!(matches!(result, Err(SurveyError::Validation(_))));
    assert_eq!(count_rows(&db, "surveys").await.unwrap(), 0);
    assert_eq!(count_rows(&db, "questions").await.unwrap(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_fetch_schema_visibility() {
    let db = setup_test_database().await.unwrap();
    cleanup_test_data(&db).await.unwrap();

    let owner = create_test_user(&db, "owner2", "password123").await.unwrap();
    let draft = create_test_survey(&db, owner.id, rating_survey(false)).await;

    // Draft surveys are hidden from everyone but the owner
    let guest = survey::fetch_schema(&db, draft.id, None).await;
    assert!(matches!(guest, Err(SurveyError::Forbidden(_))));

    let schema = survey::fetch_schema(&db, draft.id, Some(owner.id))
        .await
        .unwrap();
    assert_eq!(schema.survey.title, "Feedback");
    assert_eq!(schema.questions.len(), 1);
    assert_eq!(schema.questions[0].qtype, "Rating (1–5)");
    assert!(schema.questions[0].required);

    let missing = survey::fetch_schema(&db, draft.id + 1000, None).await;
    assert!(matches!(missing, Err(SurveyError::NotFound(_))));

    cleanup_test_data(&db).await.unwrap();
}

#[actix_rt::test]
#[serial]
async fn test_publish_requires_owner_and_is_idempotent() {
    let db = setup_test_database().await.unwrap();
    cleanup_test_data(&db).await.unwrap();

    let owner = create_test_user(&db, "owner3", "password123").await.unwrap();
    let other = create_test_user(&db, "other3", "password123").await.unwrap();
    let draft = create_test_survey(&db, owner.id, rating_survey(false)).await;

    let denied = survey::publish_survey(&db, draft.id, other.id).await;
    assert!(matches!(denied, Err(SurveyError::Forbidden(_))));

    assert_eq!(
        survey::publish_survey(&db, draft.id, owner.id).await.unwrap(),
        PublishOutcome::Published
    );
    assert_eq!(
        survey::publish_survey(&db, draft.id, owner.id).await.unwrap(),
        PublishOutcome::AlreadyPublished
    );

    // Now visible to guests
    assert!(survey::fetch_schema(&db, draft.id, None).await.is_ok());

    cleanup_test_data(&db).await.unwrap();
}

#[actix_rt::test]
#[serial]
async fn test_delete_survey_removes_dependents() {
    use common::fixtures::MemoryStorage;
    use surveyor::platform::Platform;
    use surveyor::survey::SubmissionForm;

    let db = setup_test_database().await.unwrap();
    cleanup_test_data(&db).await.unwrap();

    let owner = create_test_user(&db, "owner4", "password123").await.unwrap();
    let other = create_test_user(&db, "other4", "password123").await.unwrap();
    let published = create_test_survey(&db, owner.id, rating_survey(true)).await;
    let questions = survey::load_questions(&db, published.id).await.unwrap();

    let mut form = SubmissionForm::default();
    form.push_value(&SubmissionForm::field_name(questions[0].id), "5".to_string());
    survey::submit_response(
        &db,
        &MemoryStorage::default(),
        "answers",
        None,
        published.id,
        Platform::Unknown,
        form,
    )
    .await
    .unwrap();
    assert_eq!(count_rows(&db, "answers").await.unwrap(), 1);

    let denied = survey::delete_survey(&db, published.id, other.id).await;
    assert!(matches!(denied, Err(SurveyError::Forbidden(_))));
    assert_eq!(count_rows(&db, "surveys").await.unwrap(), 1);

    survey::delete_survey(&db, published.id, owner.id)
        .await
        .unwrap();
    assert_eq!(count_rows(&db, "surveys").await.unwrap(), 0);
    assert_eq!(count_rows(&db, "questions").await.unwrap(), 0);
    assert_eq!(count_rows(&db, "responses").await.unwrap(), 0);
    assert_eq!(count_rows(&db, "answers").await.unwrap(), 0);

    let again = survey::delete_survey(&db, published.id, owner.id).await;
    assert!(matches!(again, Err(SurveyError::NotFound(_))));

    cleanup_test_data(&db).await.unwrap();
}

#[actix_rt::test]
#[serial]
async fn test_list_for_owner_counts() {
    let db = setup_test_database().await.unwrap();
    cleanup_test_data(&db).await.unwrap();

    let owner = create_test_user(&db, "owner5", "password123").await.unwrap();
    let other = create_test_user(&db, "other5", "password123").await.unwrap();
    let first = create_test_survey(&db, owner.id, rating_survey(false)).await;
    let second = create_test_survey(
        &db,
        owner.id,
        json!({
            "info": { "title": "Two questions" },
            "questions": [
                { "text": "A", "type": "Text Response" },
                { "text": "B", "type": "Date Picker" }
            ]
        }),
    )
    .await;
    create_test_survey(&db, other.id, rating_survey(true)).await;

    let surveys = survey::list_for_owner(&db, owner.id).await.unwrap();
    assert_eq!(surveys.len(), 2);
    // Newest first
    assert_eq!(surveys[0].id, second.id);
    assert_eq!(surveys[0].question_count, 2);
    assert_eq!(surveys[1].id, first.id);
    assert_eq!(surveys[1].question_count, 1);
    assert!(surveys.iter().all(|s| s.response_count == 0));

    cleanup_test_data(&db).await.unwrap();
}
