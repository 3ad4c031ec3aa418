use std::str::FromStr;

use chrono::Utc;
use serde_json::json;
use tabula_core::{
    ExecutionRecord, ExecutionStatus, FieldSpec, FieldType, ImageAsset, NewExecutionRecord,
    NewImageAsset, PromptSchema, SchemaField, UserId,
};
use tabula_error::ValidationErrorKind;
use uuid::Uuid;

#[test]
fn field_type_parses_case_insensitively() {
    assert_eq!(FieldType::from_str("number").unwrap(), FieldType::Number);
    assert_eq!(FieldType::from_str("NUMBER").unwrap(), FieldType::Number);
    assert_eq!(FieldType::from_str("String").unwrap(), FieldType::String);
    assert!(FieldType::from_str("boolean").is_err());
}

#[test]
fn field_spec_serializes_with_field_type_key() {
    let value = serde_json::to_value(FieldSpec::number("age")).unwrap();
    assert_eq!(value, json!({"name": "age", "field_type": "number"}));

    let parsed: FieldSpec = serde_json::from_value(json!({"name": "title"})).unwrap();
    assert_eq!(*parsed.field_type(), FieldType::String);
}

#[test]
fn execution_status_round_trips_through_strings() {
    for status in [
        ExecutionStatus::Pending,
        ExecutionStatus::Running,
        ExecutionStatus::Completed,
        ExecutionStatus::Failed,
    ] {
        assert_eq!(ExecutionStatus::from_str(status.as_str()).unwrap(), status);
        assert_eq!(status.to_string(), status.as_str());
    }
}

#[test]
fn preview_url_prefers_stored_url() {
    let new = NewImageAsset::builder()
        .user_id(UserId::new(7))
        .checksum("00".repeat(32))
        .original_filename("cat.png")
        .image_url("https://bucket.s3.us-east-1.amazonaws.com/images/a.png")
        .build()
        .unwrap();
    let asset = ImageAsset::from_new(Uuid::new_v4(), new, Utc::now());

    assert_eq!(
        asset.preview_url("/media/").as_deref(),
        Some("https://bucket.s3.us-east-1.amazonaws.com/images/a.png")
    );
    assert!(asset.file_path().is_none());
}

#[test]
fn preview_url_is_none_without_url_or_path() {
    let new = NewImageAsset::builder()
        .user_id(UserId::new(7))
        .checksum("00".repeat(32))
        .image_url("")
        .build()
        .unwrap();
    let asset = ImageAsset::from_new(Uuid::new_v4(), new, Utc::now());
    assert!(asset.preview_url("/media/").is_none());
}

#[test]
fn execution_record_defaults() {
    let new = NewExecutionRecord::builder()
        .user_id(UserId::new(1))
        .prompt_text("Who invented the telephone?")
        .build()
        .unwrap();
    let now = Utc::now();
    let record = ExecutionRecord::from_new(Uuid::new_v4(), new, now);

    assert_eq!(*record.status(), ExecutionStatus::Pending);
    assert_eq!(*record.result_data(), json!({}));
    assert!(record.structured_fields().is_empty());
    assert_eq!(*record.created_at(), *record.updated_at());
}

#[test]
fn schema_rejects_duplicate_fields() {
    let result = PromptSchema::new(
        "dupes",
        "",
        vec![
            SchemaField::new("name", FieldType::String, 0),
            SchemaField::new("name", FieldType::Number, 1),
        ],
    );
    let err = result.unwrap_err();
    assert!(matches!(
        err.kind,
        ValidationErrorKind::DuplicateSchemaField { ref field, .. } if field == "name"
    ));
}

#[test]
fn schema_rejects_blank_name() {
    assert!(PromptSchema::new("  ", "", Vec::new()).is_err());
}

#[test]
fn schema_orders_fields_by_sort_order() {
    let schema = PromptSchema::new(
        "inventor",
        "Inventor facts",
        vec![
            SchemaField::new("birth_year", FieldType::Number, 5),
            SchemaField::new("full_name", FieldType::String, 1),
        ],
    )
    .unwrap();

    assert!(*schema.is_active());
    assert_eq!(
        schema.field_specs(),
        vec![FieldSpec::string("full_name"), FieldSpec::number("birth_year")]
    );
    assert!(!*schema.clone().deactivate().is_active());
}
