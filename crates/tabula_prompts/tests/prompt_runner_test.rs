//! Tests for end-to-end prompt runs.

mod test_utils;

use serde_json::json;
use std::sync::Arc;
use tabula_core::{ExecutionStatus, FieldSpec, UserId};
use tabula_database::{ExecutionRepository, InMemoryRepository};
use tabula_error::{GenerationErrorKind, TabulaErrorKind};
use tabula_prompts::{
    DUPLICATE_NOTICE, EMPTY_PROMPT_MESSAGE, ImageUploadHandler, PROVIDER_NAME, PromptRequest,
    PromptRunner,
};
use tabula_storage::UploadedFile;
use test_utils::{FakeStorage, FakeTransport, generator, validator};

struct Harness {
    runner: PromptRunner,
    repo: Arc<InMemoryRepository>,
    storage: Arc<FakeStorage>,
    transport: Arc<FakeTransport>,
}

fn harness(transport: Arc<FakeTransport>) -> Harness {
    let repo = Arc::new(InMemoryRepository::new());
    let storage = FakeStorage::local();
    let uploads = Arc::new(ImageUploadHandler::new(validator(), storage.clone(), repo.clone()));
    let runner = PromptRunner::builder()
        .uploads(uploads)
        .generator(generator(transport.clone()))
        .executions(repo.clone() as Arc<dyn ExecutionRepository>)
        .images(repo.clone() as Arc<dyn tabula_database::ImageRepository>)
        .media_url("/media/")
        .history_limit(5usize)
        .build()
        .unwrap();
    Harness {
        runner,
        repo,
        storage,
        transport,
    }
}

fn request(prompt: &str, fields: Vec<FieldSpec>, image: Option<UploadedFile>) -> PromptRequest {
    PromptRequest {
        user_id: UserId::new(1),
        prompt_text: prompt.to_string(),
        fields,
        image,
    }
}

fn png(bytes: &[u8]) -> UploadedFile {
    UploadedFile::new("shirt.png", "image/png", bytes.to_vec())
}

#[tokio::test]
async fn test_successful_run_records_completed_execution() -> anyhow::Result<()> {
    let h = harness(FakeTransport::replying(r#"{"number_on_the_shirt": 10}"#));

    let outcome = h
        .runner
        .run(request("  What number is on the shirt?  ", vec![FieldSpec::number("numberOnTheShirt")], None))
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.prompt_text(), "What number is on the shirt?");
    assert_eq!(outcome.structured_output(), Some(&json!({"number_on_the_shirt": 10})));
    assert_eq!(outcome.usage().map(|u| *u.total_tokens()), Some(40));
    assert!(outcome.image_preview_url().is_none());

    let history = h.repo.recent(UserId::new(1), 5).await?;
    assert_eq!(history.len(), 1);
    let record = &history[0];
    assert_eq!(Some(*record.id()), *outcome.execution_id());
    assert_eq!(*record.status(), ExecutionStatus::Completed);
    assert_eq!(record.provider(), PROVIDER_NAME);
    assert_eq!(record.model_name(), "gpt-4o-mini-2024-07-18");
    assert_eq!(record.structured_fields(), &vec![FieldSpec::number("numberOnTheShirt")]);
    assert!(record.image_id().is_none());
    Ok(())
}

#[tokio::test]
async fn test_empty_prompt_rejected_before_upload() {
    let h = harness(FakeTransport::replying("{}"));

    let outcome = h
        .runner
        .run(request("   ", vec![FieldSpec::string("a")], Some(png(b"img"))))
        .await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.error_message().as_deref(), Some(EMPTY_PROMPT_MESSAGE));
    assert_eq!(outcome.field_rows(), &vec![FieldSpec::string("a")]);
    assert_eq!(h.storage.write_count(), 0);
    assert_eq!(h.transport.call_count(), 0);
    assert_eq!(h.repo.execution_count().await, 0);
}

#[tokio::test]
async fn test_empty_fields_use_defaults() {
    let h = harness(FakeTransport::replying("{}"));

    let outcome = h.runner.run(request("Who?", vec![], None)).await;

    assert_eq!(outcome.field_rows().len(), 3);
    let sent = h.transport.last_request().unwrap();
    assert!(sent.messages[1].content.contains("- inventorBirthYear: number"));
}

#[tokio::test]
async fn test_image_url_passed_to_generation_and_linked() -> anyhow::Result<()> {
    let h = harness(FakeTransport::replying("{}"));

    let outcome = h.runner.run(request("Describe", vec![], Some(png(b"img")))).await;

    let preview = outcome.image_preview_url().clone().unwrap();
    assert!(preview.starts_with("/media/images/"));
    assert!(outcome.image_notice().is_none());
    let sent = h.transport.last_request().unwrap();
    assert!(
        sent.messages[1]
            .content
            .starts_with(&format!("An image has been uploaded. URL: {}\n", preview))
    );

    let record = &h.repo.recent(UserId::new(1), 1).await?[0];
    assert!(record.image_id().is_some());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_image_sets_notice() {
    let h = harness(FakeTransport::replying("{}"));

    h.runner.run(request("first", vec![], Some(png(b"same")))).await;
    let second = h.runner.run(request("second", vec![], Some(png(b"same")))).await;

    assert_eq!(second.image_notice().as_deref(), Some(DUPLICATE_NOTICE));
    assert_eq!(h.storage.write_count(), 1);
}

#[tokio::test]
async fn test_invalid_image_aborts_run() {
    let h = harness(FakeTransport::replying("{}"));
    let gif_too_big = UploadedFile::new("huge.gif", "image/gif", vec![0u8; 11 * 1024 * 1024]);

    let outcome = h.runner.run(request("Describe", vec![], Some(gif_too_big))).await;

    assert_eq!(
        outcome.error_message().as_deref(),
        Some("Image should not exceed 10 MB.")
    );
    assert_eq!(outcome.prompt_text(), "Describe");
    assert_eq!(h.transport.call_count(), 0);
    assert_eq!(h.repo.execution_count().await, 0);
}

#[tokio::test]
async fn test_provider_failure_records_failed_execution() -> anyhow::Result<()> {
    let h = harness(FakeTransport::failing(GenerationErrorKind::Connection(
        "connection reset".to_string(),
    )));

    let outcome = h.runner.run(request("Describe", vec![], None)).await;

    assert!(!outcome.is_success());
    match outcome.error().as_ref().map(|e| e.kind()) {
        Some(TabulaErrorKind::Generation(e)) => assert!(e.kind.is_retryable()),
        other => panic!("expected generation error, got {other:?}"),
    }
    assert!(outcome.error_message().clone().unwrap().contains("connection"));

    let history = h.repo.recent(UserId::new(1), 5).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(*history[0].status(), ExecutionStatus::Failed);
    assert!(history[0].error_message().is_some());
    Ok(())
}

#[tokio::test]
async fn test_history_limited_and_resolves_images() -> anyhow::Result<()> {
    let h = harness(FakeTransport::replying(r#"{"ok": 1}"#));

    h.runner.run(request("with image", vec![], Some(png(b"pic")))).await;
    for i in 0..6 {
        h.runner.run(request(&format!("run {}", i), vec![], None)).await;
    }

    let history = h.runner.history(UserId::new(1)).await?;
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].prompt_text(), "run 5");
    assert!(history.iter().all(|e| e.image_url().is_none()));

    let other = h.runner.history(UserId::new(2)).await?;
    assert!(other.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_history_entry_has_image_url() -> anyhow::Result<()> {
    let h = harness(FakeTransport::replying(r#"{"ok": 1}"#));

    let outcome = h.runner.run(request("with image", vec![], Some(png(b"pic")))).await;

    let history = h.runner.history(UserId::new(1)).await?;
    assert_eq!(history[0].image_url(), outcome.image_preview_url());
    assert_eq!(history[0].result_data(), &json!({"ok": 1}));
    Ok(())
}

#[tokio::test]
async fn test_rejected_request_echoes_form_without_side_effects() -> anyhow::Result<()> {
    let h = harness(FakeTransport::replying("{}"));
    let error = h.runner.uploads().validator().too_large(12 * 1024 * 1024);

    let outcome = h.runner.reject(
        request(" Describe ", vec![FieldSpec::string("caption")], None),
        error.into(),
    );

    assert!(!outcome.is_success());
    assert_eq!(outcome.prompt_text(), "Describe");
    assert_eq!(outcome.field_rows(), &vec![FieldSpec::string("caption")]);
    assert!(matches!(
        outcome.error().as_ref().map(|e| e.kind()),
        Some(TabulaErrorKind::Validation(_))
    ));
    assert!(outcome.error_message().as_deref().unwrap().contains("exceed"));
    assert_eq!(h.transport.call_count(), 0);
    assert_eq!(h.storage.write_count(), 0);
    assert!(h.repo.recent(UserId::new(1), 5).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_rejected_request_reports_blank_prompt_first() {
    let h = harness(FakeTransport::replying("{}"));
    let error = h.runner.uploads().validator().too_large(12 * 1024 * 1024);

    let outcome = h.runner.reject(request("  ", Vec::new(), None), error.into());

    assert_eq!(outcome.error_message().as_deref(), Some(EMPTY_PROMPT_MESSAGE));
    assert_eq!(outcome.field_rows().len(), 3);
}
