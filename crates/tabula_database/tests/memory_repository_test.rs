//! Tests for the in-memory repositories.

use serde_json::json;
use tabula_core::{ExecutionStatus, FieldSpec, NewExecutionRecord, NewImageAsset, UserId};
use tabula_database::{DatabaseErrorKind, ExecutionRepository, ImageRepository, InMemoryRepository};

fn new_asset(user: i64, checksum: &str) -> NewImageAsset {
    NewImageAsset::builder()
        .user_id(UserId::new(user))
        .checksum(checksum)
        .original_filename("cat.png")
        .image_url(format!("/media/images/{}.png", checksum))
        .file_path(Some(format!("images/{}.png", checksum)))
        .build()
        .unwrap()
}

fn new_execution(user: i64, prompt: &str) -> NewExecutionRecord {
    NewExecutionRecord::builder()
        .user_id(UserId::new(user))
        .prompt_text(prompt)
        .structured_fields(vec![FieldSpec::number("age")])
        .result_data(json!({"age": 3}))
        .provider("openai")
        .model_name("gpt-4o-mini")
        .status(ExecutionStatus::Completed)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_insert_and_find_by_checksum() -> anyhow::Result<()> {
    let repo = InMemoryRepository::new();
    let inserted = repo.insert(new_asset(1, "abc")).await?;

    let found = repo.find_by_checksum(UserId::new(1), "abc").await?;
    assert_eq!(found.as_ref(), Some(&inserted));
    assert_eq!(repo.find_by_id(*inserted.id()).await?, Some(inserted));

    assert!(repo.find_by_checksum(UserId::new(2), "abc").await?.is_none());
    assert!(repo.find_by_checksum(UserId::new(1), "def").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_insert_is_unique_violation() -> anyhow::Result<()> {
    let repo = InMemoryRepository::new();
    repo.insert(new_asset(1, "abc")).await?;

    let err = repo.insert(new_asset(1, "abc")).await.unwrap_err();
    assert!(err.is_unique_violation());
    assert!(matches!(err.kind, DatabaseErrorKind::UniqueViolation(_)));
    assert_eq!(repo.image_count().await, 1);

    // Same content for another user is fine
    repo.insert(new_asset(2, "abc")).await?;
    assert_eq!(repo.image_count().await, 2);
    Ok(())
}

#[tokio::test]
async fn test_list_for_user_newest_first() -> anyhow::Result<()> {
    let repo = InMemoryRepository::new();
    repo.insert(new_asset(1, "first")).await?;
    repo.insert(new_asset(2, "other")).await?;
    repo.insert(new_asset(1, "second")).await?;
    repo.insert(new_asset(1, "third")).await?;

    let listed = repo.list_for_user(UserId::new(1), 2).await?;
    let checksums: Vec<_> = listed.iter().map(|a| a.checksum().as_str()).collect();
    assert_eq!(checksums, vec!["third", "second"]);
    Ok(())
}

#[tokio::test]
async fn test_recent_executions() -> anyhow::Result<()> {
    let repo = InMemoryRepository::new();
    for i in 0..7 {
        repo.record(new_execution(1, &format!("prompt {}", i))).await?;
    }
    repo.record(new_execution(2, "someone else")).await?;

    let recent = repo.recent(UserId::new(1), 5).await?;
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0].prompt_text(), "prompt 6");
    assert_eq!(recent[4].prompt_text(), "prompt 2");
    assert!(recent.iter().all(|r| *r.user_id() == UserId::new(1)));
    assert_eq!(*recent[0].status(), ExecutionStatus::Completed);
    assert_eq!(recent[0].created_at(), recent[0].updated_at());
    assert_eq!(repo.execution_count().await, 8);
    Ok(())
}
