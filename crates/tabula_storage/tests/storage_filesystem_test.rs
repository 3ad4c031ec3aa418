//! Tests for filesystem storage backend.

use tabula_core::StorageBackendKind;
use tabula_error::{StorageErrorKind, TabulaErrorKind};
use tabula_storage::{FileSystemStorage, ImageStorage};
use tempfile::TempDir;

#[tokio::test]
async fn test_store_writes_under_prefix() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path(), "/media/", "images").unwrap();

    let data = b"\x89PNG fake image bytes";
    let stored = storage.store(data, "photo.PNG", "image/png").await.unwrap();

    assert_eq!(*stored.backend(), StorageBackendKind::Local);
    let local_path = stored.local_path().clone().unwrap();
    assert!(local_path.starts_with("images/"));
    assert!(local_path.ends_with(".PNG"));
    assert!(!local_path.contains("photo"));
    assert_eq!(stored.url(), &format!("/media/{}", local_path));

    let written = std::fs::read(temp_dir.path().join(&local_path)).unwrap();
    assert_eq!(written, data);
}

#[tokio::test]
async fn test_same_bytes_get_distinct_files() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path(), "/media/", "images").unwrap();

    let first = storage.store(b"same", "a.png", "image/png").await.unwrap();
    let second = storage.store(b"same", "a.png", "image/png").await.unwrap();

    assert_ne!(first.local_path(), second.local_path());
}

#[tokio::test]
async fn test_no_temp_files_left_behind() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path(), "/media/", "images").unwrap();

    storage.store(b"bytes", "cat.jpg", "image/jpeg").await.unwrap();

    let entries = std::fs::read_dir(temp_dir.path().join("images"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(entries.len(), 1);
    assert!(entries.iter().all(|name| !name.ends_with(".tmp")));
}

#[test]
fn test_creates_media_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("nested").join("media");

    let storage = FileSystemStorage::new(&root, "/media/", "images").unwrap();

    assert!(root.exists());
    assert_eq!(storage.media_root(), root.as_path());
}

#[tokio::test]
async fn test_unreadable_prefix_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path(), "/media/", "images").unwrap();
    // A plain file where the prefix directory should be
    std::fs::write(temp_dir.path().join("images"), b"not a directory").unwrap();

    let err = storage.store(b"bytes", "a.png", "image/png").await.unwrap_err();

    match err.kind() {
        TabulaErrorKind::Storage(e) => {
            assert!(matches!(e.kind, StorageErrorKind::InvalidPath(ref msg) if msg.contains("images")));
        }
        other => panic!("expected storage error, got {:?}", other),
    }
}
