use mood_journal::history::MessageLog;
use mood_journal::models::Message;
use mood_journal::storage::{ FileStore, KeyValueStore, Storage };
use chrono::Utc;
use std::sync::Arc;

#[tokio::test]
async fn values_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("journal.json");

    let store = FileStore::new(&path);
    store.set("onboardingCompleted", "true").await.unwrap();
    store.set("messages", "[]").await.unwrap();
    drop(store);

    let reopened = FileStore::new(&path);
    assert_eq!(reopened.get("onboardingCompleted").await.unwrap().as_deref(), Some("true"));
    reopened.remove("onboardingCompleted").await.unwrap();
    assert_eq!(reopened.get("onboardingCompleted").await.unwrap(), None);
    assert_eq!(reopened.get("messages").await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn clear_all_on_missing_file_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("absent.json"));
    store.clear_all().await.unwrap();
    assert_eq!(store.get("anything").await.unwrap(), None);
}

#[tokio::test]
async fn corrupt_file_degrades_to_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.json");
    std::fs::write(&path, "{ not json").unwrap();

    let log = MessageLog::new(Storage::new(Arc::new(FileStore::new(&path))));
    assert!(log.load().await.is_empty());
    assert!(!log.delete("x").await);
}

#[tokio::test]
async fn message_log_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.json");
    let log = MessageLog::new(Storage::new(Arc::new(FileStore::new(&path))));

    let a = Message::from_user("bir", Utc::now());
    let b = Message::from_user("iki", Utc::now());
    log.append(&[a.clone(), b.clone()]).await;

    let reopened = MessageLog::new(Storage::new(Arc::new(FileStore::new(&path))));
    assert_eq!(reopened.load().await, vec![a.clone(), b]);
    assert!(reopened.delete(&a.id).await);
    assert_eq!(reopened.load().await.len(), 1);
}
