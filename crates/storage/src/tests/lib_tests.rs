use super::*;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn missing_key_reads_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert_eq!(storage.get_item("ticketData").await.expect("get"), None);
}

#[tokio::test]
async fn set_item_overwrites_previous_value() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set_item("ticketData", "first").await.expect("set");
    storage.set_item("ticketData", "second").await.expect("set");

    assert_eq!(
        storage.get_item("ticketData").await.expect("get").as_deref(),
        Some("second")
    );

    let item = storage
        .load_item("ticketData")
        .await
        .expect("load")
        .expect("item");
    assert_eq!(item.key, "ticketData");
    assert!(item.updated_at <= Utc::now());
}

#[tokio::test]
async fn remove_item_clears_only_that_key() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set_item("ticketData", "ticket").await.expect("set");
    storage.set_item("other", "kept").await.expect("set");

    storage.remove_item("ticketData").await.expect("remove");
    storage.remove_item("never-written").await.expect("remove missing");

    assert_eq!(storage.get_item("ticketData").await.expect("get"), None);
    assert_eq!(
        storage.get_item("other").await.expect("get").as_deref(),
        Some("kept")
    );
}

#[tokio::test]
async fn creates_database_file_when_missing_and_survives_reopen() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("ticket.sqlite3");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage.set_item("ticketData", "{}").await.expect("set");
    storage.pool().close().await;
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.get_item("ticketData").await.expect("get").as_deref(),
        Some("{}")
    );
}

#[tokio::test]
async fn memory_store_is_last_writer_wins() {
    let store = MemoryStore::new();
    assert!(store.is_empty().await);

    store.set_item("ticketData", "a").await.expect("set");
    store.set_item("ticketData", "b").await.expect("set");
    assert_eq!(store.len().await, 1);
    assert_eq!(
        store.get_item("ticketData").await.expect("get").as_deref(),
        Some("b")
    );

    store.remove_item("ticketData").await.expect("remove");
    assert_eq!(store.get_item("ticketData").await.expect("get"), None);
}

#[test]
fn memory_urls_have_no_parent_dir() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/ticket.db?mode=rwc"),
        Some(PathBuf::from("./data/ticket.db"))
    );
}
