// tests/novelty.rs
mod common;

use common::stored_item;
use shorts_ingest::ingest::novelty::exists;
use shorts_ingest::ingest::types::PersistenceGateway;
use shorts_ingest::store::InMemoryStore;

#[tokio::test]
async fn persisted_ids_exist_others_do_not() {
    let store = InMemoryStore::new();
    assert!(!exists(&store, "v1").await.unwrap());

    store
        .save_batch(&[stored_item("v1"), stored_item("v2")])
        .await
        .unwrap();

    assert!(exists(&store, "v1").await.unwrap());
    assert!(exists(&store, "v2").await.unwrap());
    assert!(!exists(&store, "v3").await.unwrap());
}

#[tokio::test]
async fn repeat_write_overwrites_instead_of_duplicating() {
    let store = InMemoryStore::new();
    let mut item = stored_item("v1");
    store.save_batch(&[item.clone()]).await.unwrap();

    item.title = "renamed".into();
    store.save_batch(&[item]).await.unwrap();

    let videos = store.videos();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].title, "renamed");
    assert!(videos[0].ingested_at.is_some());
}
