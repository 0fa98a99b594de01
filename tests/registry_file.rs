//! The JSON registry file survives a restart

mod common;

use common::store_a;
use folio::{FolioConfig, JsonFileRegistry, Language, MemoryStore, Session};
use std::sync::Arc;

#[tokio::test]
async fn registry_file_restores_collections_and_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("collections.json");
    let store = Arc::new(MemoryStore::new().with_server(&store_a()));

    let default_key = {
        let session = Session::new(store.clone(), Arc::new(JsonFileRegistry::new(&path)), Language::English);
        session.start("Default", &store_a()).await.unwrap();
        session.federation().create("Work", &store_a()).await.unwrap();
        session.federation().default_collection().unwrap().key
    };
    assert!(path.exists());

    let restarted = Session::new(store, Arc::new(JsonFileRegistry::new(&path)), Language::English);
    restarted.start("Default", &store_a()).await.unwrap();

    let titles: Vec<String> = restarted
        .federation()
        .collections()
        .into_iter()
        .map(|c| c.title)
        .collect();
    assert_eq!(titles, vec!["Default".to_string(), "Work".to_string()]);
    assert_eq!(restarted.federation().default_collection().unwrap().key, default_key);
}

#[tokio::test]
async fn session_from_config_uses_its_registry_path() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    let config = FolioConfig::default()
        .with_language(Language::Dutch)
        .with_default_server(store_a())
        .with_registry_path(dir.path().join("collections.json"));
    config.save(&config_path).unwrap();

    let loaded = FolioConfig::load(&config_path).unwrap();
    assert_eq!(loaded, config);

    let store = Arc::new(MemoryStore::new().with_server(&store_a()));
    let session = Session::from_config(&loaded, store);
    session
        .start(&loaded.default_collection_title, &loaded.default_server_url)
        .await
        .unwrap();
    assert_eq!(session.messages().new_note_title, "Nieuwe notitie");
    assert!(dir.path().join("collections.json").exists());
}
