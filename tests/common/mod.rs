//! Shared fixture for folio integration tests
//!
//! Two in-memory stores (A and B), an in-memory registry and a session
//! started with a "Default" collection on store A.

#![allow(dead_code)]

use folio::{Collection, Language, MemoryRegistry, MemoryStore, Note, Session, StoreUrl};
use std::sync::Arc;

pub fn store_a() -> StoreUrl {
    StoreUrl::parse("http://store-a.test").unwrap()
}

pub fn store_b() -> StoreUrl {
    StoreUrl::parse("http://store-b.test").unwrap()
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub registry: Arc<MemoryRegistry>,
    pub session: Session,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_language(Language::English).await
    }

    pub async fn with_language(language: Language) -> Self {
        let store = Arc::new(MemoryStore::new().with_server(&store_a()).with_server(&store_b()));
        let registry = Arc::new(MemoryRegistry::new());
        let session = Session::new(store.clone(), registry.clone(), language);
        session.start("Default", &store_a()).await.unwrap();
        Self {
            store,
            registry,
            session,
        }
    }

    /// Seed `title` on `url` with the given notes and connect it
    pub async fn connected(&self, title: &str, url: &StoreUrl, notes: &[(&str, &str)]) -> Collection {
        let id = self.store.seed_collection(url, title);
        for (note_title, body) in notes {
            self.store.seed_note(url, id, note_title, body).unwrap();
        }
        self.session.federation().connect(title, url).await.unwrap()
    }

    pub fn note_titled(&self, collection: &Collection, title: &str) -> Note {
        self.session
            .workspace()
            .find_note_by_title(&collection.key, title)
            .unwrap()
    }
}
