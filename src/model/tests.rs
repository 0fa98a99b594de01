//! Identity, serialization and workspace tests for the local model

use super::*;
use serde_json::json;

fn store() -> StoreUrl {
    StoreUrl::parse("http://a.test/").unwrap()
}

#[cfg(test)]
mod identity_tests {
    use super::*;

    #[test]
    fn pending_notes_are_identified_by_title_and_collection() {
        let coll = CollectionKey::new();
        let a = Note::new("Plan", "one", coll);
        let b = Note::new("Plan", "two", coll);
        assert_eq!(a, b);

        let elsewhere = Note::new("Plan", "one", CollectionKey::new());
        assert_ne!(a, elsewhere);
    }

    #[test]
    fn confirmed_notes_are_identified_by_store_id() {
        let coll = CollectionKey::new();
        let a = Note::confirmed(RemoteId::new(7), "Plan", "", coll);
        let mut b = a.clone();
        b.set_title("Renamed");
        b.set_body("changed");
        assert_eq!(a, b);

        let other = Note::confirmed(RemoteId::new(8), "Plan", "", coll);
        assert_ne!(a, other);
    }

    #[test]
    fn same_store_id_in_different_collections_differs() {
        let a = Note::confirmed(RemoteId::new(1), "Plan", "", CollectionKey::new());
        let b = Note::confirmed(RemoteId::new(1), "Plan", "", CollectionKey::new());
        assert_ne!(a, b);
    }

    #[test]
    fn collections_compare_by_store_and_id() {
        let a = Collection::new("Work", store()).with_id(RemoteId::new(3));
        let mut b = a.clone();
        b.title = "Office".into();
        assert_eq!(a, b);

        let other_store =
            Collection::new("Work", StoreUrl::parse("http://b.test").unwrap()).with_id(RemoteId::new(3));
        assert_ne!(a, other_store);
    }

    #[test]
    fn revert_restores_acknowledged_state() {
        let mut note = Note::confirmed(RemoteId::new(1), "Plan", "v1", CollectionKey::new());
        note.set_title("Draft");
        note.set_body("v2");
        assert!(note.revert_to_synced());
        assert_eq!(note.title, "Plan");
        assert_eq!(note.body, "v1");

        let mut fresh = Note::new("New", "", CollectionKey::new());
        assert!(!fresh.revert_to_synced());
    }

    #[test]
    fn edits_bump_revision() {
        let mut note = Note::new("Plan", "", CollectionKey::new());
        assert_eq!(note.revision, 0);
        note.set_body("x");
        note.set_title("y");
        assert_eq!(note.revision, 2);
    }
}

#[cfg(test)]
mod serialization_tests {
    use super::*;

    #[test]
    fn collection_round_trips_without_pending_id() {
        let coll = Collection::new("Work", store());
        let value = serde_json::to_value(&coll).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["server_url"], json!("http://a.test/"));

        let back: Collection = serde_json::from_value(value).unwrap();
        assert_eq!(back.key, coll.key);
        assert_eq!(back.id, None);
    }

    #[test]
    fn sync_bookkeeping_is_not_serialized() {
        let note = Note::confirmed(RemoteId::new(4), "Plan", "body", CollectionKey::new());
        let value = serde_json::to_value(&note).unwrap();
        assert!(value.get("revision").is_none());
        assert!(value.get("synced").is_none());
        assert_eq!(value["id"], json!(4));
    }
}

#[cfg(test)]
mod workspace_tests {
    use super::*;

    #[test]
    fn sibling_titles_exclude_the_given_note() {
        let ws = Workspace::new();
        let coll = CollectionKey::new();
        let plan = ws.insert_note(Note::new("Plan", "", coll));
        ws.insert_note(Note::new("Budget", "", coll));
        ws.insert_note(Note::new("Other", "", CollectionKey::new()));

        let titles = ws.sibling_titles(&coll, Some(&plan));
        assert_eq!(titles.len(), 1);
        assert!(titles.contains("Budget"));
        assert_eq!(ws.sibling_titles(&coll, None).len(), 2);
    }

    #[test]
    fn update_note_mutates_in_place() {
        let ws = Workspace::new();
        let key = ws.insert_note(Note::new("Plan", "", CollectionKey::new()));
        let revision = ws.update_note(&key, |n| {
            n.set_body("hello");
            n.revision
        });
        assert_eq!(revision, Some(1));
        assert_eq!(ws.get_note(&key).unwrap().body, "hello");
        assert!(ws.update_note(&NoteKey::new(), |_| ()).is_none());
    }

    #[test]
    fn remove_notes_in_leaves_other_collections() {
        let ws = Workspace::new();
        let work = CollectionKey::new();
        let home = CollectionKey::new();
        ws.insert_note(Note::new("A", "", work));
        ws.insert_note(Note::new("B", "", work));
        let kept = ws.insert_note(Note::new("C", "", home));

        assert_eq!(ws.remove_notes_in(&work).len(), 2);
        assert_eq!(ws.note_count(), 1);
        assert!(ws.has_note(&kept));
    }

    #[test]
    fn collections_are_listed_by_title() {
        let ws = Workspace::new();
        ws.upsert_collection(Collection::new("Work", store()));
        ws.upsert_collection(Collection::new("Home", store()));
        let titles: Vec<String> = ws.collections().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["Home", "Work"]);
        assert!(ws.find_collection("Work", &store()).is_some());
        assert!(ws.find_collection_by_title("Garden").is_none());
    }
}
