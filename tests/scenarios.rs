//! End-to-end scenarios: session, queue, federation and references working
//! together against in-memory stores.
//!
//! Run with: `cargo test --test scenarios`

mod common;

use common::{store_a, store_b, Fixture};
use folio::reference::{extract_references, resolve_and_annotate, strip_annotations};
use folio::title::{self, ResolveOptions};
use folio::{
    CollectionFilter, FilterPipeline, FolioError, Language, Messages, Note, NoteFilter, RetargetOutcome, SearchFilter,
    StoreGateway, TagFilter,
};
use std::collections::{BTreeSet, HashSet};

// ============================================================================
// References and rename cascade
// ============================================================================

#[tokio::test]
async fn blank_target_preview_and_rename_cascade() {
    let fx = Fixture::new().await;
    let work = fx
        .connected("Work", &store_a(), &[("Plan", "see [[Budget]]"), ("Budget", "")])
        .await;
    let plan = fx.note_titled(&work, "Plan");
    let budget = fx.note_titled(&work, "Budget");

    let annotated = fx.session.annotated_body(&plan.key).unwrap();
    assert!(annotated.contains("href='note://Budget'"));
    assert!(annotated.contains("data-note-preview='The note is blank.'"));

    let outcome = fx.session.rename_note(&budget.key, "Budget2").unwrap();
    assert_eq!(outcome.cascaded, vec![plan.key]);
    assert_eq!(fx.session.note(&plan.key).unwrap().body, "see [[Budget2]]");

    let updates = fx.session.pending_updates();
    assert!(updates.contains(&plan.key));
    assert!(updates.contains(&budget.key));

    let report = fx.session.flush().await;
    assert!(report.is_complete());
    let remote_plan = fx
        .store
        .notes_on(&store_a())
        .into_iter()
        .find(|n| n.title == "Plan")
        .unwrap();
    assert_eq!(remote_plan.body, "see [[Budget2]]");
}

#[tokio::test]
async fn localized_previews() {
    let fx = Fixture::with_language(Language::Romanian).await;
    let work = fx
        .connected("Work", &store_a(), &[("Plan", "[[Plan]] and [[Empty]]"), ("Empty", " ")])
        .await;
    let plan = fx.note_titled(&work, "Plan");

    let annotated = fx.session.annotated_body(&plan.key).unwrap();
    assert!(annotated.contains("Această notiță face referire la ea însăși."));
    assert!(annotated.contains("Notița este goală."));
}

#[test]
fn annotation_does_not_change_resolution() {
    let coll = folio::CollectionKey::new();
    let notes = vec![
        Note::new("Plan", "", coll),
        Note::new("Budget", "line one\nline two, much longer than twenty", coll),
        Note::new("Q&A", "<i>answers</i>", coll),
    ];
    let me = notes[0].key;
    let bodies = [
        "see [[Budget]]",
        "[[Missing]] then [[Plan]] then [[Budget]] again [[Budget]]",
        "[[Q&A]] has <b>markup</b> and [[not closed",
        "no markers at all",
        "[[Budget]][[Missing]]",
    ];

    let resolves = |title: &str| notes.iter().any(|n| n.title == title);
    for body in bodies {
        let annotated = resolve_and_annotate(body, &notes, &me, "Work", &Messages::default());
        let stripped = strip_annotations(&annotated);
        assert_eq!(stripped, body);

        let before: Vec<(String, bool)> = extract_references(body)
            .into_iter()
            .map(|t| {
                let found = resolves(&t);
                (t, found)
            })
            .collect();
        let after: Vec<(String, bool)> = extract_references(&stripped)
            .into_iter()
            .map(|t| {
                let found = resolves(&t);
                (t, found)
            })
            .collect();
        assert_eq!(before, after);
    }
}

// ============================================================================
// Title resolution
// ============================================================================

#[test]
fn suffixed_titles_are_fresh_and_stable() {
    let sibling_sets: Vec<HashSet<String>> = vec![
        HashSet::new(),
        ["Plan"].iter().map(|s| s.to_string()).collect(),
        ["Plan", "Plan (2)", "Plan (3)"].iter().map(|s| s.to_string()).collect(),
        ["Plan (2)", "New Note", "Plan"].iter().map(|s| s.to_string()).collect(),
    ];
    let candidates = ["Plan", " Plan ", "New Note", "Plan (2)", "Other"];

    for siblings in &sibling_sets {
        for candidate in candidates {
            let first = title::resolve(siblings, None, candidate, ResolveOptions::copy()).unwrap();
            assert!(!siblings.contains(&first), "{:?} collides in {:?}", first, siblings);
            let again = title::resolve(siblings, None, &first, ResolveOptions::copy()).unwrap();
            assert_eq!(again, first);
        }
    }
}

// ============================================================================
// Pending queue
// ============================================================================

#[tokio::test]
async fn create_supersedes_update() {
    let fx = Fixture::new().await;
    let default = fx.session.federation().default_collection().unwrap();
    let note = fx.session.add_note(&default.key).unwrap();
    fx.session.edit_body(&note.key, "first words").unwrap();
    fx.session.rename_note(&note.key, "Renamed").unwrap();

    assert_eq!(fx.session.pending_creates(), vec![note.key]);
    assert!(!fx.session.pending_updates().contains(&note.key));

    let report = fx.session.flush().await;
    assert_eq!(report.created, vec![note.key]);
    let remote = fx.store.notes_on(&store_a());
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].title, "Renamed");
    assert_eq!(remote[0].body, "first words");
}

#[tokio::test]
async fn failed_flush_items_are_retried_next_time() {
    let fx = Fixture::new().await;
    let default = fx.session.federation().default_collection().unwrap();
    let note = fx.session.add_note_with(&default.key, "Plan", "").unwrap();

    fx.store.set_reachable(&store_a(), false);
    let report = fx.session.flush().await;
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, FolioError::ServerUnreachable(_)));
    assert_eq!(fx.session.pending_creates(), vec![note.key]);

    fx.store.set_reachable(&store_a(), true);
    let report = fx.session.flush().await;
    assert_eq!(report.created, vec![note.key]);
    assert!(fx.session.pending_creates().is_empty());
}

#[tokio::test]
async fn remote_conflict_reverts_local_edit() {
    let fx = Fixture::new().await;
    let work = fx.connected("Work", &store_a(), &[("Plan", "body")]).await;
    let plan = fx.note_titled(&work, "Plan");

    fx.session.rename_note(&plan.key, "Roadmap").unwrap();
    // Another client takes the title first
    fx.store.seed_note(&store_a(), work.id.unwrap(), "Roadmap", "").unwrap();

    let report = fx.session.flush().await;
    assert_eq!(report.reverted, vec![plan.key]);
    assert_eq!(fx.session.note(&plan.key).unwrap().title, "Plan");
    assert!(fx.session.pending_updates().is_empty());
}

#[tokio::test]
async fn reverted_rename_restores_sibling_references() {
    let fx = Fixture::new().await;
    let work = fx
        .connected("Work", &store_a(), &[("Plan", "see [[Budget]]"), ("Budget", "")])
        .await;
    let plan = fx.note_titled(&work, "Plan");
    let budget = fx.note_titled(&work, "Budget");

    fx.session.rename_note(&budget.key, "Budget2").unwrap();
    fx.store.seed_note(&store_a(), work.id.unwrap(), "Budget2", "").unwrap();

    let report = fx.session.flush().await;
    assert_eq!(report.reverted, vec![budget.key]);
    assert_eq!(fx.session.note(&budget.key).unwrap().title, "Budget");
    assert_eq!(fx.session.note(&plan.key).unwrap().body, "see [[Budget]]");
    assert_eq!(fx.session.pending_updates(), vec![plan.key]);

    let report = fx.session.flush().await;
    assert_eq!(report.updated, vec![plan.key]);
    let remote_plan = fx
        .store
        .notes_on(&store_a())
        .into_iter()
        .find(|n| n.title == "Plan")
        .unwrap();
    assert_eq!(remote_plan.body, "see [[Budget]]");
}

#[tokio::test]
async fn stale_note_is_pruned_on_flush() {
    let fx = Fixture::new().await;
    let work = fx.connected("Work", &store_a(), &[("Plan", "body")]).await;
    let plan = fx.note_titled(&work, "Plan");

    fx.store.delete_note(&store_a(), plan.id.unwrap()).await.unwrap();
    fx.session.edit_body(&plan.key, "edited").unwrap();

    let report = fx.session.flush().await;
    assert_eq!(report.pruned, vec![plan.key]);
    assert!(!fx.session.workspace().has_note(&plan.key));
}

#[tokio::test]
async fn refresh_keeps_unflushed_edits() {
    let fx = Fixture::new().await;
    let work = fx.connected("Work", &store_a(), &[("Plan", "remote")]).await;
    let plan = fx.note_titled(&work, "Plan");
    fx.session.edit_body(&plan.key, "local").unwrap();

    let report = fx.session.federation().refresh().await;
    assert!(report.unavailable.is_empty());
    assert_eq!(fx.session.note(&plan.key).unwrap().body, "local");
}

// ============================================================================
// Federation
// ============================================================================

#[tokio::test]
async fn duplicate_local_collection_makes_no_network_calls() {
    let fx = Fixture::new().await;
    fx.connected("Work", &store_a(), &[]).await;
    fx.store.clear_calls();

    let err = fx.session.federation().create("Work", &store_a()).await.unwrap_err();
    assert!(matches!(err, FolioError::DuplicateCollection(ref t) if t == "Work"));
    let err = fx.session.federation().create("Work", &store_b()).await.unwrap_err();
    assert!(matches!(err, FolioError::DuplicateCollection(_)));
    assert!(fx.store.calls().is_empty());
}

#[tokio::test]
async fn migration_with_one_failing_note() {
    let fx = Fixture::new().await;
    let work = fx
        .connected("Work", &store_a(), &[("Plan", "see [[Budget]]"), ("Budget", "numbers")])
        .await;
    let budget = fx.note_titled(&work, "Budget");
    fx.store.fail_note_creates_titled(&store_b(), "Budget");

    let outcome = fx
        .session
        .federation()
        .retarget(&work.key, "Work", &store_b(), true)
        .await
        .unwrap();
    let RetargetOutcome::Migrated(report) = outcome else {
        panic!("expected a migration");
    };
    assert_eq!(report.migrated.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].key, budget.key);
    assert!(report.cleanup_errors.is_empty());

    let on_b = fx.store.collections_on(&store_b());
    assert_eq!(on_b.len(), 1);
    assert_eq!(on_b[0].title, "Work");
    assert_eq!(fx.store.notes_on(&store_b()).len(), 1);
    assert!(fx.store.collections_on(&store_a()).iter().all(|c| c.title != "Work"));

    // The failed note stays local and is retried by the next flush
    assert!(fx.session.pending_creates().contains(&budget.key));
    fx.store.clear_failures();
    let flushed = fx.session.flush().await;
    assert_eq!(flushed.created, vec![budget.key]);
    assert_eq!(fx.store.notes_on(&store_b()).len(), 2);
}

#[tokio::test]
async fn migration_requires_confirmation() {
    let fx = Fixture::new().await;
    let work = fx.connected("Work", &store_a(), &[("Plan", "")]).await;
    fx.store.clear_calls();

    let err = fx
        .session
        .federation()
        .retarget(&work.key, "Work", &store_b(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::MigrationNotConfirmed));
    assert!(fx.store.calls().is_empty());
}

#[tokio::test]
async fn registry_is_persisted_after_each_mutation() {
    let fx = Fixture::new().await;
    let after_start = fx.registry.persist_count();

    let work = fx.connected("Work", &store_a(), &[]).await;
    fx.session
        .federation()
        .retarget(&work.key, "Office", &store_a(), false)
        .await
        .unwrap();
    fx.session.federation().forget(&work.key).unwrap();

    assert_eq!(fx.registry.persist_count(), after_start + 3);
    assert!(fx.registry.snapshot().find("Office").is_none());
}

// ============================================================================
// Filters
// ============================================================================

#[tokio::test]
async fn filter_order_does_not_change_the_result() {
    let fx = Fixture::new().await;
    let work = fx
        .connected(
            "Work",
            &store_a(),
            &[
                ("Plan", "quarterly #q3 #money"),
                ("Budget", "#money only"),
                ("Retro", "#q3 #money retro notes"),
            ],
        )
        .await;
    fx.connected("Home", &store_b(), &[("Groceries", "#money plan")]).await;

    let make = |i: usize| -> Box<dyn NoteFilter> {
        match i {
            0 => Box::new(CollectionFilter::new(Some(work.key))),
            1 => Box::new(SearchFilter::new("PLAN")),
            _ => Box::new(TagFilter::new(["#money", "q3"])),
        }
    };
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

    let mut results = Vec::new();
    for order in orders {
        let mut pipeline = FilterPipeline::new();
        for i in order {
            let filter = make(i);
            pipeline.add_filter(move |notes: Vec<Note>| filter.apply(notes));
        }
        let keys: BTreeSet<String> = fx
            .session
            .filtered_notes(&pipeline)
            .into_iter()
            .map(|n| n.title)
            .collect();
        results.push(keys);
    }

    let expected: BTreeSet<String> = ["Plan".to_string()].into_iter().collect();
    assert!(results.iter().all(|r| *r == expected), "{:?}", results);
}
