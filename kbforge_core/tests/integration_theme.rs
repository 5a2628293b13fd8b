//! Integration tests for the theme lifecycle and the fact store.
//!
//! These tests verify that:
//! - Facts written to a theme load back as the same set, fast or full
//! - Duplicate writes are kept by raw iteration but stored once
//! - Concurrent first reads share a single cached store
//! - The translation view reads through a theme

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use kbforge_core::{Fact, FactStore, HAS_TRANSLATION, ThemeError, ThemeGroup, ThemeRegistry};

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kbforge_{tag}_{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn sample_facts() -> Vec<Fact> {
    vec![
        Fact::new("<Elvis_Presley>", "<wasBornIn>", "<Tupelo>").with_id("<id_1>"),
        Fact::new("<Elvis_Presley>", "rdfs:label", "\"Elvis\"@en"),
        Fact::new("<Elvis_Presley>", "<hasMotto>", "\"tab\there\\and\nnewline\""),
        Fact::new("<Tupelo>", "<isLocatedIn>", "<Mississippi>"),
    ]
}

#[test]
fn test_round_trip_fast_and_full() {
    let dir = temp_dir("roundtrip");
    let registry = ThemeRegistry::new();
    let theme = registry.create("yagoFacts", "facts").unwrap();

    theme.open_for_writing(&dir, "Round trip test").unwrap();
    for fact in sample_facts() {
        theme.write(&fact).unwrap();
    }
    let file = theme.close().unwrap();

    let expected = FactStore::from_facts(sample_facts());
    let fast = FactStore::load(&file, true).unwrap();
    let full = FactStore::load(&file, false).unwrap();
    assert!(fast.check_equal(&expected));
    assert!(full.check_equal(&expected));
    assert_eq!(
        full.get_object("<Elvis_Presley>", "<hasMotto>"),
        Some("\"tab\there\\and\nnewline\"")
    );
    assert_eq!(full.facts().next().and_then(Fact::id), Some("<id_1>"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_duplicate_write_policy() {
    let dir = temp_dir("duplicates");
    let registry = ThemeRegistry::new();
    let theme = registry.create("T", "duplicates").unwrap();

    theme.open_for_writing(&dir, "Duplicates").unwrap();
    theme.write(&Fact::new("<e1>", "<r>", "<e2>")).unwrap();
    theme.write(&Fact::new("<e1>", "<r>", "<e2>")).unwrap();
    theme.close().unwrap();

    let raw = theme.iter().unwrap().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(raw.len(), 2);

    let store = theme.fact_store(false).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.contains(&Fact::new("<e1>", "<r>", "<e2>")));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_full_load_rejects_conflicting_ids() {
    let dir = temp_dir("ids");
    let path = dir.join("T.tsv");
    std::fs::write(&path, "<id_1>\t<a>\t<r>\t<b>\n<id_1>\t<c>\t<r>\t<d>\n").unwrap();

    assert!(FactStore::load(&path, true).is_ok());
    let err = FactStore::load(&path, false).unwrap_err();
    assert!(err.to_string().contains("line 2"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_concurrent_readers_share_cache() {
    let dir = temp_dir("readers");
    let registry = ThemeRegistry::new();
    let theme = registry.create("T", "shared").unwrap();
    theme.open_for_writing(&dir, "Shared").unwrap();
    for i in 0..500 {
        theme.write(&Fact::new(format!("<e{i}>"), "<r>", "<x>")).unwrap();
    }
    theme.close().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let theme = Arc::clone(&theme);
            thread::spawn(move || theme.fact_store(false).unwrap())
        })
        .collect();
    let stores: Vec<Arc<FactStore>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(stores.iter().all(|s| Arc::ptr_eq(s, &stores[0])));
    assert_eq!(stores[0].len(), 500);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_translation_view_through_theme() {
    let dir = temp_dir("dictionary");
    std::fs::write(
        dir.join("_dictionary_de.ttl"),
        format!(
            "\"Haus\"@de {HAS_TRANSLATION} \"house\" .\n\"Baum\"@de {HAS_TRANSLATION} \"tree\" .\n"
        ),
    )
    .unwrap();

    let registry = ThemeRegistry::new();
    let theme = registry
        .create_localized("_dictionary", "de", "German dictionary", ThemeGroup::Multilingual)
        .unwrap();
    theme.bind_to_folder(&dir).unwrap();

    let view = theme.translation_view().unwrap();
    assert!(theme.is_cached());
    assert_eq!(view.get("\"Haus\"@de"), Some("\"house\""));
    assert_eq!(view.len(), 2);

    theme.unbind().unwrap();
    assert!(!theme.is_cached());
    assert_eq!(view.get("\"Baum\"@de"), Some("\"tree\""));
    assert!(matches!(theme.translation_view(), Err(ThemeError::Unbound(_))));

    let _ = std::fs::remove_dir_all(&dir);
}
