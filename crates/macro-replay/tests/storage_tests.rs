//! Integration tests for saving, loading and importing recordings.

use std::fs;

use chrono::{Duration as ChronoDuration, Utc};
use macro_replay::config::StorageConfig;
use macro_replay::event::{EventKind, MacroEvent, MouseButton};
use macro_replay::storage::{RecordingStore, sanitize_file_name};
use macro_replay::{MacroError, Recording};
use proptest::prelude::*;

fn sample(name: &str) -> Recording {
    Recording::from_events(
        name,
        vec![
            MacroEvent::pointer_move(10, 20, 0.0),
            MacroEvent::button(EventKind::ButtonDown(MouseButton::Left), 10, 20, 16.666_666_666_7),
            MacroEvent::button(EventKind::ButtonUp(MouseButton::Left), 10, 20, 83.1),
            MacroEvent::key(EventKind::KeyDown, 0x0D, 120.000_001),
            MacroEvent::wheel(-240, 5, 5, 150.5),
            MacroEvent::delay(250.0, 400.0),
        ],
    )
}

/// Write a recording straight to disk with a fixed modification time.
fn write_with_modified(store: &RecordingStore, mut recording: Recording, minutes_ago: i64) {
    recording.modified_at = Utc::now() - ChronoDuration::minutes(minutes_ago);
    let path = store.path_for(&recording);
    fs::write(path, recording.to_json_pretty().unwrap()).unwrap();
}

#[test]
fn load_all_skips_corrupt_and_orders_by_modified() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingStore::new(dir.path());

    write_with_modified(&store, sample("older"), 60);
    write_with_modified(&store, sample("newer"), 5);
    fs::write(dir.path().join("broken.macro"), "{\"id\": 42, \"events\": [").unwrap();
    fs::write(dir.path().join("notes.txt"), "not a recording").unwrap();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].name, "newer");
    assert_eq!(loaded[1].name, "older");
    assert!(loaded[0].modified_at > loaded[1].modified_at);
}

#[test]
fn saved_events_are_exact() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingStore::new(dir.path());
    let mut recording = sample("exact");
    recording.set_description("round trip");
    recording.add_tag("smoke");
    recording.set_loop_count(0);

    store.save(&mut recording).unwrap();
    let loaded = store.load("exact.macro").unwrap().unwrap();

    assert_eq!(loaded.events(), recording.events());
    assert_eq!(loaded.total_duration(), recording.total_duration());
    assert_eq!(loaded.event_count(), recording.event_count());
    assert_eq!(loaded, recording);
}

#[test]
fn saved_document_uses_camel_case_and_omits_derived_fields() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingStore::new(dir.path());
    let mut recording = sample("fields");
    let path = store.save(&mut recording).unwrap();

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    for key in [
        "id",
        "name",
        "description",
        "tags",
        "createdAt",
        "modifiedAt",
        "events",
        "playbackSpeed",
        "loopCount",
        "humanizationLevel",
    ] {
        assert!(doc.get(key).is_some(), "missing {key}");
    }
    assert!(doc.get("totalDuration").is_none());
    assert!(doc.get("eventCount").is_none());
}

#[test]
fn save_overwrites_same_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingStore::new(dir.path());

    let mut first = sample("same");
    store.save(&mut first).unwrap();
    let mut second = Recording::new("same");
    store.save(&mut second).unwrap();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, second.id);
}

#[test]
fn import_reissues_identity_and_saves() {
    let source_dir = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingStore::new(dir.path());

    let original = sample("shared");
    let exported = source_dir.path().join("shared.macro");
    store.export(&original, &exported).unwrap();

    let imported = store.import(&exported).unwrap().unwrap();
    assert_ne!(imported.id, original.id);
    assert_eq!(imported.name, "shared");
    assert_eq!(imported.events(), original.events());
    assert!(imported.created_at >= original.created_at);
    assert!(store.path_for(&imported).is_file());
}

#[test]
fn import_corrupt_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.macro");
    fs::write(&bad, "garbage").unwrap();

    let store = RecordingStore::new(dir.path().join("store"));
    assert!(matches!(
        store.import(&bad),
        Err(MacroError::Serialization { .. })
    ));
}

#[test]
fn custom_extension_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingStore::from_config(&StorageConfig::new(dir.path()).extension("json"));
    let mut recording = sample("ext");
    let path = store.save(&mut recording).unwrap();
    assert_eq!(path.extension().unwrap(), "json");

    write_with_modified(&RecordingStore::new(dir.path()), sample("other"), 1);
    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].name, "ext");
}

#[test]
fn names_with_separators_stay_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingStore::new(dir.path());
    let mut recording = sample("../escape/attempt");
    let path = store.save(&mut recording).unwrap();
    assert_eq!(path.parent().unwrap(), dir.path());
}

proptest! {
    #[test]
    fn sanitized_names_have_no_separators(name in ".{0,40}") {
        let clean = sanitize_file_name(&name);
        prop_assert_eq!(clean.chars().count(), name.chars().count());
        prop_assert!(!clean.contains('/'));
        prop_assert!(!clean.contains('\\'));
        prop_assert!(!clean.chars().any(char::is_control));
    }

    #[test]
    fn json_preserves_events(
        raw in prop::collection::vec((0.0f64..1.0e7, any::<i32>(), any::<i32>(), any::<u32>()), 0..50)
    ) {
        let mut t = 0.0;
        let events: Vec<_> = raw
            .iter()
            .map(|(gap, x, y, code)| {
                t += gap;
                let mut e = MacroEvent::pointer_move(*x, *y, t);
                e.key_code = *code;
                e
            })
            .collect();
        let recording = Recording::from_events("prop", events);

        let back = Recording::from_json(&recording.to_json().unwrap()).unwrap();
        prop_assert_eq!(back.events(), recording.events());
    }
}
