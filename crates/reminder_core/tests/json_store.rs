use chrono::{NaiveDate, NaiveDateTime};
use reminder_core::{
    JsonFileStore, LoadCorruption, PersistenceError, Reminder, ReminderCollection, ReminderStore,
};
use std::collections::HashSet;
use uuid::Uuid;

fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("tasks.json"));

    assert!(store.try_load().unwrap().is_empty());
}

#[test]
fn save_then_load_preserves_every_field_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("tasks.json"));

    let mut collection = ReminderCollection::open(store.clone());
    let rent = collection.add("Pay rent", at(9, 0, 0)).unwrap();
    let plants = collection.add("Water plants", at(7, 15, 30)).unwrap();
    collection.mark_notified(plants.id()).unwrap();

    let loaded = store.try_load().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id(), rent.id());
    assert_eq!(loaded[0].description(), "Pay rent");
    assert_eq!(loaded[0].due_at(), at(9, 0, 0));
    assert!(!loaded[0].notified());
    assert_eq!(loaded[1].id(), plants.id());
    assert!(loaded[1].notified());
}

#[test]
fn save_fully_rewrites_previous_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let store = JsonFileStore::new(&path);

    let many: Vec<_> = (0..5)
        .map(|n| Reminder::new(format!("item {n}"), at(9, n, 0)).unwrap())
        .collect();
    store.save(&many).unwrap();
    store.save(&many[..1]).unwrap();

    assert_eq!(store.try_load().unwrap(), many[..1].to_vec());
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("tasks.json")]);
}

#[test]
fn save_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("nested").join("deeper").join("tasks.json"));

    store
        .save(&[Reminder::new("Pay rent", at(9, 0, 0)).unwrap()])
        .unwrap();
    assert_eq!(store.try_load().unwrap().len(), 1);
}

#[test]
fn unparseable_content_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(&path, "{ this is not json").unwrap();
    let store = JsonFileStore::new(&path);

    assert!(matches!(store.try_load(), Err(LoadCorruption::Parse(_))));
    assert!(store.load().is_empty());
}

#[test]
fn duplicate_ids_are_treated_as_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let id = Uuid::new_v4();
    let body = serde_json::json!([
        { "id": id, "desc": "a", "due": "2024-01-01T09:00:00", "notified": false },
        { "id": id, "desc": "b", "due": "2024-01-01T10:00:00", "notified": false }
    ]);
    std::fs::write(&path, body.to_string()).unwrap();
    let store = JsonFileStore::new(&path);

    assert!(matches!(
        store.try_load(),
        Err(LoadCorruption::DuplicateId(dup)) if dup == id
    ));
    assert!(store.load().is_empty());
}

#[test]
fn reads_files_written_without_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".reminder_app_tasks.json");
    std::fs::write(
        &path,
        r#"[
  {
    "desc": "Pay rent",
    "due": "2024-01-01T09:00:00",
    "notified": false
  },
  {
    "desc": "Call mum",
    "due": "2023-12-31T18:45:00",
    "notified": true
  }
]"#,
    )
    .unwrap();
    let store = JsonFileStore::new(&path);

    let loaded = store.try_load().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_ne!(loaded[0].id(), loaded[1].id());
    assert_eq!(loaded[0].description(), "Pay rent");
    assert!(loaded[1].notified());
}

const LEGACY_FILE: &str = r#"[
  { "desc": "Pay rent", "due": "2024-01-01T09:00:00", "notified": false },
  { "desc": "Call mum", "due": "2023-12-31T18:45:00", "notified": true }
]"#;

#[test]
fn legacy_ids_are_stable_across_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".reminder_app_tasks.json");
    std::fs::write(&path, LEGACY_FILE).unwrap();

    let first: Vec<Uuid> = JsonFileStore::new(&path)
        .try_load()
        .unwrap()
        .iter()
        .map(Reminder::id)
        .collect();
    let second: Vec<Uuid> = JsonFileStore::new(&path)
        .try_load()
        .unwrap()
        .iter()
        .map(Reminder::id)
        .collect();

    assert_eq!(first, second);
}

#[test]
fn id_listed_from_legacy_file_can_be_removed_by_next_process() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".reminder_app_tasks.json");
    std::fs::write(&path, LEGACY_FILE).unwrap();

    let listed = ReminderCollection::open(JsonFileStore::new(&path)).all()[1].id();

    let mut collection = ReminderCollection::open(JsonFileStore::new(&path));
    let removed = collection.remove(&HashSet::from([listed])).unwrap();
    assert_eq!(removed, 1);

    let reloaded = JsonFileStore::new(&path).try_load().unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].description(), "Pay rent");
}

#[test]
fn identical_legacy_records_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let record = r#"{ "desc": "Stretch", "due": "2024-01-01T09:00:00" }"#;
    std::fs::write(&path, format!("[{record}, {record}]")).unwrap();

    let loaded = JsonFileStore::new(&path).try_load().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_ne!(loaded[0].id(), loaded[1].id());
}

#[test]
fn blank_description_in_file_is_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(&path, r#"[{ "desc": "  ", "due": "2024-01-01T09:00:00" }]"#).unwrap();
    let store = JsonFileStore::new(&path);

    assert!(matches!(
        store.try_load(),
        Err(LoadCorruption::InvalidRecord(message)) if message.contains("record 0")
    ));
}

#[cfg(unix)]
#[test]
fn write_failure_is_reported() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let locked = dir.path().join("locked");
    std::fs::create_dir(&locked).unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o500)).unwrap();
    let store = JsonFileStore::new(locked.join("tasks.json"));

    let result = store.save(&[Reminder::new("Pay rent", at(9, 0, 0)).unwrap()]);
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o700)).unwrap();

    // Running as root bypasses directory permissions.
    if let Err(err) = result {
        assert!(matches!(err, PersistenceError::Io { .. }));
    }
}
