use chrono::{TimeZone, Utc};
use duebook_core::{ClientStore, CoreError};
use duebook_domain::{Amount, Client, Transaction};
use duebook_storage_json::{load_clients_from_path, JsonClientStore, SCHEMA_VERSION};
use regex::Regex;
use std::fs;
use tempfile::tempdir;

fn sample_client(name: &str) -> Client {
    let opened = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
    let mut client = Client::new(name, "01005556666", opened);
    client.add_transaction(
        Transaction::debt(Amount::new(750.5).unwrap(), opened)
            .with_description("Invoice 14")
            .with_due_date(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
    );
    client.add_transaction(Transaction::payment(Amount::new(250.0).unwrap(), opened));
    client
}

#[test]
fn missing_file_loads_as_empty_book() {
    let dir = tempdir().expect("tempdir");
    let store = JsonClientStore::new(dir.path().join("data")).expect("create store");
    assert!(store.load_clients().expect("load").is_empty());
    assert!(store.list_backups().expect("list").is_empty());
}

#[test]
fn json_store_saves_and_loads_clients() {
    let dir = tempdir().expect("tempdir");
    let store = JsonClientStore::new(dir.path()).expect("create store");
    let clients = vec![sample_client("Walid"), sample_client("Yara")];

    store.save_clients(&clients).expect("save");
    let loaded = store.load_clients().expect("load");
    assert_eq!(loaded, clients);

    let raw = fs::read_to_string(store.clients_path()).expect("read file");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(value["schema_version"], SCHEMA_VERSION);
    assert_eq!(value["clients"][0]["transactions"][0]["kind"], "DEBT");
    assert!(!dir.path().join("clients.json.tmp").exists());
}

#[test]
fn overwriting_creates_named_backups_with_retention() {
    let dir = tempdir().expect("tempdir");
    let store = JsonClientStore::with_retention(dir.path(), 2).expect("create store");
    let mut clients = Vec::new();
    for idx in 0..5 {
        clients.push(sample_client(&format!("Client {idx}")));
        store.save_clients(&clients).expect("save");
    }

    let backups = store.list_backups().expect("list backups");
    assert_eq!(backups.len(), 2);
    let pattern = Regex::new(r"^clients_\d{8}_\d{6}(-\d+)?\.json$").unwrap();
    for backup in &backups {
        assert!(pattern.is_match(&backup.id), "unexpected name {}", backup.id);
    }

    let newest = store
        .restore_backup(&backups[0].id)
        .expect("restore newest backup");
    assert_eq!(newest.len(), 4);
    assert_eq!(store.load_clients().expect("load").len(), 4);
}

#[test]
fn restoring_unknown_backup_fails() {
    let dir = tempdir().expect("tempdir");
    let store = JsonClientStore::new(dir.path()).expect("create store");
    let err = store
        .restore_backup("clients_20200101_000000.json")
        .expect_err("missing backup");
    assert!(matches!(err, CoreError::Storage(_)));
    assert!(store.restore_backup("../clients.json").is_err());
}

#[test]
fn loads_unversioned_client_arrays() {
    let dir = tempdir().expect("tempdir");
    let store = JsonClientStore::new(dir.path()).expect("create store");
    let clients = vec![sample_client("Legacy")];
    let legacy = serde_json::to_string(&clients).expect("serialize");
    fs::write(store.clients_path(), legacy).expect("write legacy file");

    let loaded = store.load_clients().expect("load legacy");
    assert_eq!(loaded, clients);
}

#[test]
fn rejects_newer_schema_versions() {
    let dir = tempdir().expect("tempdir");
    let store = JsonClientStore::new(dir.path()).expect("create store");
    let future = format!(r#"{{"schema_version": {}, "clients": []}}"#, SCHEMA_VERSION + 1);
    fs::write(store.clients_path(), future).expect("write file");

    let err = store.load_clients().expect_err("newer schema must fail");
    assert!(matches!(err, CoreError::Storage(ref message) if message.contains("newer")));
}

#[test]
fn rejects_negative_amounts_on_load() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    let mut value = serde_json::to_value(vec![sample_client("Broken")]).expect("serialize");
    value[0]["transactions"][0]["amount"] = serde_json::json!(-10.0);
    fs::write(&path, value.to_string()).expect("write file");

    assert!(matches!(
        load_clients_from_path(&path),
        Err(CoreError::Serde(_))
    ));
}

#[test]
fn listed_backups_report_sizes() {
    let dir = tempdir().expect("tempdir");
    let store = JsonClientStore::new(dir.path()).expect("create store");
    store.save_clients(&[sample_client("A")]).expect("first save");
    store.save_clients(&[]).expect("second save");

    let backups = store.list_backups().expect("backups");
    assert_eq!(backups.len(), 1);
    assert!(backups[0].size_bytes.is_some_and(|size| size > 0));
    let path = backups[0].path.as_ref().expect("file-backed backup");
    assert!(path.starts_with(store.backups_dir()));
}

#[test]
fn rapid_saves_keep_the_newest_backups() {
    let dir = tempdir().expect("tempdir");
    let store = JsonClientStore::with_retention(dir.path(), 2).expect("create store");
    let mut clients = Vec::new();
    for idx in 0..8 {
        clients.push(sample_client(&format!("Client {idx}")));
        store.save_clients(&clients).expect("save");
    }

    let backups = store.list_backups().expect("list backups");
    assert_eq!(backups.len(), 2);
    let sizes: Vec<usize> = backups
        .iter()
        .map(|backup| {
            let path = backup.path.as_ref().expect("backup path");
            load_clients_from_path(path).expect("load backup").len()
        })
        .collect();
    assert_eq!(sizes, vec![7, 6]);
}
