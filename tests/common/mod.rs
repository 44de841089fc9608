#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, TimeZone, Utc};
use duebook::core::BookManager;
use duebook_config::ConfigManager;
use duebook_core::FixedClock;
use duebook_storage_json::JsonClientStore;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
}

pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Opens a book over the JSON store under `base`, pinned to [`fixed_now`].
pub fn open_book(base: &Path) -> BookManager {
    let store = JsonClientStore::with_retention(base.join("data"), 3).expect("create json store");
    BookManager::open(Box::new(store), Box::new(FixedClock(fixed_now()))).expect("open book")
}

/// Creates isolated managers backed by unique directories for each test.
pub fn setup_test_env() -> (BookManager, ConfigManager, PathBuf) {
    let base = temp_base();
    let book = open_book(&base);
    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");
    (book, config_manager, base)
}
