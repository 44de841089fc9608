use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use duebook_core::{ClientBackupInfo, ClientStore, CoreError, CoreResult};
use duebook_domain::Client;

/// Version written into every saved document.
pub const SCHEMA_VERSION: u32 = 1;

const CLIENTS_FILE: &str = "clients.json";
const BACKUPS_DIR: &str = "backups";
const BACKUP_PREFIX: &str = "clients";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

#[derive(Serialize)]
struct ClientDocumentRef<'a> {
    schema_version: u32,
    saved_at: DateTime<Utc>,
    clients: &'a [Client],
}

#[derive(Deserialize)]
struct ClientDocument {
    schema_version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    clients: Vec<Client>,
}

/// Either the versioned envelope or a bare client array from older exports.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBook {
    Document(ClientDocument),
    Legacy(Vec<Client>),
}

/// Filesystem-backed JSON persistence for the client book and its backups.
#[derive(Debug, Clone)]
pub struct JsonClientStore {
    data_root: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonClientStore {
    pub fn new(data_root: impl Into<PathBuf>) -> CoreResult<Self> {
        Self::with_retention(data_root, DEFAULT_RETENTION)
    }

    pub fn with_retention(data_root: impl Into<PathBuf>, retention: usize) -> CoreResult<Self> {
        let data_root = data_root.into();
        let backups_dir = data_root.join(BACKUPS_DIR);
        fs::create_dir_all(&data_root)?;
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            data_root,
            backups_dir,
            retention: retention.max(1),
        })
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn clients_path(&self) -> PathBuf {
        self.data_root.join(CLIENTS_FILE)
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    fn backup_existing_file(&self, path: &Path) -> CoreResult<()> {
        if !path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.backups_dir)?;
        let file_name = self.next_backup_name(Utc::now())?;
        let backup_path = self.backups_dir.join(&file_name);
        fs::copy(path, &backup_path)?;
        debug!(backup = %file_name, "previous client book backed up");
        self.prune_backups()
    }

    /// Name for a backup taken at `now`.
    ///
    /// Backups within the same second get a sequence one above the highest
    /// existing one, so a fresh backup always sorts newest even after
    /// pruning freed lower sequence numbers.
    fn next_backup_name(&self, now: DateTime<Utc>) -> CoreResult<String> {
        let timestamp = now.format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let highest = self
            .list_backups()?
            .iter()
            .filter_map(|entry| parse_backup_timestamp(&entry.id))
            .filter(|(at, _)| at.timestamp() == now.timestamp())
            .map(|(_, sequence)| sequence)
            .max();
        Ok(match highest {
            None => format!("{BACKUP_PREFIX}_{timestamp}.{BACKUP_EXTENSION}"),
            Some(sequence) => format!(
                "{BACKUP_PREFIX}_{timestamp}-{}.{BACKUP_EXTENSION}",
                sequence + 1
            ),
        })
    }

    fn prune_backups(&self) -> CoreResult<()> {
        for entry in self.list_backups()?.into_iter().skip(self.retention) {
            if let Some(path) = entry.path {
                if let Err(err) = fs::remove_file(&path) {
                    warn!(backup = %entry.id, error = %err, "failed to prune backup");
                }
            }
        }
        Ok(())
    }
}

impl ClientStore for JsonClientStore {
    fn load_clients(&self) -> CoreResult<Vec<Client>> {
        let path = self.clients_path();
        if !path.exists() {
            debug!(path = %path.display(), "no client book on disk yet");
            return Ok(Vec::new());
        }
        load_clients_from_path(&path)
    }

    fn save_clients(&self, clients: &[Client]) -> CoreResult<()> {
        let path = self.clients_path();
        self.backup_existing_file(&path)?;
        save_clients_to_path(clients, &path)?;
        info!(clients = clients.len(), path = %path.display(), "client book saved");
        Ok(())
    }

    fn list_backups(&self) -> CoreResult<Vec<ClientBackupInfo>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some(stamp) = parse_backup_timestamp(file_name) else {
                continue;
            };
            entries.push((
                stamp,
                ClientBackupInfo {
                    id: file_name.to_string(),
                    created_at: stamp.0,
                    size_bytes: fs::metadata(&path).ok().map(|meta| meta.len()),
                    path: Some(path.clone()),
                },
            ));
        }
        entries.sort_by_key(|(stamp, _)| Reverse(*stamp));
        Ok(entries.into_iter().map(|(_, info)| info).collect())
    }

    fn restore_backup(&self, id: &str) -> CoreResult<Vec<Client>> {
        let source = self.backups_dir.join(id);
        if parse_backup_timestamp(id).is_none() || !source.is_file() {
            return Err(CoreError::Storage(format!("backup `{id}` not found")));
        }
        let clients = load_clients_from_path(&source)?;
        self.save_clients(&clients)?;
        info!(backup = %id, clients = clients.len(), "backup restored");
        Ok(clients)
    }
}

/// Writes the client book to an arbitrary path, staging through a temporary file.
pub fn save_clients_to_path(clients: &[Client], path: &Path) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write_file(&tmp, &serialize_clients(clients)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a client book from the provided filesystem path.
pub fn load_clients_from_path(path: &Path) -> CoreResult<Vec<Client>> {
    let data = fs::read_to_string(path)?;
    let stored: StoredBook =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    match stored {
        StoredBook::Document(document) => {
            if document.schema_version > SCHEMA_VERSION {
                return Err(CoreError::Storage(format!(
                    "schema version {} is newer than supported version {}",
                    document.schema_version, SCHEMA_VERSION
                )));
            }
            debug!(saved_at = ?document.saved_at, "loaded versioned client book");
            Ok(document.clients)
        }
        StoredBook::Legacy(clients) => {
            debug!("loaded unversioned client book");
            Ok(clients)
        }
    }
}

/// Returns the backup's timestamp and collision sequence.
fn parse_backup_timestamp(name: &str) -> Option<(DateTime<Utc>, u32)> {
    let stem = name
        .strip_suffix(&format!(".{BACKUP_EXTENSION}"))?
        .strip_prefix(&format!("{BACKUP_PREFIX}_"))?;
    let (stamp, sequence) = match stem.split_once('-') {
        Some((stamp, sequence)) => (stamp, sequence.parse().ok()?),
        None => (stem, 0),
    };
    let (date, time) = stamp.split_once('_')?;
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| (DateTime::from_naive_utc_and_offset(naive, Utc), sequence))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> CoreResult<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn serialize_clients(clients: &[Client]) -> CoreResult<String> {
    let document = ClientDocumentRef {
        schema_version: SCHEMA_VERSION,
        saved_at: Utc::now(),
        clients,
    };
    serde_json::to_string_pretty(&document).map_err(|err| CoreError::Serde(err.to_string()))
}
