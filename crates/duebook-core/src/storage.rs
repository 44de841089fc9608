use std::{
    collections::HashSet,
    fmt,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use chrono::{DateTime, Utc};

use duebook_domain::{Client, TransactionKind};

use crate::{Clock, CoreError, CoreResult, SystemClock};

/// Describes a persisted snapshot of the client book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientBackupInfo {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Serialized size, when the store can tell.
    pub size_bytes: Option<u64>,
    /// Location on disk for file-backed stores.
    pub path: Option<PathBuf>,
}

/// Abstraction over persistence backends holding the client book.
pub trait ClientStore: Send + Sync {
    fn load_clients(&self) -> CoreResult<Vec<Client>>;
    fn save_clients(&self, clients: &[Client]) -> CoreResult<()>;
    /// Snapshots newest first.
    fn list_backups(&self) -> CoreResult<Vec<ClientBackupInfo>>;
    /// Makes the backup the current book and returns its clients.
    fn restore_backup(&self, id: &str) -> CoreResult<Vec<Client>>;
}

/// Process-local store keeping every saved generation as a backup.
pub struct MemoryClientStore {
    state: Mutex<MemoryState>,
    fail_saves: AtomicBool,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Default)]
struct MemoryState {
    current: Vec<Client>,
    history: Vec<(ClientBackupInfo, Vec<Client>)>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::with_clients(Vec::new())
    }

    pub fn with_clients(clients: Vec<Client>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                current: clients,
                history: Vec::new(),
            }),
            fail_saves: AtomicBool::new(false),
            clock: Arc::new(SystemClock),
        }
    }

    /// Stamps backups with `clock` instead of the system time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Makes subsequent saves fail, for exercising error paths.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> CoreResult<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))
    }
}

impl Default for MemoryClientStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryClientStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryClientStore")
            .field("state", &self.state)
            .field("fail_saves", &self.fail_saves)
            .finish_non_exhaustive()
    }
}

impl ClientStore for MemoryClientStore {
    fn load_clients(&self) -> CoreResult<Vec<Client>> {
        Ok(self.lock()?.current.clone())
    }

    fn save_clients(&self, clients: &[Client]) -> CoreResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("memory store rejected the save".into()));
        }
        let mut state = self.lock()?;
        let previous = std::mem::replace(&mut state.current, clients.to_vec());
        let info = ClientBackupInfo {
            id: format!("gen-{}", state.history.len() + 1),
            created_at: self.clock.now(),
            size_bytes: None,
            path: None,
        };
        state.history.push((info, previous));
        Ok(())
    }

    fn list_backups(&self) -> CoreResult<Vec<ClientBackupInfo>> {
        Ok(self
            .lock()?
            .history
            .iter()
            .rev()
            .map(|(info, _)| info.clone())
            .collect())
    }

    fn restore_backup(&self, id: &str) -> CoreResult<Vec<Client>> {
        let mut state = self.lock()?;
        let clients = state
            .history
            .iter()
            .find(|(info, _)| info.id == id)
            .map(|(_, clients)| clients.clone())
            .ok_or_else(|| CoreError::Storage(format!("backup `{id}` not found")))?;
        state.current = clients.clone();
        Ok(clients)
    }
}

/// Detects anomalies within a client book snapshot.
pub fn client_warnings(clients: &[Client]) -> Vec<String> {
    let mut client_ids = HashSet::new();
    let mut transaction_ids = HashSet::new();
    let mut warnings = Vec::new();

    for client in clients {
        if !client_ids.insert(client.id) {
            warnings.push(format!("client id {} appears more than once", client.id));
        }
        if client.name.trim().is_empty() {
            warnings.push(format!("client {} has no name", client.id));
        }
        for txn in &client.transactions {
            if !transaction_ids.insert(txn.id) {
                warnings.push(format!("transaction id {} appears more than once", txn.id));
            }
            if txn.kind == TransactionKind::Payment && txn.due_date.is_some() {
                warnings.push(format!(
                    "payment {} of client {} carries a due date",
                    txn.id, client.id
                ));
            }
        }
    }
    warnings
}
