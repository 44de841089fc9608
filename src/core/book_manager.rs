use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use duebook_core::{
    client_warnings, ClientBackupInfo, ClientService, ClientStore, Clock, CoreResult, NewClient,
    NewTransaction,
};
use duebook_domain::{Client, Transaction};

use crate::errors::AppResult;

/// Outcome of the most recent exchange with storage.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Synced {
        at: DateTime<Utc>,
        clients: usize,
    },
    Failed {
        message: String,
    },
}

impl SyncStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncStatus::Failed { .. })
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => f.write_str("not synced yet"),
            SyncStatus::Synced { at, clients } => write!(
                f,
                "synced {clients} client(s) at {}",
                at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            SyncStatus::Failed { message } => write!(f, "sync failed: {message}"),
        }
    }
}

/// Facade that owns the client book and keeps it in step with storage.
///
/// Mutations run against a cloned snapshot which is saved first and only
/// then swapped in, so a failed save leaves the in-memory book untouched.
pub struct BookManager {
    clients: Vec<Client>,
    store: Box<dyn ClientStore>,
    clock: Box<dyn Clock>,
    status: SyncStatus,
    warnings: Vec<String>,
}

impl BookManager {
    pub fn new(store: Box<dyn ClientStore>, clock: Box<dyn Clock>) -> Self {
        Self {
            clients: Vec::new(),
            store,
            clock,
            status: SyncStatus::Idle,
            warnings: Vec::new(),
        }
    }

    /// Creates the manager and loads whatever the store holds.
    pub fn open(store: Box<dyn ClientStore>, clock: Box<dyn Clock>) -> AppResult<Self> {
        let mut manager = Self::new(store, clock);
        manager.reload()?;
        Ok(manager)
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Data problems found in the most recently loaded or restored book.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn client(&self, id: Uuid) -> AppResult<&Client> {
        Ok(ClientService::find(&self.clients, id)?)
    }

    pub fn resolve_client(&self, reference: &str) -> AppResult<&Client> {
        Ok(ClientService::resolve_client(&self.clients, reference)?)
    }

    /// Replaces the in-memory book with the stored one and returns its size.
    pub fn reload(&mut self) -> AppResult<usize> {
        match self.store.load_clients() {
            Ok(clients) => {
                let count = self.adopt(clients);
                info!(clients = count, "client book loaded");
                Ok(count)
            }
            Err(err) => {
                self.mark_failed(&err.to_string());
                Err(err.into())
            }
        }
    }

    pub fn add_client(&mut self, input: NewClient) -> AppResult<Uuid> {
        self.mutate(|clients, now| ClientService::add_client(clients, input, now))
    }

    pub fn remove_client(&mut self, id: Uuid) -> AppResult<Client> {
        self.mutate(|clients, _| ClientService::remove_client(clients, id))
    }

    pub fn add_transaction(&mut self, client_id: Uuid, input: NewTransaction) -> AppResult<Uuid> {
        self.mutate(|clients, now| ClientService::add_transaction(clients, client_id, input, now))
    }

    pub fn remove_transaction(
        &mut self,
        client_id: Uuid,
        transaction_id: Uuid,
    ) -> AppResult<Transaction> {
        self.mutate(|clients, _| {
            ClientService::remove_transaction(clients, client_id, transaction_id)
        })
    }

    pub fn list_backups(&self) -> AppResult<Vec<ClientBackupInfo>> {
        Ok(self.store.list_backups()?)
    }

    /// Restores a stored backup and adopts it as the current book.
    pub fn restore_backup(&mut self, id: &str) -> AppResult<usize> {
        match self.store.restore_backup(id) {
            Ok(clients) => {
                let count = self.adopt(clients);
                info!(backup = %id, clients = count, "backup restored");
                Ok(count)
            }
            Err(err) => {
                self.mark_failed(&err.to_string());
                Err(err.into())
            }
        }
    }

    fn mutate<T>(
        &mut self,
        change: impl FnOnce(&mut Vec<Client>, DateTime<Utc>) -> CoreResult<T>,
    ) -> AppResult<T> {
        let now = self.clock.now();
        let mut snapshot = self.clients.clone();
        let outcome = change(&mut snapshot, now)?;
        if let Err(err) = self.store.save_clients(&snapshot) {
            self.mark_failed(&err.to_string());
            return Err(err.into());
        }
        self.clients = snapshot;
        self.mark_synced();
        debug!(clients = self.clients.len(), "client book committed");
        Ok(outcome)
    }

    /// Takes over a book read from storage and records its data warnings.
    fn adopt(&mut self, clients: Vec<Client>) -> usize {
        self.warnings = client_warnings(&clients);
        for warning in &self.warnings {
            warn!("{warning}");
        }
        self.clients = clients;
        self.mark_synced();
        self.clients.len()
    }

    fn mark_synced(&mut self) {
        self.status = SyncStatus::Synced {
            at: self.clock.now(),
            clients: self.clients.len(),
        };
    }

    fn mark_failed(&mut self, message: &str) {
        warn!(error = %message, "storage sync failed");
        self.status = SyncStatus::Failed {
            message: message.to_string(),
        };
    }
}
