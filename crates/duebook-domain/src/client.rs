//! Client records and the transactions they own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, Transaction};

/// A counterparty whose debts and payments are tracked.
///
/// Transactions are kept in insertion order; any other ordering is a derived
/// view. Balances are never stored, they are folded from `transactions` on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<ImageRef>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone: phone.into(),
            avatar: None,
            transactions: Vec::new(),
            created_at,
        }
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> Uuid {
        let id = transaction.id;
        self.transactions.push(transaction);
        id
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn remove_transaction(&mut self, id: Uuid) -> Option<Transaction> {
        let index = self.transactions.iter().position(|txn| txn.id == id)?;
        Some(self.transactions.remove(index))
    }

    /// Timestamp of the latest transaction, or the creation time for an empty client.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.transactions
            .iter()
            .map(|txn| txn.occurred_at)
            .max()
            .unwrap_or(self.created_at)
    }
}

impl Identifiable for Client {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Client {
    fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.phone)
    }
}
