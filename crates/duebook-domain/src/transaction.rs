//! Domain model for debt and payment records.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, DomainError};

/// Closed classification of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Increases what the client owes.
    Debt,
    /// Decreases what the client owes.
    Payment,
}

impl TransactionKind {
    /// Direction applied to the amount when folding a balance.
    pub fn sign(self) -> f64 {
        match self {
            TransactionKind::Debt => 1.0,
            TransactionKind::Payment => -1.0,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Debt => "Debt",
            TransactionKind::Payment => "Payment",
        };
        f.write_str(label)
    }
}

impl FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "debt" => Ok(TransactionKind::Debt),
            "payment" => Ok(TransactionKind::Payment),
            _ => Err(DomainError::UnsupportedTransactionKind(input.trim().to_string())),
        }
    }
}

/// A single immutable ledger entry. Transactions are only ever created or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    /// Settlement deadline; only meaningful for debts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<ImageRef>,
}

impl Transaction {
    pub fn new(kind: TransactionKind, amount: Amount, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            description: None,
            occurred_at,
            due_date: None,
            attachment: None,
        }
    }

    pub fn debt(amount: Amount, occurred_at: DateTime<Utc>) -> Self {
        Self::new(TransactionKind::Debt, amount, occurred_at)
    }

    pub fn payment(amount: Amount, occurred_at: DateTime<Utc>) -> Self {
        Self::new(TransactionKind::Payment, amount, occurred_at)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_attachment(mut self, attachment: ImageRef) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn is_debt(&self) -> bool {
        self.kind == TransactionKind::Debt
    }

    /// Amount with the kind's direction applied: positive for debts, negative for payments.
    pub fn signed_amount(&self) -> f64 {
        self.kind.sign() * self.amount.value()
    }

    /// Calendar day (UTC) on which the entry was recorded.
    pub fn occurred_on(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }

    /// Free-text label, falling back to the kind name.
    pub fn label(&self) -> String {
        match self.description.as_deref() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => self.kind.to_string(),
        }
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        format!("txn:{} [{} {}]", self.id, self.kind, self.amount)
    }
}
