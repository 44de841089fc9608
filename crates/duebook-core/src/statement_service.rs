//! Shareable texts derived from a client's history: account statements,
//! payment reminders and contact cards.

use chrono::{DateTime, Utc};

use duebook_domain::{Client, Transaction};

use crate::{
    client_balance, collect_overdue, compute_balance, filter_transactions,
    format::{format_amount, format_timestamp},
    CoreError, CoreResult, FilterCriteria,
};

/// Rendering knobs for statements and reminders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementOptions {
    pub currency: String,
    /// Most recent entries listed in a statement.
    pub history_limit: usize,
}

impl Default for StatementOptions {
    fn default() -> Self {
        Self {
            currency: "EGP".into(),
            history_limit: 15,
        }
    }
}

pub struct StatementService;

impl StatementService {
    /// Statement over the filtered history, newest entries first.
    pub fn account_statement(
        client: &Client,
        criteria: &FilterCriteria,
        options: &StatementOptions,
    ) -> String {
        let filtered = filter_transactions(&client.transactions, criteria);
        let filtered_balance = compute_balance(filtered.iter().copied());
        let mut lines = vec![
            "Account statement".to_string(),
            format!("Name: {}", client.name),
            format!("Phone: {}", client.phone),
            "--------------------------".to_string(),
        ];
        if filtered.is_empty() {
            lines.push("No transactions.".to_string());
        }
        for txn in filtered.iter().take(options.history_limit) {
            lines.push(format!(
                "- {}: {} ({})",
                format_timestamp(txn.occurred_at),
                format_amount(txn.amount.value(), &options.currency),
                txn.label()
            ));
        }
        lines.push("--------------------------".to_string());
        lines.push(format!(
            "Statement balance: {}",
            format_amount(filtered_balance, &options.currency)
        ));
        lines.push(format!(
            "Total balance: {}",
            format_amount(client_balance(client), &options.currency)
        ));
        lines.join("\n")
    }

    /// Reminder for the whole outstanding balance.
    ///
    /// Refused when the client owes nothing.
    pub fn reminder_for_balance(
        client: &Client,
        options: &StatementOptions,
        now: DateTime<Utc>,
    ) -> CoreResult<String> {
        let balance = client_balance(client);
        if balance <= 0.0 {
            return Err(CoreError::Validation(format!(
                "{} has no outstanding balance",
                client.name
            )));
        }
        let overdue = collect_overdue(&client.transactions, now).len();
        let mut message = format!(
            "Hello {}, this is a reminder that your outstanding balance is {}.",
            client.name,
            format_amount(balance, &options.currency)
        );
        if overdue > 0 {
            message.push_str(&format!(
                "\n{overdue} transaction(s) are past their due date."
            ));
        }
        message.push_str("\nPlease settle at your earliest convenience. Thank you.");
        Ok(message)
    }

    /// Reminder about a single transaction, sent regardless of the balance.
    pub fn reminder_for_transaction(
        client: &Client,
        transaction: &Transaction,
        options: &StatementOptions,
    ) -> String {
        let due = transaction
            .due_date
            .map(|due| format!(", due on {}", format_timestamp(due)))
            .unwrap_or_default();
        format!(
            "Hello {}, this is a reminder about \"{}\" recorded on {}{} for {}. Please settle it. Thank you.",
            client.name,
            transaction.label(),
            format_timestamp(transaction.occurred_at),
            due,
            format_amount(transaction.amount.value(), &options.currency)
        )
    }

    pub fn contact_card(client: &Client) -> String {
        format!("Name: {}\nPhone: {}", client.name, client.phone)
    }

    /// Phone number in international form for messaging links: digits only,
    /// local `01` numbers get the `2` country prefix.
    pub fn messaging_number(phone: &str) -> String {
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
        if digits.starts_with("01") {
            format!("2{digits}")
        } else {
            digits
        }
    }
}
