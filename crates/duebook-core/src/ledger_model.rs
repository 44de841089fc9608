//! Balance, overdue, filtering and charting rules over client transactions.
//!
//! Every function here is pure. Callers pass an immutable snapshot of the
//! client list and, where time matters, an explicit `now`.

use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use duebook_domain::{Client, DomainError, Transaction, TransactionKind};

/// Distinct activity days kept by [`aggregate_by_day`].
pub const CHART_DAY_LIMIT: usize = 7;

/// Minor currency units per major unit; balances are settled to this precision.
const MINOR_UNITS: f64 = 100.0;

/// Rounds `value` to whole minor units, so float drift from sums such as
/// `0.1 + 0.2 - 0.3` settles to exactly zero.
pub fn round_to_minor_units(value: f64) -> f64 {
    let rounded = (value * MINOR_UNITS).round() / MINOR_UNITS;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Continues a balance fold from `opening` over `transactions`.
pub fn fold_balance<'a>(
    opening: f64,
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> f64 {
    round_to_minor_units(
        transactions
            .into_iter()
            .fold(opening, |balance, txn| balance + txn.signed_amount()),
    )
}

/// Debts minus payments. Zero for an empty collection.
pub fn compute_balance<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> f64 {
    fold_balance(0.0, transactions)
}

pub fn client_balance(client: &Client) -> f64 {
    compute_balance(&client.transactions)
}

/// A debt whose due date lies strictly before `now`. Payments are never overdue.
pub fn is_overdue(transaction: &Transaction, now: DateTime<Utc>) -> bool {
    transaction.kind == TransactionKind::Debt
        && transaction.due_date.is_some_and(|due| due < now)
}

/// Overdue debts in their original relative order.
pub fn collect_overdue<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    now: DateTime<Utc>,
) -> Vec<&'a Transaction> {
    transactions
        .into_iter()
        .filter(|txn| is_overdue(txn, now))
        .collect()
}

/// Single predicate behind every threshold alert.
pub fn is_highly_overdue(balance: f64, threshold: f64) -> bool {
    balance >= threshold
}

/// Kind restriction applied by [`FilterCriteria`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    Any,
    Debt,
    Payment,
}

impl KindFilter {
    pub fn matches(self, kind: TransactionKind) -> bool {
        match self {
            KindFilter::Any => true,
            KindFilter::Debt => kind == TransactionKind::Debt,
            KindFilter::Payment => kind == TransactionKind::Payment,
        }
    }
}

impl From<TransactionKind> for KindFilter {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Debt => KindFilter::Debt,
            TransactionKind::Payment => KindFilter::Payment,
        }
    }
}

impl FromStr for KindFilter {
    type Err = DomainError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "any" | "all" => Ok(KindFilter::Any),
            _ => input.parse::<TransactionKind>().map(KindFilter::from),
        }
    }
}

/// Kind and inclusive calendar-day range used to narrow a transaction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub kind: KindFilter,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: KindFilter) -> Self {
        self.kind = kind;
        self
    }

    pub fn since(mut self, from: NaiveDate) -> Self {
        self.from = Some(from);
        self
    }

    pub fn until(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }

    /// True when any restriction is set.
    pub fn is_active(&self) -> bool {
        self.kind != KindFilter::Any || self.from.is_some() || self.to.is_some()
    }

    /// Compares on the UTC calendar day; time of day is ignored.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        let day = transaction.occurred_on();
        self.kind.matches(transaction.kind)
            && self.from.map_or(true, |from| day >= from)
            && self.to.map_or(true, |to| day <= to)
    }
}

/// Transactions passing `criteria`, most recent first.
///
/// The sort is stable, so entries recorded at the same instant keep their
/// insertion order. Applying the same criteria twice yields the same list.
pub fn filter_transactions<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    criteria: &FilterCriteria,
) -> Vec<&'a Transaction> {
    let mut matched: Vec<&Transaction> = transactions
        .into_iter()
        .filter(|txn| criteria.matches(txn))
        .collect();
    matched.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    matched
}

/// Debt and payment totals for one calendar day of activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyTotals {
    pub day: NaiveDate,
    pub total_debt: f64,
    pub total_payment: f64,
}

impl DailyTotals {
    fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            total_debt: 0.0,
            total_payment: 0.0,
        }
    }

    fn record(&mut self, transaction: &Transaction) {
        match transaction.kind {
            TransactionKind::Debt => self.total_debt += transaction.amount.value(),
            TransactionKind::Payment => self.total_payment += transaction.amount.value(),
        }
    }

    /// Short day/month label such as `5 Jan`.
    pub fn label(&self) -> String {
        self.day.format("%-d %b").to_string()
    }
}

/// Per-day chart buckets for the most recent [`CHART_DAY_LIMIT`] days with activity,
/// ordered oldest to newest. Days without transactions are never emitted.
pub fn aggregate_by_day<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Vec<DailyTotals> {
    let mut buckets: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
    for txn in transactions {
        let day = txn.occurred_on();
        buckets
            .entry(day)
            .or_insert_with(|| DailyTotals::empty(day))
            .record(txn);
    }
    let skip = buckets.len().saturating_sub(CHART_DAY_LIMIT);
    buckets.into_values().skip(skip).collect()
}

/// One row of the debtor ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRanking {
    pub client_id: Uuid,
    pub client_name: String,
    pub balance: f64,
}

impl ClientRanking {
    /// First word of the client name.
    pub fn chart_label(&self) -> &str {
        self.client_name
            .split_whitespace()
            .next()
            .unwrap_or(&self.client_name)
    }
}

/// Clients that owe money, largest balance first, at most `limit` rows.
///
/// Settled and credit clients are excluded. Equal balances keep the order in
/// which the clients appear in `clients`.
pub fn rank_clients_by_balance(clients: &[Client], limit: usize) -> Vec<ClientRanking> {
    let mut ranked: Vec<ClientRanking> = clients
        .iter()
        .map(|client| ClientRanking {
            client_id: client.id,
            client_name: client.name.clone(),
            balance: client_balance(client),
        })
        .filter(|row| row.balance > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.balance.total_cmp(&a.balance));
    ranked.truncate(limit);
    ranked
}

/// Sum of positive balances; clients in credit do not offset other debts.
pub fn total_outstanding(clients: &[Client]) -> f64 {
    clients
        .iter()
        .map(client_balance)
        .filter(|balance| *balance > 0.0)
        .fold(0.0, |total, balance| round_to_minor_units(total + balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use duebook_domain::{start_of_day, Amount};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, hour, 0, 0).unwrap()
    }

    fn debt(amount: f64, when: DateTime<Utc>) -> Transaction {
        Transaction::debt(Amount::new(amount).unwrap(), when)
    }

    fn payment(amount: f64, when: DateTime<Utc>) -> Transaction {
        Transaction::payment(Amount::new(amount).unwrap(), when)
    }

    fn client_with_balance(name: &str, balance: f64) -> Client {
        let mut client = Client::new(name, "0100", at(2024, 1, 1, 8));
        if balance >= 0.0 {
            client.add_transaction(debt(balance, at(2024, 1, 2, 8)));
        } else {
            client.add_transaction(payment(-balance, at(2024, 1, 2, 8)));
        }
        client
    }

    fn mixed_history() -> Vec<Transaction> {
        vec![
            debt(120.0, at(2024, 1, 3, 9)),
            payment(40.0, at(2024, 1, 3, 18)),
            debt(75.5, at(2024, 1, 6, 11)),
            payment(20.25, at(2024, 1, 9, 7)),
            debt(300.0, at(2024, 2, 1, 12)),
            payment(100.0, at(2024, 2, 4, 16)),
        ]
    }

    #[test]
    fn balance_of_debts_minus_payments() {
        let history = vec![
            debt(500.0, at(2024, 1, 1, 9)),
            payment(200.0, at(2024, 1, 2, 9)),
            debt(100.0, at(2024, 1, 3, 9)),
        ];
        assert_eq!(compute_balance(&history), 400.0);
    }

    #[test]
    fn empty_collections_yield_identities() {
        let none: Vec<Transaction> = Vec::new();
        assert_eq!(compute_balance(&none), 0.0);
        assert!(aggregate_by_day(&none).is_empty());
        assert!(collect_overdue(&none, at(2024, 1, 1, 0)).is_empty());
        assert!(filter_transactions(&none, &FilterCriteria::any()).is_empty());
        assert!(rank_clients_by_balance(&[], 5).is_empty());
        assert_eq!(total_outstanding(&[]), 0.0);
    }

    #[test]
    fn balance_fold_is_split_consistent() {
        let history = mixed_history();
        let whole = compute_balance(&history);
        for k in 0..=history.len() {
            let (head, tail) = history.split_at(k);
            assert_eq!(fold_balance(compute_balance(head), tail), whole, "split at {k}");
        }
    }

    #[test]
    fn overdue_requires_past_due_debt() {
        let due = start_of_day(day(2024, 1, 1));
        let overdue_debt = debt(300.0, at(2023, 11, 1, 9)).with_due_date(due);
        assert!(is_overdue(&overdue_debt, at(2024, 6, 1, 0)));
        assert!(!is_overdue(&overdue_debt, at(2023, 12, 1, 0)));
        assert!(!is_overdue(&overdue_debt, due), "due instant itself is not overdue");

        let payment_with_due = payment(300.0, at(2023, 11, 1, 9)).with_due_date(due);
        assert!(!is_overdue(&payment_with_due, at(2024, 6, 1, 0)));

        let undated = debt(300.0, at(2023, 11, 1, 9));
        assert!(!is_overdue(&undated, at(2030, 1, 1, 0)));
    }

    #[test]
    fn overdue_status_never_reverts_as_time_advances() {
        let txn = debt(10.0, at(2024, 1, 1, 0)).with_due_date(at(2024, 2, 1, 0));
        let first = at(2024, 2, 1, 1);
        assert!(is_overdue(&txn, first));
        for hours in [1, 24, 24 * 365, 24 * 365 * 10] {
            assert!(is_overdue(&txn, first + Duration::hours(hours)));
        }
    }

    #[test]
    fn collect_overdue_preserves_original_order() {
        let now = at(2024, 5, 1, 0);
        let history = vec![
            debt(10.0, at(2024, 3, 1, 0)).with_due_date(at(2024, 4, 20, 0)),
            debt(20.0, at(2024, 1, 1, 0)).with_due_date(at(2024, 6, 1, 0)),
            payment(5.0, at(2024, 2, 1, 0)),
            debt(30.0, at(2024, 1, 1, 0)).with_due_date(at(2024, 2, 1, 0)),
        ];
        let overdue: Vec<f64> = collect_overdue(&history, now)
            .iter()
            .map(|txn| txn.amount.value())
            .collect();
        assert_eq!(overdue, vec![10.0, 30.0]);
    }

    #[test]
    fn highly_overdue_is_inclusive_of_threshold() {
        assert!(is_highly_overdue(5000.0, 5000.0));
        assert!(!is_highly_overdue(4999.0, 5000.0));
        assert!(is_highly_overdue(120.0, 100.0));
    }

    #[test]
    fn filter_by_january_returns_newest_first() {
        let history = vec![
            debt(1.0, at(2024, 1, 5, 10)),
            payment(2.0, at(2024, 1, 10, 10)),
            debt(3.0, at(2024, 2, 1, 10)),
        ];
        let criteria = FilterCriteria::any()
            .since(day(2024, 1, 1))
            .until(day(2024, 1, 31));
        let filtered = filter_transactions(&history, &criteria);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].kind, TransactionKind::Payment);
        assert_eq!(filtered[1].kind, TransactionKind::Debt);
        assert_eq!(filtered[1].amount.value(), 1.0);
    }

    #[test]
    fn filter_bounds_are_inclusive_calendar_days() {
        let history = vec![
            debt(1.0, at(2024, 1, 31, 23)),
            debt(2.0, at(2024, 1, 1, 0)),
            debt(3.0, at(2023, 12, 31, 23)),
        ];
        let criteria = FilterCriteria::any()
            .since(day(2024, 1, 1))
            .until(day(2024, 1, 31));
        let amounts: Vec<f64> = filter_transactions(&history, &criteria)
            .iter()
            .map(|txn| txn.amount.value())
            .collect();
        assert_eq!(amounts, vec![1.0, 2.0]);
    }

    #[test]
    fn filter_by_kind_and_idempotence() {
        let history = mixed_history();
        let criteria = FilterCriteria::any().with_kind(KindFilter::Debt);
        let once = filter_transactions(&history, &criteria);
        assert!(once.iter().all(|txn| txn.is_debt()));
        assert_eq!(once.len(), 3);

        let twice = filter_transactions(once.iter().copied(), &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn filter_keeps_insertion_order_for_simultaneous_entries() {
        let when = at(2024, 1, 5, 10);
        let history = vec![debt(1.0, when), payment(2.0, when), debt(3.0, when)];
        let amounts: Vec<f64> = filter_transactions(&history, &FilterCriteria::any())
            .iter()
            .map(|txn| txn.amount.value())
            .collect();
        assert_eq!(amounts, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn kind_filter_parses_any_alias() {
        assert_eq!("all".parse::<KindFilter>().unwrap(), KindFilter::Any);
        assert_eq!("Debt".parse::<KindFilter>().unwrap(), KindFilter::Debt);
        assert!(matches!(
            "loan".parse::<KindFilter>(),
            Err(DomainError::UnsupportedTransactionKind(_))
        ));
    }

    #[test]
    fn aggregate_merges_same_day_entries() {
        let history = mixed_history();
        let buckets = aggregate_by_day(&history);
        assert_eq!(buckets.len(), 5);
        let first = buckets[0];
        assert_eq!(first.day, day(2024, 1, 3));
        assert_eq!(first.total_debt, 120.0);
        assert_eq!(first.total_payment, 40.0);
        assert_eq!(first.label(), "3 Jan");
    }

    #[test]
    fn aggregate_keeps_latest_seven_days_oldest_first() {
        let history: Vec<Transaction> = (1..=10)
            .rev()
            .map(|d| debt(f64::from(d), at(2024, 3, d, 12)))
            .collect();
        let filtered = filter_transactions(&history, &FilterCriteria::any());
        let buckets = aggregate_by_day(filtered);
        let days: Vec<NaiveDate> = buckets.iter().map(|bucket| bucket.day).collect();
        let expected: Vec<NaiveDate> = (4..=10).map(|d| day(2024, 3, d)).collect();
        assert_eq!(days, expected);
        assert_eq!(buckets[6].total_debt, 10.0);
        assert_eq!(buckets[6].total_payment, 0.0);
    }

    #[test]
    fn ranking_returns_top_balances_in_order() {
        let clients: Vec<Client> = [100.0, 900.0, 300.0, 50.0, 700.0]
            .iter()
            .enumerate()
            .map(|(idx, balance)| client_with_balance(&format!("Client {idx}"), *balance))
            .collect();
        let balances: Vec<f64> = rank_clients_by_balance(&clients, 3)
            .iter()
            .map(|row| row.balance)
            .collect();
        assert_eq!(balances, vec![900.0, 700.0, 300.0]);
    }

    #[test]
    fn ranking_excludes_settled_and_credit_clients() {
        let clients = vec![
            client_with_balance("Settled", 0.0),
            client_with_balance("Credit", -250.0),
            client_with_balance("Owes", 10.0),
        ];
        let ranked = rank_clients_by_balance(&clients, 10);
        assert_eq!(ranked.len(), 1);
        assert!(ranked.iter().all(|row| row.balance > 0.0));
        assert_eq!(ranked[0].client_name, "Owes");
    }

    #[test]
    fn chart_label_is_the_first_word() {
        let row = |name: &str| ClientRanking {
            client_id: Uuid::nil(),
            client_name: name.to_string(),
            balance: 1.0,
        };
        assert_eq!(row("  Ahmed Samir Ali").chart_label(), "Ahmed");
        assert_eq!(row("").chart_label(), "");
    }

    #[test]
    fn ranking_ties_keep_list_order() {
        let clients = vec![
            client_with_balance("Hana First", 400.0),
            client_with_balance("Karim Second", 400.0),
            client_with_balance("Laila Third", 800.0),
        ];
        let ranked = rank_clients_by_balance(&clients, 5);
        let labels: Vec<&str> = ranked.iter().map(|row| row.chart_label()).collect();
        assert_eq!(labels, vec!["Laila", "Hana", "Karim"]);
    }

    #[test]
    fn settled_fractional_history_balances_to_zero() {
        let mut settled = Client::new("Settled Sami", "0100", at(2024, 1, 1, 8));
        settled.add_transaction(debt(0.1, at(2024, 1, 2, 8)));
        settled.add_transaction(debt(0.2, at(2024, 1, 2, 9)));
        settled.add_transaction(payment(0.3, at(2024, 1, 3, 8)));
        let clients = vec![settled];

        assert_eq!(client_balance(&clients[0]), 0.0);
        assert!(rank_clients_by_balance(&clients, 5).is_empty());
        assert_eq!(total_outstanding(&clients), 0.0);
    }

    #[test]
    fn minor_unit_rounding_keeps_cents() {
        assert_eq!(round_to_minor_units(10.005_000_1), 10.01);
        assert_eq!(round_to_minor_units(-0.004), 0.0);
        assert!(round_to_minor_units(-0.004).is_sign_positive());
        assert_eq!(round_to_minor_units(1234.5), 1234.5);
    }

    #[test]
    fn total_outstanding_ignores_credit() {
        let clients = vec![
            client_with_balance("A", 1000.0),
            client_with_balance("B", -400.0),
            client_with_balance("C", 250.0),
        ];
        assert_eq!(total_outstanding(&clients), 1250.0);
    }
}
