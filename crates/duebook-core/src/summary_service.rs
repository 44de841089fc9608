//! Read models backing the dashboard and the client detail view.

use chrono::{DateTime, Utc};

use duebook_domain::{Client, Transaction};

use crate::{
    aggregate_by_day, client_balance, collect_overdue, compute_balance, filter_transactions,
    is_highly_overdue, rank_clients_by_balance, total_outstanding, ClientRanking, DailyTotals,
    FilterCriteria,
};

/// Book-wide figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_outstanding: f64,
    pub client_count: usize,
    pub top_debtors: Vec<ClientRanking>,
}

/// Everything the detail view derives from one client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOverview<'a> {
    pub client: &'a Client,
    pub balance: f64,
    pub highly_overdue: bool,
    pub overdue: Vec<&'a Transaction>,
    pub transactions: Vec<&'a Transaction>,
    /// Balance folded over `transactions` only.
    pub filtered_balance: f64,
    pub chart: Vec<DailyTotals>,
    pub filter_active: bool,
}

impl ClientOverview<'_> {
    pub fn overdue_total(&self) -> f64 {
        compute_balance(self.overdue.iter().copied())
    }
}

pub struct SummaryService;

impl SummaryService {
    pub fn dashboard(clients: &[Client], ranking_limit: usize) -> DashboardSummary {
        DashboardSummary {
            total_outstanding: total_outstanding(clients),
            client_count: clients.len(),
            top_debtors: rank_clients_by_balance(clients, ranking_limit),
        }
    }

    pub fn client_overview<'a>(
        client: &'a Client,
        criteria: &FilterCriteria,
        alert_threshold: f64,
        now: DateTime<Utc>,
    ) -> ClientOverview<'a> {
        let balance = client_balance(client);
        let transactions = filter_transactions(&client.transactions, criteria);
        let filtered_balance = compute_balance(transactions.iter().copied());
        let chart = aggregate_by_day(transactions.iter().copied());
        ClientOverview {
            client,
            balance,
            highly_overdue: is_highly_overdue(balance, alert_threshold),
            overdue: collect_overdue(&client.transactions, now),
            transactions,
            filtered_balance,
            chart,
            filter_active: criteria.is_active(),
        }
    }
}
