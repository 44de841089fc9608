//! Searchable, grouped and sorted client listings.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, Utc};

use duebook_domain::Client;

use crate::{client_balance, is_highly_overdue, CoreError};

/// Partition of the directory by balance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientGroup {
    #[default]
    All,
    /// Balance strictly positive.
    Debtors,
    /// Balance zero or in credit.
    Settled,
    /// Balance at or above the directory threshold.
    Overdue,
}

/// Ordering applied to directory rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientSort {
    #[default]
    Newest,
    Name,
    Balance,
    LastActivity,
}

impl FromStr for ClientGroup {
    type Err = CoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ClientGroup::All),
            "debtors" | "debt" => Ok(ClientGroup::Debtors),
            "settled" => Ok(ClientGroup::Settled),
            "overdue" => Ok(ClientGroup::Overdue),
            other => Err(CoreError::Validation(format!("unknown client group `{other}`"))),
        }
    }
}

impl FromStr for ClientSort {
    type Err = CoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "newest" | "created" => Ok(ClientSort::Newest),
            "name" => Ok(ClientSort::Name),
            "balance" => Ok(ClientSort::Balance),
            "activity" | "last-activity" => Ok(ClientSort::LastActivity),
            other => Err(CoreError::Validation(format!("unknown sort order `{other}`"))),
        }
    }
}

impl fmt::Display for ClientGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClientGroup::All => "all",
            ClientGroup::Debtors => "debtors",
            ClientGroup::Settled => "settled",
            ClientGroup::Overdue => "overdue",
        })
    }
}

impl fmt::Display for ClientSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClientSort::Newest => "newest",
            ClientSort::Name => "name",
            ClientSort::Balance => "balance",
            ClientSort::LastActivity => "activity",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryQuery {
    pub search: Option<String>,
    pub group: ClientGroup,
    pub sort: ClientSort,
    pub threshold: f64,
}

impl DirectoryQuery {
    pub fn new(threshold: f64) -> Self {
        Self {
            search: None,
            group: ClientGroup::default(),
            sort: ClientSort::default(),
            threshold,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = (!search.trim().is_empty()).then_some(search);
        self
    }

    pub fn with_group(mut self, group: ClientGroup) -> Self {
        self.group = group;
        self
    }

    pub fn with_sort(mut self, sort: ClientSort) -> Self {
        self.sort = sort;
        self
    }

    fn matches_search(&self, client: &Client) -> bool {
        let Some(search) = self.search.as_deref() else {
            return true;
        };
        let needle = search.trim().to_lowercase();
        client.name.to_lowercase().contains(&needle) || client.phone.contains(search.trim())
    }

    fn matches_group(&self, balance: f64) -> bool {
        match self.group {
            ClientGroup::All => true,
            ClientGroup::Debtors => balance > 0.0,
            ClientGroup::Settled => balance <= 0.0,
            ClientGroup::Overdue => is_highly_overdue(balance, self.threshold),
        }
    }
}

/// One directory row.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry<'a> {
    pub client: &'a Client,
    pub balance: f64,
    pub highly_overdue: bool,
    pub last_activity: DateTime<Utc>,
}

pub struct DirectoryService;

impl DirectoryService {
    pub fn query<'a>(clients: &'a [Client], query: &DirectoryQuery) -> Vec<DirectoryEntry<'a>> {
        let mut rows: Vec<DirectoryEntry<'a>> = clients
            .iter()
            .filter(|client| query.matches_search(client))
            .map(|client| {
                let balance = client_balance(client);
                DirectoryEntry {
                    client,
                    balance,
                    highly_overdue: is_highly_overdue(balance, query.threshold),
                    last_activity: client.last_activity(),
                }
            })
            .filter(|row| query.matches_group(row.balance))
            .collect();
        rows.sort_by(|a, b| compare(query.sort, a, b));
        rows
    }
}

fn compare(sort: ClientSort, a: &DirectoryEntry<'_>, b: &DirectoryEntry<'_>) -> Ordering {
    match sort {
        ClientSort::Newest => b.client.created_at.cmp(&a.client.created_at),
        ClientSort::Name => a
            .client
            .name
            .to_lowercase()
            .cmp(&b.client.name.to_lowercase()),
        ClientSort::Balance => b.balance.total_cmp(&a.balance),
        ClientSort::LastActivity => b.last_activity.cmp(&a.last_activity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use duebook_domain::{Amount, Transaction};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    fn client(name: &str, phone: &str, created: u32, balance: f64) -> Client {
        let mut client = Client::new(name, phone, at(created));
        if balance > 0.0 {
            client.add_transaction(Transaction::debt(Amount::new(balance).unwrap(), at(created)));
        } else if balance < 0.0 {
            client.add_transaction(Transaction::payment(
                Amount::new(-balance).unwrap(),
                at(created),
            ));
        }
        client
    }

    fn sample() -> Vec<Client> {
        vec![
            client("Amr Said", "0100 111", 1, 7000.0),
            client("basma Ali", "0122 222", 3, 0.0),
            client("Camilia", "0155 333", 2, 150.0),
            client("Dina", "0111 444", 4, -20.0),
        ]
    }

    fn names(rows: &[DirectoryEntry<'_>]) -> Vec<String> {
        rows.iter().map(|row| row.client.name.clone()).collect()
    }

    #[test]
    fn default_query_lists_newest_first() {
        let clients = sample();
        let rows = DirectoryService::query(&clients, &DirectoryQuery::new(5000.0));
        assert_eq!(names(&rows), ["Dina", "basma Ali", "Camilia", "Amr Said"]);
        assert!(rows[3].highly_overdue);
    }

    #[test]
    fn search_matches_name_case_insensitively_or_phone() {
        let clients = sample();
        let by_name = DirectoryService::query(&clients, &DirectoryQuery::new(5000.0).with_search("BASMA"));
        assert_eq!(names(&by_name), ["basma Ali"]);
        let by_phone = DirectoryService::query(&clients, &DirectoryQuery::new(5000.0).with_search("0155"));
        assert_eq!(names(&by_phone), ["Camilia"]);
    }

    #[test]
    fn groups_partition_by_balance() {
        let clients = sample();
        let query = |group| DirectoryQuery::new(5000.0).with_group(group).with_sort(ClientSort::Name);
        assert_eq!(
            names(&DirectoryService::query(&clients, &query(ClientGroup::Debtors))),
            ["Amr Said", "Camilia"]
        );
        assert_eq!(
            names(&DirectoryService::query(&clients, &query(ClientGroup::Settled))),
            ["basma Ali", "Dina"]
        );
        assert_eq!(
            names(&DirectoryService::query(&clients, &query(ClientGroup::Overdue))),
            ["Amr Said"]
        );
    }

    #[test]
    fn fractional_settlement_counts_as_settled() {
        let mut settled = Client::new("Fady", "0100 999", at(5));
        settled.add_transaction(Transaction::debt(Amount::new(0.1).unwrap(), at(5)));
        settled.add_transaction(Transaction::debt(Amount::new(0.2).unwrap(), at(6)));
        settled.add_transaction(Transaction::payment(Amount::new(0.3).unwrap(), at(7)));
        let clients = vec![settled];
        let debtors = DirectoryQuery::new(5000.0).with_group(ClientGroup::Debtors);
        assert!(DirectoryService::query(&clients, &debtors).is_empty());
        let settled_group = DirectoryQuery::new(5000.0).with_group(ClientGroup::Settled);
        assert_eq!(names(&DirectoryService::query(&clients, &settled_group)), ["Fady"]);
    }

    #[test]
    fn lowering_threshold_widens_overdue_group() {
        let clients = sample();
        let query = DirectoryQuery::new(100.0).with_group(ClientGroup::Overdue);
        assert_eq!(DirectoryService::query(&clients, &query).len(), 2);
    }

    #[test]
    fn sorts_by_balance_and_activity() {
        let mut clients = sample();
        clients[1].add_transaction(Transaction::debt(Amount::new(1.0).unwrap(), at(20)));
        let by_balance = DirectoryService::query(
            &clients,
            &DirectoryQuery::new(5000.0).with_sort(ClientSort::Balance),
        );
        assert_eq!(names(&by_balance), ["Amr Said", "Camilia", "basma Ali", "Dina"]);

        let by_activity = DirectoryService::query(
            &clients,
            &DirectoryQuery::new(5000.0).with_sort(ClientSort::LastActivity),
        );
        assert_eq!(by_activity[0].client.name, "basma Ali");
    }

    #[test]
    fn parses_group_and_sort_names() {
        assert_eq!("Overdue".parse::<ClientGroup>().unwrap(), ClientGroup::Overdue);
        assert_eq!("activity".parse::<ClientSort>().unwrap(), ClientSort::LastActivity);
        assert!("richest".parse::<ClientSort>().is_err());
    }
}
