//! Validated mutations over the client book.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use duebook_domain::{Amount, Client, DomainError, ImageRef, Transaction, TransactionKind};

use crate::{CoreError, CoreResult};

/// Shortest id prefix accepted by the lookup helpers.
pub const MIN_ID_PREFIX: usize = 4;

/// Input for [`ClientService::add_client`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewClient {
    pub name: String,
    pub phone: String,
    pub avatar: Option<ImageRef>,
}

impl NewClient {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: ImageRef) -> Self {
        self.avatar = Some(avatar);
        self
    }
}

/// Input for [`ClientService::add_transaction`]. Identity and timestamp are
/// assigned when the entry is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Amount,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub attachment: Option<ImageRef>,
}

impl NewTransaction {
    pub fn new(kind: TransactionKind, amount: Amount) -> Self {
        Self {
            kind,
            amount,
            description: None,
            due_date: None,
            attachment: None,
        }
    }

    pub fn debt(amount: Amount) -> Self {
        Self::new(TransactionKind::Debt, amount)
    }

    pub fn payment(amount: Amount) -> Self {
        Self::new(TransactionKind::Payment, amount)
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

    fn into_transaction(self, occurred_at: DateTime<Utc>) -> Transaction {
        let mut txn = Transaction::new(self.kind, self.amount, occurred_at);
        txn.description = self
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        // Due dates only carry meaning for debts.
        if self.kind == TransactionKind::Debt {
            txn.due_date = self.due_date;
        }
        txn.attachment = self.attachment;
        txn
    }
}

/// Provides validated CRUD helpers for clients and their transactions.
pub struct ClientService;

impl ClientService {
    /// Appends a new, empty client and returns its identifier.
    pub fn add_client(
        clients: &mut Vec<Client>,
        input: NewClient,
        now: DateTime<Utc>,
    ) -> CoreResult<Uuid> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidClient("client name is required".into()).into());
        }
        let phone = input.phone.trim();
        if phone.is_empty() {
            return Err(DomainError::InvalidClient("client phone is required".into()).into());
        }
        let mut client = Client::new(name, phone, now);
        client.avatar = input.avatar;
        let id = client.id;
        clients.push(client);
        info!(client = %id, "client added");
        Ok(id)
    }

    /// Removes the client together with its whole history.
    pub fn remove_client(clients: &mut Vec<Client>, id: Uuid) -> CoreResult<Client> {
        let index = clients
            .iter()
            .position(|client| client.id == id)
            .ok_or_else(|| CoreError::ClientNotFound(id.to_string()))?;
        let removed = clients.remove(index);
        info!(
            client = %id,
            transactions = removed.transactions.len(),
            "client removed"
        );
        Ok(removed)
    }

    /// Records a transaction at `now` for the given client.
    pub fn add_transaction(
        clients: &mut [Client],
        client_id: Uuid,
        input: NewTransaction,
        now: DateTime<Utc>,
    ) -> CoreResult<Uuid> {
        let client = Self::find_mut(clients, client_id)?;
        if input.kind == TransactionKind::Payment && input.due_date.is_some() {
            debug!(client = %client_id, "dropping due date supplied for a payment");
        }
        let id = client.add_transaction(input.into_transaction(now));
        info!(client = %client_id, transaction = %id, "transaction recorded");
        Ok(id)
    }

    /// Removes one transaction from the client's history.
    pub fn remove_transaction(
        clients: &mut [Client],
        client_id: Uuid,
        transaction_id: Uuid,
    ) -> CoreResult<Transaction> {
        let client = Self::find_mut(clients, client_id)?;
        let removed = client
            .remove_transaction(transaction_id)
            .ok_or_else(|| CoreError::TransactionNotFound(transaction_id.to_string()))?;
        info!(client = %client_id, transaction = %transaction_id, "transaction removed");
        Ok(removed)
    }

    pub fn find(clients: &[Client], id: Uuid) -> CoreResult<&Client> {
        clients
            .iter()
            .find(|client| client.id == id)
            .ok_or_else(|| CoreError::ClientNotFound(id.to_string()))
    }

    fn find_mut(clients: &mut [Client], id: Uuid) -> CoreResult<&mut Client> {
        clients
            .iter_mut()
            .find(|client| client.id == id)
            .ok_or_else(|| CoreError::ClientNotFound(id.to_string()))
    }

    /// Resolves a client from a full id, a unique id prefix or an exact
    /// (case-insensitive) name.
    pub fn resolve_client<'a>(clients: &'a [Client], reference: &str) -> CoreResult<&'a Client> {
        let reference = reference.trim();
        if let Ok(id) = Uuid::parse_str(reference) {
            return Self::find(clients, id);
        }
        let by_name: Vec<&Client> = clients
            .iter()
            .filter(|client| client.name.eq_ignore_ascii_case(reference))
            .collect();
        match by_name.as_slice() {
            [single] => return Ok(*single),
            [] => {}
            _ => return Err(CoreError::AmbiguousReference(reference.to_string())),
        }
        unique_by_prefix(clients.iter(), reference, |client| client.id)
            .map_err(|err| err.unwrap_or_else(|| CoreError::ClientNotFound(reference.to_string())))
    }

    /// Resolves a transaction of `client` from a full id or unique id prefix.
    pub fn resolve_transaction<'a>(
        client: &'a Client,
        reference: &str,
    ) -> CoreResult<&'a Transaction> {
        let reference = reference.trim();
        if let Ok(id) = Uuid::parse_str(reference) {
            return client
                .transaction(id)
                .ok_or_else(|| CoreError::TransactionNotFound(reference.to_string()));
        }
        unique_by_prefix(client.transactions.iter(), reference, |txn| txn.id).map_err(|err| {
            err.unwrap_or_else(|| CoreError::TransactionNotFound(reference.to_string()))
        })
    }
}

/// `Err(None)` means nothing matched; `Err(Some(_))` carries a rejection.
fn unique_by_prefix<'a, T>(
    items: impl Iterator<Item = &'a T>,
    prefix: &str,
    id_of: impl Fn(&T) -> Uuid,
) -> Result<&'a T, Option<CoreError>>
where
    T: 'a,
{
    let prefix = prefix.to_ascii_lowercase();
    if prefix.len() < MIN_ID_PREFIX {
        return Err(None);
    }
    let mut matches = items.filter(|item| id_of(item).to_string().starts_with(&prefix));
    match (matches.next(), matches.next()) {
        (Some(found), None) => Ok(found),
        (Some(_), Some(_)) => Err(Some(CoreError::AmbiguousReference(prefix))),
        (None, _) => Err(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap()
    }

    fn amount(value: f64) -> Amount {
        Amount::new(value).unwrap()
    }

    fn book_with(name: &str) -> (Vec<Client>, Uuid) {
        let mut clients = Vec::new();
        let id = ClientService::add_client(&mut clients, NewClient::new(name, "01001234567"), now())
            .expect("client added");
        (clients, id)
    }

    #[test]
    fn add_client_trims_and_starts_empty() {
        let (clients, id) = book_with("  Mona Adel ");
        let client = ClientService::find(&clients, id).unwrap();
        assert_eq!(client.name, "Mona Adel");
        assert!(client.transactions.is_empty());
        assert_eq!(client.created_at, now());
    }

    #[test]
    fn add_client_requires_name_and_phone() {
        let mut clients = Vec::new();
        let err = ClientService::add_client(&mut clients, NewClient::new("  ", "0100"), now())
            .expect_err("blank name must fail");
        assert!(matches!(err, CoreError::Domain(DomainError::InvalidClient(_))));

        let err = ClientService::add_client(&mut clients, NewClient::new("Ali", ""), now())
            .expect_err("blank phone must fail");
        assert!(matches!(err, CoreError::Domain(DomainError::InvalidClient(ref msg)) if msg.contains("phone")));
        assert!(clients.is_empty());
    }

    #[test]
    fn payment_due_date_is_dropped() {
        let (mut clients, id) = book_with("Omar");
        let due = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let debt_id = ClientService::add_transaction(
            &mut clients,
            id,
            NewTransaction::debt(amount(500.0)).with_due_date(due),
            now(),
        )
        .unwrap();
        let payment_id = ClientService::add_transaction(
            &mut clients,
            id,
            NewTransaction::payment(amount(200.0))
                .with_due_date(due)
                .with_description("  "),
            now(),
        )
        .unwrap();

        let client = ClientService::find(&clients, id).unwrap();
        assert_eq!(client.transaction(debt_id).unwrap().due_date, Some(due));
        let payment = client.transaction(payment_id).unwrap();
        assert_eq!(payment.due_date, None);
        assert_eq!(payment.description, None);
        assert_eq!(payment.occurred_at, now());
    }

    #[test]
    fn remove_transaction_reports_missing_entries() {
        let (mut clients, id) = book_with("Omar");
        let txn_id =
            ClientService::add_transaction(&mut clients, id, NewTransaction::debt(amount(5.0)), now())
                .unwrap();
        let removed = ClientService::remove_transaction(&mut clients, id, txn_id).unwrap();
        assert_eq!(removed.id, txn_id);

        let err = ClientService::remove_transaction(&mut clients, id, txn_id)
            .expect_err("second removal must fail");
        assert!(matches!(err, CoreError::TransactionNotFound(_)));
    }

    #[test]
    fn remove_client_drops_history() {
        let (mut clients, id) = book_with("Omar");
        ClientService::add_transaction(&mut clients, id, NewTransaction::debt(amount(5.0)), now())
            .unwrap();
        let removed = ClientService::remove_client(&mut clients, id).unwrap();
        assert_eq!(removed.transactions.len(), 1);
        assert!(clients.is_empty());
        assert!(matches!(
            ClientService::remove_client(&mut clients, id),
            Err(CoreError::ClientNotFound(_))
        ));
    }

    #[test]
    fn resolve_client_by_prefix_or_name() {
        let (mut clients, id) = book_with("Sara Nabil");
        ClientService::add_client(&mut clients, NewClient::new("Youssef", "0111"), now()).unwrap();

        let full = id.to_string();
        assert_eq!(ClientService::resolve_client(&clients, &full[..8]).unwrap().id, id);
        assert_eq!(ClientService::resolve_client(&clients, "sara nabil").unwrap().id, id);
        assert_eq!(ClientService::resolve_client(&clients, &full).unwrap().id, id);
        assert!(matches!(
            ClientService::resolve_client(&clients, "nobody"),
            Err(CoreError::ClientNotFound(_))
        ));
    }

    #[test]
    fn resolve_client_rejects_duplicate_names() {
        let (mut clients, _) = book_with("Hany");
        ClientService::add_client(&mut clients, NewClient::new("hany", "0122"), now()).unwrap();
        assert!(matches!(
            ClientService::resolve_client(&clients, "Hany"),
            Err(CoreError::AmbiguousReference(_))
        ));
    }

    #[test]
    fn resolve_transaction_by_prefix() {
        let (mut clients, id) = book_with("Omar");
        let txn_id =
            ClientService::add_transaction(&mut clients, id, NewTransaction::debt(amount(5.0)), now())
                .unwrap();
        let client = ClientService::find(&clients, id).unwrap();
        let found = ClientService::resolve_transaction(client, &txn_id.to_string()[..6]).unwrap();
        assert_eq!(found.id, txn_id);
        assert!(ClientService::resolve_transaction(client, "zz").is_err());
    }
}
