use duebook_core::{ClientService, NewTransaction};
use duebook_domain::{start_of_day, ImageRef, TransactionKind};

use crate::cli::core::{
    parse_amount, parse_date, short_id, CommandError, CommandResult, ParsedArgs, ShellContext,
};
use crate::cli::output;
use crate::cli::registry::{CommandEntry, CommandGroup};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            CommandGroup::Ledger,
            "debt",
            "Record money the client owes",
            "debt <client> <amount> [description...] [--due YYYY-MM-DD] [--image <path-or-url>]",
            cmd_debt,
        ),
        CommandEntry::new(
            CommandGroup::Ledger,
            "payment",
            "Record money the client paid back",
            "payment <client> <amount> [description...] [--image <path-or-url>]",
            cmd_payment,
        ),
        CommandEntry::new(
            CommandGroup::Ledger,
            "delete-tx",
            "Delete one transaction from a client's history",
            "delete-tx <client> <transaction>",
            cmd_delete_transaction,
        ),
    ]
}

fn cmd_debt(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    record(context, TransactionKind::Debt, args)
}

fn cmd_payment(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    record(context, TransactionKind::Payment, args)
}

fn record(context: &mut ShellContext, kind: TransactionKind, args: &[&str]) -> CommandResult {
    let allowed: &[&str] = match kind {
        TransactionKind::Debt => &["due", "image"],
        TransactionKind::Payment => &["image"],
    };
    let parsed = ParsedArgs::parse(args, allowed)?;
    let reference = parsed.require(0, "client")?;
    let amount = parse_amount(parsed.require(1, "amount")?)?;

    let mut input = NewTransaction::new(kind, amount);
    if let Some(description) = parsed.rest(2) {
        input = input.with_description(description);
    }
    if let Some(due) = parsed.flag("due") {
        input = input.with_due_date(start_of_day(parse_date(due)?));
    }
    if let Some(image) = parsed.flag("image") {
        input = input.with_attachment(ImageRef::new(image));
    }

    let client_id = context.resolve_client(reference)?.id;
    let tx_id = context.book.add_transaction(client_id, input)?;
    let client = context.book.client(client_id)?;
    output::success(format!(
        "Recorded {} of {} for {} ({}).",
        kind.to_string().to_lowercase(),
        context.amount(amount.value()),
        client.name,
        short_id(tx_id)
    ));
    output::info(format!(
        "  New balance: {}",
        context.amount(duebook_core::client_balance(client))
    ));
    Ok(())
}

fn cmd_delete_transaction(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [client_ref, tx_ref] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: delete-tx <client> <transaction>".into(),
        ));
    };
    let client = context.resolve_client(client_ref)?;
    let txn = ClientService::resolve_transaction(client, tx_ref)?;
    let (client_id, tx_id) = (client.id, txn.id);
    let prompt = format!(
        "Delete {} of {} ({}) from {}?",
        txn.kind.to_string().to_lowercase(),
        context.amount(txn.amount.value()),
        txn.label(),
        client.name
    );
    if !context.confirm(&prompt, false)? {
        output::info("Deletion cancelled.");
        return Ok(());
    }
    context.book.remove_transaction(client_id, tx_id)?;
    output::success(format!("Deleted transaction {}.", short_id(tx_id)));
    Ok(())
}
