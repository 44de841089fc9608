use duebook_core::{
    format::{format_number, format_timestamp},
    is_overdue, ClientGroup, ClientSort, DirectoryQuery, DirectoryService, NewClient,
    StatementService, SummaryService,
};
use duebook_domain::{Displayable, ImageRef};

use crate::cli::core::{
    short_id, CommandError, CommandResult, ParsedArgs, ShellContext, FILTER_FLAGS,
};
use crate::cli::output::{self, section as output_section};
use crate::cli::prompts;
use crate::cli::registry::{CommandEntry, CommandGroup};

const CHART_WIDTH: usize = 24;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            CommandGroup::Clients,
            "clients",
            "List clients with their balances",
            "clients [--search <text>] [--group all|debtors|settled|overdue] [--sort newest|name|balance|activity]",
            cmd_clients,
        )
        .with_aliases(&["ls"]),
        CommandEntry::new(
            CommandGroup::Clients,
            "add-client",
            "Register a new client",
            "add-client <name> <phone> [--avatar <path-or-url>]",
            cmd_add_client,
        ),
        CommandEntry::new(
            CommandGroup::Clients,
            "show",
            "Show a client's balance, overdue debts, history and activity chart",
            "show <client> [--kind any|debt|payment] [--from YYYY-MM-DD] [--to YYYY-MM-DD]",
            cmd_show,
        ),
        CommandEntry::new(
            CommandGroup::Clients,
            "delete-client",
            "Delete a client and their whole history",
            "delete-client <client>",
            cmd_delete_client,
        ),
        CommandEntry::new(
            CommandGroup::Clients,
            "contact",
            "Print a shareable contact card",
            "contact <client>",
            cmd_contact,
        ),
    ]
}

fn cmd_clients(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["search", "group", "sort"])?;
    if !parsed.positional.is_empty() {
        return Err(CommandError::InvalidArguments(
            "usage: clients [--search <text>] [--group <group>] [--sort <order>]".into(),
        ));
    }

    let mut query = DirectoryQuery::new(context.config.directory_threshold);
    if let Some(search) = parsed.flag("search") {
        query = query.with_search(search);
    }
    if let Some(group) = parsed.flag("group") {
        query = query.with_group(group.parse::<ClientGroup>()?);
    }
    if let Some(sort) = parsed.flag("sort") {
        query = query.with_sort(sort.parse::<ClientSort>()?);
    }

    let entries = DirectoryService::query(context.book.clients(), &query);
    output_section(format!("Clients ({}, sorted by {})", query.group, query.sort));
    if entries.is_empty() {
        output::info("No clients match.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                short_id(entry.client.id),
                entry.client.name.clone(),
                entry.client.phone.clone(),
                context.amount(entry.balance),
                format_timestamp(entry.last_activity),
                if entry.highly_overdue { "!" } else { "" }.to_string(),
            ]
        })
        .collect();
    output::info(output::render_table(
        &["ID", "NAME", "PHONE", "BALANCE", "LAST ACTIVITY", ""],
        &rows,
    ));
    Ok(())
}

fn cmd_add_client(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["avatar"])?;
    let (name, phone) = match parsed.positional.as_slice() {
        [name, phone] => (name.to_string(), phone.to_string()),
        [] if context.can_prompt() => (
            prompts::required_text(&context.theme, "Client name")?,
            prompts::required_text(&context.theme, "Phone number")?,
        ),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: add-client <name> <phone> [--avatar <path-or-url>]".into(),
            ))
        }
    };

    let mut input = NewClient::new(name, phone);
    if let Some(avatar) = parsed.flag("avatar") {
        input = input.with_avatar(ImageRef::new(avatar));
    }
    let id = context.book.add_client(input)?;
    let client = context.book.client(id)?;
    output::success(format!("Added client {} ({}).", client.name, short_id(id)));
    Ok(())
}

fn cmd_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &FILTER_FLAGS)?;
    let reference = parsed.require(0, "client")?;
    let criteria = parsed.criteria()?;
    let client = context.resolve_client(reference)?;
    let now = context.book.now();
    let overview =
        SummaryService::client_overview(client, &criteria, context.config.alert_threshold, now);

    output_section(format!("{} ({})", client.name, short_id(client.id)));
    output::info(format!("  Phone   : {}", client.phone));
    output::info(format!("  Since   : {}", format_timestamp(client.created_at)));
    output::info(format!("  Balance : {}", context.amount(overview.balance)));
    if overview.highly_overdue {
        output::warning(format!(
            "Balance is at or above the alert threshold of {}.",
            context.amount(context.config.alert_threshold)
        ));
    }

    if !overview.overdue.is_empty() {
        output_section("Overdue");
        for txn in &overview.overdue {
            let due = txn.due_date.map(format_timestamp).unwrap_or_default();
            output::warning(format!(
                "{} due {} ({})",
                context.amount(txn.amount.value()),
                due,
                txn.label()
            ));
        }
        output::info(format!(
            "  Overdue total: {}",
            context.amount(overview.overdue_total())
        ));
    }

    output_section("Transactions");
    if overview.transactions.is_empty() {
        output::info("No transactions match.");
    } else {
        let rows: Vec<Vec<String>> = overview
            .transactions
            .iter()
            .map(|txn| {
                vec![
                    short_id(txn.id),
                    format_timestamp(txn.occurred_at),
                    txn.kind.to_string(),
                    context.amount(txn.amount.value()),
                    txn.label(),
                    txn.due_date.map(format_timestamp).unwrap_or_else(|| "-".into()),
                    if is_overdue(txn, now) { "OVERDUE" } else { "" }.to_string(),
                ]
            })
            .collect();
        output::info(output::render_table(
            &["ID", "DATE", "KIND", "AMOUNT", "DESCRIPTION", "DUE", ""],
            &rows,
        ));
    }
    if overview.filter_active {
        output::info(format!(
            "  Filtered balance: {}",
            context.amount(overview.filtered_balance)
        ));
    }

    if !overview.chart.is_empty() {
        output_section("Activity");
        let max = overview
            .chart
            .iter()
            .map(|day| day.total_debt.max(day.total_payment))
            .fold(0.0, f64::max);
        for day in &overview.chart {
            output::info(format!(
                "  {:<7} debt    {:<width$} {}",
                day.label(),
                output::bar(day.total_debt, max, CHART_WIDTH),
                format_number(day.total_debt),
                width = CHART_WIDTH
            ));
            output::info(format!(
                "  {:<7} payment {:<width$} {}",
                "",
                output::bar(day.total_payment, max, CHART_WIDTH),
                format_number(day.total_payment),
                width = CHART_WIDTH
            ));
        }
    }
    Ok(())
}

fn cmd_delete_client(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: delete-client <client>".into(),
        ));
    };
    let client = context.resolve_client(reference)?;
    let (id, prompt) = (
        client.id,
        format!(
            "Delete {} and {} transaction(s)?",
            client.display_label(),
            client.transactions.len()
        ),
    );
    if !context.confirm(&prompt, false)? {
        output::info("Deletion cancelled.");
        return Ok(());
    }
    let removed = context.book.remove_client(id)?;
    output::success(format!("Deleted client {}.", removed.name));
    Ok(())
}

fn cmd_contact(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(CommandError::InvalidArguments("usage: contact <client>".into()));
    };
    let client = context.resolve_client(reference)?;
    output::info(StatementService::contact_card(client));
    Ok(())
}
