use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
};

use duebook_core::{
    collect_overdue, filter_transactions, format::format_timestamp, ClientService,
    StatementService, SummaryService,
};
use duebook_domain::Displayable;

use crate::cli::core::{
    short_id, CommandError, CommandResult, ParsedArgs, ShellContext, FILTER_FLAGS,
};
use crate::cli::output::{self, section as output_section};
use crate::cli::registry::{CommandEntry, CommandGroup};
use crate::export::{
    export_file_name, reminder_link, write_transactions_csv, write_transactions_json,
    ExportFormat,
};

const BAR_WIDTH: usize = 30;
const EXPORTS_DIR: &str = "exports";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            CommandGroup::Reports,
            "dashboard",
            "Show the total owed and the top debtors",
            "dashboard",
            cmd_dashboard,
        ),
        CommandEntry::new(
            CommandGroup::Reports,
            "overdue",
            "List debts past their due date",
            "overdue [client]",
            cmd_overdue,
        ),
        CommandEntry::new(
            CommandGroup::Reports,
            "statement",
            "Print a shareable account statement",
            "statement <client> [--kind any|debt|payment] [--from YYYY-MM-DD] [--to YYYY-MM-DD]",
            cmd_statement,
        ),
        CommandEntry::new(
            CommandGroup::Reports,
            "remind",
            "Compose a payment reminder and messaging link",
            "remind <client> [transaction]",
            cmd_remind,
        ),
        CommandEntry::new(
            CommandGroup::Reports,
            "export",
            "Export a client's transactions to CSV or JSON",
            "export <client> [path] [--format csv|json] [--kind ...] [--from ...] [--to ...]",
            cmd_export,
        ),
    ]
}

fn cmd_dashboard(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !args.is_empty() {
        return Err(CommandError::InvalidArguments("usage: dashboard".into()));
    }
    let summary =
        SummaryService::dashboard(context.book.clients(), context.config.top_debtor_limit);

    output_section("Dashboard");
    output::info(format!(
        "  Total outstanding: {}",
        context.amount(summary.total_outstanding)
    ));
    output::info(format!("  Clients          : {}", summary.client_count));
    output::info(format!("  Storage          : {}", context.book.status()));

    output_section("Top debtors");
    if summary.top_debtors.is_empty() {
        output::info("Nobody owes anything.");
        return Ok(());
    }
    let max = summary
        .top_debtors
        .first()
        .map(|top| top.balance)
        .unwrap_or_default();
    let label_width = summary
        .top_debtors
        .iter()
        .map(|entry| entry.chart_label().chars().count())
        .max()
        .unwrap_or_default();
    for entry in &summary.top_debtors {
        output::info(format!(
            "  {:<label_width$}  {:<bar_width$}  {}",
            entry.chart_label(),
            output::bar(entry.balance, max, BAR_WIDTH),
            context.amount(entry.balance),
            bar_width = BAR_WIDTH,
        ));
    }
    Ok(())
}

fn cmd_overdue(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let now = context.book.now();
    let clients = match args {
        [] => context.book.clients().iter().collect::<Vec<_>>(),
        [reference] => vec![context.resolve_client(reference)?],
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: overdue [client]".into(),
            ))
        }
    };

    output_section("Overdue debts");
    let mut rows = Vec::new();
    for client in clients {
        for txn in collect_overdue(&client.transactions, now) {
            rows.push(vec![
                client.name.clone(),
                short_id(txn.id),
                txn.due_date.map(format_timestamp).unwrap_or_default(),
                context.amount(txn.amount.value()),
                txn.label(),
            ]);
        }
    }
    if rows.is_empty() {
        output::info("Nothing is overdue.");
    } else {
        output::info(output::render_table(
            &["CLIENT", "ID", "DUE", "AMOUNT", "DESCRIPTION"],
            &rows,
        ));
    }
    Ok(())
}

fn cmd_statement(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &FILTER_FLAGS)?;
    let reference = parsed.require(0, "client")?;
    let criteria = parsed.criteria()?;
    let client = context.resolve_client(reference)?;
    output::info(StatementService::account_statement(
        client,
        &criteria,
        &context.statement_options(),
    ));
    Ok(())
}

fn cmd_remind(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let options = context.statement_options();
    let now = context.book.now();
    let (client, message) = match args {
        [reference] => {
            let client = context.resolve_client(reference)?;
            (client, StatementService::reminder_for_balance(client, &options, now)?)
        }
        [reference, tx_ref] => {
            let client = context.resolve_client(reference)?;
            let txn = ClientService::resolve_transaction(client, tx_ref)?;
            (
                client,
                StatementService::reminder_for_transaction(client, txn, &options),
            )
        }
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: remind <client> [transaction]".into(),
            ))
        }
    };

    output_section(format!("Reminder for {}", client.display_label()));
    output::info(&message);
    match reminder_link(&client.phone, &message) {
        Ok(link) => output::info(format!("Link: {link}")),
        Err(err) => output::warning(err),
    }
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let mut flags = vec!["format"];
    flags.extend(FILTER_FLAGS);
    let parsed = ParsedArgs::parse(args, &flags)?;
    let reference = parsed.require(0, "client")?;
    if parsed.positional.len() > 2 {
        return Err(CommandError::InvalidArguments(
            "usage: export <client> [path] [--format csv|json]".into(),
        ));
    }
    let format = match parsed.flag("format") {
        Some(format) => format.parse::<ExportFormat>()?,
        None => ExportFormat::default(),
    };
    let criteria = parsed.criteria()?;
    let client = context.resolve_client(reference)?;
    let file_name = export_file_name(&client.name, context.book.now().date_naive(), format);
    let path = match parsed.positional.get(1) {
        Some(target) => {
            let target = PathBuf::from(*target);
            if target.is_dir() {
                target.join(file_name)
            } else {
                target
            }
        }
        None => context.data_root.join(EXPORTS_DIR).join(file_name),
    };

    let transactions = filter_transactions(&client.transactions, &criteria);
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(&path)?);
    match format {
        ExportFormat::Csv => write_transactions_csv(&mut writer, &transactions)?,
        ExportFormat::Json => write_transactions_json(&mut writer, &transactions)?,
    }
    writer.flush()?;
    tracing::info!(
        client = %client.id,
        path = %path.display(),
        rows = transactions.len(),
        "exported transactions"
    );
    output::success(format!(
        "Exported {} transaction(s) to {}.",
        transactions.len(),
        path.display()
    ));
    Ok(())
}
