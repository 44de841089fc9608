use duebook_core::format::format_timestamp;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output::{self, section as output_section};
use crate::cli::registry::{CommandEntry, CommandGroup};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            CommandGroup::Backups,
            "backups",
            "List snapshots of the client book",
            "backups",
            cmd_backups,
        ),
        CommandEntry::new(
            CommandGroup::Backups,
            "restore",
            "Replace the client book with a snapshot",
            "restore <backup>",
            cmd_restore,
        ),
        CommandEntry::new(
            CommandGroup::Backups,
            "reload",
            "Re-read the client book from disk",
            "reload",
            cmd_reload,
        ),
    ]
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.book.list_backups()?;

    output_section("Client book backups");
    if backups.is_empty() {
        output::info("No backups yet. One is taken before every change.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = backups
        .into_iter()
        .map(|backup| {
            vec![
                backup.id,
                format!("{} UTC", backup.created_at.format("%Y-%m-%d %H:%M:%S")),
                backup
                    .size_bytes
                    .map(|size| format!("{size} B"))
                    .unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    output::info(output::render_table(&["NAME", "CREATED", "SIZE"], &rows));
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [name] = args else {
        return Err(CommandError::InvalidArguments("usage: restore <backup>".into()));
    };
    let prompt = format!(
        "Replace the current {} client(s) with backup {}?",
        context.book.clients().len(),
        name
    );
    if !context.confirm(&prompt, false)? {
        output::info("Restore cancelled.");
        return Ok(());
    }
    let count = context.book.restore_backup(name)?;
    output::success(format!("Restored {count} client(s) from {name}."));
    Ok(())
}

fn cmd_reload(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let count = context.book.reload()?;
    output::success(format!("Loaded {count} client(s)."));
    if let Some(latest) = context.book.list_backups()?.first() {
        output::info(format!(
            "  Latest backup: {} ({})",
            latest.id,
            format_timestamp(latest.created_at)
        ));
    }
    Ok(())
}
