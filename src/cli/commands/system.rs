use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::output::{self, section as output_section};
use crate::cli::registry::{CommandEntry, CommandGroup};
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            CommandGroup::Shell,
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new(
            CommandGroup::Shell,
            "version",
            "Show build metadata",
            "version",
            cmd_version,
        ),
        CommandEntry::new(CommandGroup::Shell, "exit", "Exit the shell", "exit", cmd_exit)
            .with_aliases(&["quit"]),
    ]
}

fn cmd_version(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output_section(format!("Duebook {}", meta.version));
    output::info(format!(
        "  Storage schema: v{}",
        duebook_storage_json::SCHEMA_VERSION
    ));
    output::info(format!("  Data folder   : {}", context.data_root.display()));
    output::info(format!(
        "  Build hash    : {} ({})",
        meta.git_hash, meta.git_status
    ));
    output::info(format!("  Built at      : {}", meta.timestamp));
    output::info(format!("  Target        : {}", meta.target));
    output::info(format!("  Profile       : {}", meta.profile));
    output::info(format!("  Rustc         : {}", meta.rustc));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.command(&name.to_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(name),
        }
        return Ok(());
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
