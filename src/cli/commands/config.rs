use dialoguer::Select;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output::{self, section as output_section};
use crate::cli::registry::{CommandEntry, CommandGroup};
use crate::cli::shell_context::CliMode;

const USAGE: &str = "config [show|set <key> <value>|backup [note]|backups|restore [name]]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        CommandGroup::Settings,
        "config",
        "View and manage preferences",
        USAGE,
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return show_config(context);
    };

    match action.to_lowercase().as_str() {
        "show" => show_config(context),
        "set" => {
            let [key, value @ ..] = rest else {
                return Err(CommandError::InvalidArguments(
                    "usage: config set <key> <value>".into(),
                ));
            };
            set_config_value(context, key, &value.join(" "))
        }
        "backup" => {
            let note = (!rest.is_empty()).then(|| rest.join(" "));
            let name = context
                .config_manager
                .backup(&context.config, note.as_deref())?;
            output::success(format!("Configuration backed up as {name}."));
            Ok(())
        }
        "backups" => {
            let names = context.config_manager.list_backups()?;
            output_section("Configuration backups");
            if names.is_empty() {
                output::info("No configuration backups yet.");
            }
            for name in names {
                output::info(format!("  {name}"));
            }
            Ok(())
        }
        "restore" => restore_config(context, rest.first().copied()),
        _ => Err(CommandError::InvalidArguments(format!("usage: {USAGE}"))),
    }
}

fn show_config(context: &ShellContext) -> CommandResult {
    output_section("Configuration");
    let rows: Vec<Vec<String>> = context
        .config
        .entries()
        .into_iter()
        .map(|(key, value)| vec![key.to_string(), value])
        .collect();
    output::info(output::render_table(&["KEY", "VALUE"], &rows));
    output::info(format!(
        "  File: {}",
        context.config_manager.config_path().display()
    ));
    Ok(())
}

fn set_config_value(context: &mut ShellContext, key: &str, value: &str) -> CommandResult {
    if value.is_empty() && !key.eq_ignore_ascii_case("data_root") {
        return Err(CommandError::InvalidArguments(
            "usage: config set <key> <value>".into(),
        ));
    }
    context.config.set_field(key, value)?;
    context.persist_config()?;
    apply_runtime_settings(context);
    output::success(format!("Updated {}.", key.to_ascii_lowercase()));
    if key.eq_ignore_ascii_case("data_root") {
        output::hint("The new data folder is used the next time the shell starts.");
    }
    Ok(())
}

fn restore_config(context: &mut ShellContext, name: Option<&str>) -> CommandResult {
    let name = match name {
        Some(name) => name.to_string(),
        None => {
            if !context.can_prompt() {
                return Err(CommandError::InvalidArguments(
                    "usage: config restore <name>".into(),
                ));
            }
            let names = context.config_manager.list_backups()?;
            if names.is_empty() {
                output::info("No configuration backups yet.");
                return Ok(());
            }
            let Some(index) = Select::with_theme(&context.theme)
                .with_prompt("Select configuration backup")
                .items(&names)
                .default(0)
                .interact_opt()?
            else {
                output::info("Operation cancelled.");
                return Ok(());
            };
            names[index].clone()
        }
    };

    context.config = context.config_manager.restore(&name)?;
    apply_runtime_settings(context);
    output::success(format!("Configuration restored from {name}."));
    Ok(())
}

fn apply_runtime_settings(context: &ShellContext) {
    let enabled = context.config.ui_color_enabled && context.mode == CliMode::Interactive;
    output::set_color_enabled(enabled);
}
