use crate::cli::output::{self, section as output_section};
use crate::cli::registry::{CommandEntry, CommandGroup, CommandRegistry};

const NAME_WIDTH: usize = 14;

pub fn print_overview(registry: &CommandRegistry) {
    output_section("Duebook commands");
    for line in overview_lines(registry) {
        output::info(line);
    }
    output::hint("Quote names with spaces, e.g. show \"Salma Adel\". `help <command>` shows usage.");
}

pub fn print_command(entry: &CommandEntry) {
    output_section(format!("help {}", entry.name));
    for line in command_lines(entry) {
        output::info(line);
    }
}

/// Commands under their group headings, skipping empty groups.
fn overview_lines(registry: &CommandRegistry) -> Vec<String> {
    let mut lines = Vec::new();
    for group in CommandGroup::ALL {
        let mut entries = registry.in_group(group).peekable();
        if entries.peek().is_none() {
            continue;
        }
        lines.push(group.title().to_string());
        lines.extend(
            entries.map(|entry| format!("  {:<NAME_WIDTH$} {}", entry.name, entry.description)),
        );
    }
    lines
}

fn command_lines(entry: &CommandEntry) -> Vec<String> {
    let mut lines = vec![
        format!("  {}", entry.description),
        format!("  Usage  : {}", entry.usage),
    ];
    if !entry.aliases.is_empty() {
        lines.push(format!("  Aliases: {}", entry.aliases.join(", ")));
    }
    lines.push(format!("  Group  : {}", entry.group.title()));
    lines
}
