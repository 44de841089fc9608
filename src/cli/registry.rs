use std::collections::BTreeMap;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// Heading a command is listed under by `help`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandGroup {
    Clients,
    Ledger,
    Reports,
    Backups,
    Settings,
    Shell,
}

impl CommandGroup {
    /// Help order.
    pub const ALL: [CommandGroup; 6] = [
        CommandGroup::Clients,
        CommandGroup::Ledger,
        CommandGroup::Reports,
        CommandGroup::Backups,
        CommandGroup::Settings,
        CommandGroup::Shell,
    ];

    pub fn title(self) -> &'static str {
        match self {
            CommandGroup::Clients => "Clients",
            CommandGroup::Ledger => "Debts and payments",
            CommandGroup::Reports => "Reports and exports",
            CommandGroup::Backups => "Backups",
            CommandGroup::Settings => "Settings",
            CommandGroup::Shell => "Shell",
        }
    }
}

pub struct CommandEntry {
    pub group: CommandGroup,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        group: CommandGroup,
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            group,
            name,
            aliases: &[],
            description,
            usage,
            handler,
        }
    }

    /// Extra words that run the same command.
    pub const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }
}

/// Commands in registration order plus a lookup by name or alias.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    lookup: BTreeMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = CommandEntry>) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            registry.register(entry);
        }
        registry
    }

    /// Adds `entry`, replacing a command of the same name in place.
    ///
    /// Names always win over aliases; an alias already taken is skipped.
    pub fn register(&mut self, entry: CommandEntry) {
        let index = match self
            .entries
            .iter()
            .position(|existing| existing.name == entry.name)
        {
            Some(index) => {
                self.entries[index] = entry;
                index
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        let entry = &self.entries[index];
        self.lookup.insert(entry.name, index);
        for &alias in entry.aliases {
            self.lookup.entry(alias).or_insert(index);
        }
    }

    pub fn get(&self, word: &str) -> Option<&CommandEntry> {
        self.lookup.get(word).map(|&index| &self.entries[index])
    }

    pub fn handler(&self, word: &str) -> Option<CommandHandler> {
        self.get(word).map(|entry| entry.handler)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CommandEntry> + '_ {
        self.entries.iter()
    }

    pub fn in_group(&self, group: CommandGroup) -> impl Iterator<Item = &CommandEntry> + '_ {
        self.entries.iter().filter(move |entry| entry.group == group)
    }

    /// Every word the shell accepts as a command, aliases included, sorted.
    pub fn words(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.lookup.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    fn noop(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
        Ok(())
    }

    #[test]
    fn aliases_resolve_to_their_command() {
        let registry = CommandRegistry::with_entries(commands::all_definitions());
        assert_eq!(registry.get("quit").map(|entry| entry.name), Some("exit"));
        assert_eq!(registry.get("ls").map(|entry| entry.name), Some("clients"));
        assert!(registry.words().any(|word| word == "quit"));
        assert!(registry.get("nothing").is_none());
    }

    #[test]
    fn every_group_has_commands() {
        let registry = CommandRegistry::with_entries(commands::all_definitions());
        for group in CommandGroup::ALL {
            assert!(
                registry.in_group(group).next().is_some(),
                "{} has no commands",
                group.title()
            );
        }
    }

    #[test]
    fn reregistering_replaces_in_place_and_names_beat_aliases() {
        let mut registry = CommandRegistry::with_entries([
            CommandEntry::new(CommandGroup::Shell, "first", "one", "first", noop)
                .with_aliases(&["second"]),
            CommandEntry::new(CommandGroup::Shell, "second", "two", "second", noop),
        ]);
        assert_eq!(registry.get("second").map(|entry| entry.description), Some("two"));

        registry.register(CommandEntry::new(
            CommandGroup::Clients,
            "first",
            "replaced",
            "first",
            noop,
        ));
        let names: Vec<_> = registry.entries().map(|entry| entry.name).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(registry.get("first").map(|entry| entry.group), Some(CommandGroup::Clients));
    }
}
