//! Dispatch, error reporting and shared helpers for shell commands.

use std::{collections::HashMap, io};

use chrono::NaiveDate;
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use uuid::Uuid;

use duebook_config::ConfigError;
use duebook_core::{
    format::format_amount, CoreError, FilterCriteria, KindFilter, StatementOptions,
};
use duebook_domain::{Amount, Client, DomainError};

use crate::errors::AppError;

use super::output;
use super::prompts;
use super::registry::CommandEntry;
pub(crate) use super::shell_context::{CliMode, ShellContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        CommandError::App(AppError::Core(err))
    }
}

impl From<DomainError> for CommandError {
    fn from(err: DomainError) -> Self {
        CommandError::App(AppError::from(err))
    }
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        CommandError::App(AppError::Config(err))
    }
}

/// User-facing CLI error wrapper.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
    #[error("Line editor failed: {0}")]
    Readline(#[from] ReadlineError),
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::App(AppError::Core(err))
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::App(AppError::Config(err))
    }
}

impl ShellContext {
    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    /// Tokenizes and runs one input line.
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match super::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.print_warning(&err.to_string());
                return Ok(LoopControl::Continue);
            }
        };

        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let command = raw.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

        match self.dispatch(&command, raw, &args) {
            Ok(LoopControl::Exit) => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            other => other,
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .words()
            .map(|key| (levenshtein(key, &needle), key))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = best {
            if distance <= 3 {
                output::hint(format!("Did you mean `{}`?", best));
            }
        }
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn can_prompt(&self) -> bool {
        self.mode == CliMode::Interactive
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CommandError> {
        self.confirm("Exit shell?", true)
    }

    /// Asks for confirmation interactively; scripts always proceed.
    pub(crate) fn confirm(&self, prompt: &str, default: bool) -> Result<bool, CommandError> {
        if !self.can_prompt() {
            return Ok(true);
        }
        prompts::confirm(&self.theme, prompt, default)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                self.print_error(&message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::App(AppError::Core(CoreError::ClientNotFound(reference))) => {
                self.print_error(&format!("No client matches `{reference}`."));
                output::hint("Use `clients` to list clients and their ids.");
            }
            CommandError::App(AppError::Core(CoreError::AmbiguousReference(reference))) => {
                self.print_error(&format!("`{reference}` matches more than one entry."));
                output::hint("Use a longer id prefix.");
            }
            other => self.print_error(&other.to_string()),
        }
    }

    pub(crate) fn print_error(&self, message: &str) {
        output::error(message);
    }

    pub(crate) fn print_warning(&self, message: &str) {
        output::warning(message);
    }

    pub(crate) fn resolve_client(&self, reference: &str) -> Result<&Client, CommandError> {
        Ok(self.book.resolve_client(reference)?)
    }

    pub(crate) fn amount(&self, value: f64) -> String {
        format_amount(value, &self.config.currency)
    }

    pub(crate) fn statement_options(&self) -> StatementOptions {
        StatementOptions {
            currency: self.config.currency.clone(),
            history_limit: self.config.statement_history_limit,
        }
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }
}

/// Positional arguments plus `--flag value` pairs.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    pub positional: Vec<&'a str>,
    flags: HashMap<String, &'a str>,
}

impl<'a> ParsedArgs<'a> {
    /// Splits `args`, accepting only the listed flag names.
    pub(crate) fn parse(args: &[&'a str], allowed: &[&str]) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            let Some(name) = arg.strip_prefix("--") else {
                parsed.positional.push(arg);
                continue;
            };
            let name = name.to_ascii_lowercase();
            if !allowed.contains(&name.as_str()) {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `--{name}`"
                )));
            }
            let value = iter.next().ok_or_else(|| {
                CommandError::InvalidArguments(format!("option `--{name}` needs a value"))
            })?;
            parsed.flags.insert(name, value);
        }
        Ok(parsed)
    }

    pub(crate) fn flag(&self, name: &str) -> Option<&'a str> {
        self.flags.get(name).copied()
    }

    pub(crate) fn require(&self, index: usize, what: &str) -> Result<&'a str, CommandError> {
        self.positional
            .get(index)
            .copied()
            .ok_or_else(|| CommandError::InvalidArguments(format!("missing {what}")))
    }

    /// Positional arguments from `index` onward joined by spaces.
    pub(crate) fn rest(&self, index: usize) -> Option<String> {
        let rest = self.positional.get(index..)?.join(" ");
        (!rest.trim().is_empty()).then_some(rest)
    }

    /// Builds filter criteria from `--kind`, `--from` and `--to`.
    pub(crate) fn criteria(&self) -> Result<FilterCriteria, CommandError> {
        let mut criteria = FilterCriteria::any();
        if let Some(kind) = self.flag("kind") {
            criteria = criteria.with_kind(kind.parse::<KindFilter>()?);
        }
        if let Some(from) = self.flag("from") {
            criteria = criteria.since(parse_date(from)?);
        }
        if let Some(to) = self.flag("to") {
            criteria = criteria.until(parse_date(to)?);
        }
        Ok(criteria)
    }
}

pub(crate) const FILTER_FLAGS: [&str; 3] = ["kind", "from", "to"];

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

pub(crate) fn parse_amount(input: &str) -> Result<Amount, CommandError> {
    input.parse::<Amount>().map_err(|_| {
        CommandError::InvalidArguments(format!(
            "invalid amount `{}` (use a non-negative number)",
            input
        ))
    })
}

pub(crate) fn short_id(id: Uuid) -> String {
    let mut short = id.simple().to_string();
    short.truncate(8);
    short
}
