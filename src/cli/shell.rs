use std::{
    borrow::Cow,
    fmt,
    io::{self, BufRead},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::{ValidationContext, ValidationResult, Validator},
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::{quote, split};

use crate::cli::core::{CliError, LoopControl};
use crate::cli::output;
use crate::cli::registry::CommandRegistry;
use crate::cli::shell_context::{CliMode, ShellContext};

/// Environment variable that switches the shell to line-by-line stdin mode.
pub const SCRIPT_ENV: &str = "DUEBOOK_CLI_SCRIPT";

const CLIENT_PLACEHOLDER: &str = "<client>";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    tracing::debug!(?mode, data_root = %context.data_root.display(), "shell started");

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<ShellCompleter, DefaultHistory>::new()?;
    editor.set_helper(Some(ShellCompleter::new(&context.registry)));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
    for warning in context.book.warnings() {
        output::warning(warning);
    }
    output::info(format!(
        "{} client(s) loaded. Type `help` to list commands.",
        context.book.clients().len()
    ));

    while context.running {
        if let Some(completer) = editor.helper_mut() {
            completer.set_clients(context.client_names());
        }
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line).ok();
                if run_line(context, line) == LoopControl::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output::info("Goodbye.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

/// Runs stdin line by line; blank lines and `#` comments are skipped.
fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if run_line(context, line) == LoopControl::Exit || !context.running {
            break;
        }
    }
    Ok(())
}

fn run_line(context: &mut ShellContext, line: &str) -> LoopControl {
    context.process_line(line).unwrap_or_else(|err| {
        context.report_error(err);
        LoopControl::Continue
    })
}

/// Tab completion for command words and, after commands taking a client, client names.
struct ShellCompleter {
    commands: Vec<String>,
    client_commands: Vec<String>,
    clients: Vec<String>,
}

impl ShellCompleter {
    fn new(registry: &CommandRegistry) -> Self {
        let commands = registry.words().map(str::to_string).collect();
        let client_commands = registry
            .entries()
            .filter(|entry| entry.usage.split_whitespace().nth(1) == Some(CLIENT_PLACEHOLDER))
            .flat_map(|entry| std::iter::once(entry.name).chain(entry.aliases.iter().copied()))
            .map(str::to_string)
            .collect();
        Self {
            commands,
            client_commands,
            clients: Vec::new(),
        }
    }

    fn set_clients(&mut self, mut names: Vec<String>) {
        names.sort_by_key(|name| name.to_lowercase());
        names.dedup();
        self.clients = names;
    }

    /// Start offset and candidates for the word ending at `pos`.
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let before = &line[..pos];
        let start = before
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let word = before[start..].to_lowercase();
        let preceding: Vec<&str> = before[..start].split_whitespace().collect();

        let pool: Vec<(String, String)> = match preceding.as_slice() {
            [] => self
                .commands
                .iter()
                .map(|name| (name.clone(), name.clone()))
                .collect(),
            [command] if self.client_commands.iter().any(|name| name == &command.to_lowercase()) => self
                .clients
                .iter()
                .map(|name| (name.clone(), quote(name).into_owned()))
                .collect(),
            _ => Vec::new(),
        };

        let pairs = pool
            .into_iter()
            .filter(|(display, _)| display.to_lowercase().starts_with(&word))
            .map(|(display, replacement)| Pair {
                display,
                replacement,
            })
            .collect();
        (start, pairs)
    }
}

impl Helper for ShellCompleter {}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(line, pos))
    }
}

impl Hinter for ShellCompleter {
    type Hint = String;
}

impl Highlighter for ShellCompleter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for ShellCompleter {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

/// Splits a line into words, honouring shell-style quotes.
pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError(err.to_string()))
}

#[derive(Debug)]
pub(crate) struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not read the line: {}", self.0)
    }
}
