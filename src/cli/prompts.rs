//! Interactive questions asked by shell commands. Script mode never reaches these.

use dialoguer::{theme::ColorfulTheme, Confirm, Input};

use crate::cli::core::CommandError;

/// Yes/no question answered with `y` or `n`.
pub fn confirm(theme: &ColorfulTheme, prompt: &str, default: bool) -> Result<bool, CommandError> {
    Confirm::with_theme(theme)
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(CommandError::from)
}

/// Asks for a value again until it contains something besides whitespace.
pub fn required_text(theme: &ColorfulTheme, prompt: &str) -> Result<String, CommandError> {
    let answer = Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .validate_with(|input: &String| match blank_reason(input) {
            Some(reason) => Err(reason),
            None => Ok(()),
        })
        .interact_text()?;
    Ok(answer.trim().to_string())
}

fn blank_reason(input: &str) -> Option<&'static str> {
    input.trim().is_empty().then_some("a value is required")
}
