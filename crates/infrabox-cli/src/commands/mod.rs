pub mod apply;
pub mod completions;
pub mod doctor;
pub mod initialize;
pub mod inspect;
pub mod list;
pub mod man_pages;

use dialoguer::{Confirm, Input};
use infrabox_core::{CoreError, ErrorKind, PromptError, Prompter};
use std::io::IsTerminal;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 3;
pub const EXIT_INTERRUPTED: u8 = 130;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn colorize_status(status: &str) -> String {
    use console::Style;
    match status {
        "created" | "applied" | "no changes" | "pass" => {
            Style::new().green().apply_to(status).to_string()
        }
        "changes pending" | "warn" | "dry run" => Style::new().yellow().apply_to(status).to_string(),
        "failed" | "fail" | "declined" => Style::new().red().apply_to(status).to_string(),
        "record" | "variables" => Style::new().cyan().apply_to(status).to_string(),
        other => other.to_owned(),
    }
}

/// Answers prompts on the controlling terminal.
///
/// Without a terminal, free-text questions fail (the caller must pass
/// `--defaults` or supply the value as a flag) and confirmations are
/// declined.
pub struct TerminalPrompter {
    interactive: bool,
}

impl TerminalPrompter {
    pub fn detect() -> Self {
        Self {
            interactive: std::io::stdin().is_terminal() && std::io::stderr().is_terminal(),
        }
    }
}

fn prompt_error(err: dialoguer::Error) -> PromptError {
    match err {
        dialoguer::Error::IO(io) if io.kind() == std::io::ErrorKind::Interrupted => {
            PromptError::Interrupted
        }
        other => PromptError::Failed(other.to_string()),
    }
}

impl Prompter for TerminalPrompter {
    fn input(&self, prompt: &str, default: &str) -> Result<String, PromptError> {
        if !self.interactive {
            return Err(PromptError::NoTerminal(prompt.to_owned()));
        }
        Input::<String>::new()
            .with_prompt(prompt)
            .default(default.to_owned())
            .interact_text()
            .map_err(prompt_error)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, PromptError> {
        if !self.interactive {
            eprintln!("{prompt} (no terminal, answering no)");
            return Ok(false);
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }
}

/// Print `err` for the operator and pick the exit code.
///
/// Input mistakes and conflicts are clean aborts: nothing was changed, so
/// they exit zero. Anything else is a failure.
pub fn report_error(err: &CoreError, command: &str, environment: &str) -> Result<u8, String> {
    match err.kind() {
        ErrorKind::UserInput | ErrorKind::Conflict => {
            eprintln!("error: {err}");
            Ok(EXIT_SUCCESS)
        }
        ErrorKind::NotFound => {
            eprintln!("error: {err}");
            eprintln!("hint: run `infrabox initialize {environment}` first");
            Ok(EXIT_NOT_FOUND)
        }
        ErrorKind::Interrupted => {
            eprintln!("{command} interrupted by user");
            Ok(EXIT_INTERRUPTED)
        }
        ErrorKind::ExternalTool | ErrorKind::Internal => Err(err.to_string()),
    }
}
