//! The seam between the engine and whoever answers its questions.

use std::cell::RefCell;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("interrupted by user")]
    Interrupted,
    #[error("no terminal available to ask \"{0}\" (pass --defaults or supply the value as a flag)")]
    NoTerminal(String),
    #[error("prompt failed: {0}")]
    Failed(String),
}

pub trait Prompter {
    /// Ask for a free-text value. An empty answer means `default`.
    fn input(&self, prompt: &str, default: &str) -> Result<String, PromptError>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, PromptError>;
}

/// Accepts every default without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsPrompter;

impl Prompter for DefaultsPrompter {
    fn input(&self, _prompt: &str, default: &str) -> Result<String, PromptError> {
        Ok(default.to_owned())
    }

    fn confirm(&self, _prompt: &str, default: bool) -> Result<bool, PromptError> {
        Ok(default)
    }
}

/// Replays queued answers and records every question asked. Once a queue is
/// exhausted the default is returned.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    inputs: RefCell<VecDeque<String>>,
    confirms: RefCell<VecDeque<bool>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_inputs<I, S>(self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs
            .borrow_mut()
            .extend(answers.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_confirms(self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.confirms.borrow_mut().extend(answers);
        self
    }

    /// Every prompt text seen so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, prompt: &str, default: &str) -> Result<String, PromptError> {
        self.asked.borrow_mut().push(prompt.to_owned());
        let answer = self.inputs.borrow_mut().pop_front().unwrap_or_default();
        if answer.trim().is_empty() {
            Ok(default.to_owned())
        } else {
            Ok(answer)
        }
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, PromptError> {
        self.asked.borrow_mut().push(prompt.to_owned());
        Ok(self.confirms.borrow_mut().pop_front().unwrap_or(default))
    }
}
