use crate::CoreError;
use serde::Serialize;
use std::fmt;

/// Lifecycle of an environment. Only `Uninitialized` vs. `Initialized` is
/// observable on disk; `Applied` and `Destroyed` describe the outcome of the
/// current command and are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvState {
    Uninitialized,
    Initialized,
    Applied,
    Destroyed,
}

impl fmt::Display for EnvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EnvState::Uninitialized => "uninitialized",
            EnvState::Initialized => "initialized",
            EnvState::Applied => "applied",
            EnvState::Destroyed => "destroyed",
        })
    }
}

pub fn validate_transition(from: EnvState, to: EnvState) -> Result<(), CoreError> {
    let valid = matches!(
        (from, to),
        (EnvState::Uninitialized, EnvState::Initialized)
            | (
                EnvState::Initialized | EnvState::Applied | EnvState::Destroyed,
                EnvState::Applied | EnvState::Destroyed
            )
    );

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}
