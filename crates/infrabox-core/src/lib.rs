//! Lifecycle orchestration for infrabox environments.
//!
//! This crate ties the schema, the environment store, and the external
//! collaborators together into the `Engine`: `initialize` scaffolds a new
//! environment behind the overlap guard and rolls back on failure, `create`
//! and `destroy` gate the provisioning tool's apply behind a plan and a
//! confirmation. It also owns the cooperative cancellation token, the
//! `Prompter` seam, parameter collection, and `infrabox.toml` configuration.

pub mod collect;
pub mod config;
pub mod engine;
pub mod lifecycle;
pub mod prompt;
pub mod signal;

pub use collect::{check_containment, collect_params, ParamOverrides};
pub use config::{Config, ConfigError, CONFIG_FILE};
pub use engine::{
    ApplyOutcome, ApplyReport, Engine, EnvDetails, EnvSummary, InitOptions, InitReport,
    InitStatus, PlanReport, RenderedArtifact,
};
pub use lifecycle::{validate_transition, EnvState};
pub use prompt::{DefaultsPrompter, PromptError, Prompter, ScriptedPrompter};
pub use signal::{
    install_signal_handler, on_interrupt, CancelGuard, CancelToken, InterruptResponse,
};

use infrabox_store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid environment name: {0}")]
    Name(#[from] infrabox_schema::NameError),
    #[error("invalid {field}: {source}")]
    Cidr {
        field: &'static str,
        #[source]
        source: infrabox_schema::CidrError,
    },
    #[error("subnet {subnet} does not lie inside network {network}")]
    SubnetOutsideNetwork { subnet: String, network: String },
    #[error(transparent)]
    Overlap(#[from] infrabox_store::OverlapError),
    #[error("Environment directory '{0}' does not exist")]
    EnvNotFound(String),
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("provisioning failed: {0}")]
    Driver(#[from] infrabox_runtime::DriverError),
    #[error("template error: {0}")]
    Render(#[from] infrabox_runtime::RenderError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("environment record error: {0}")]
    Record(#[from] infrabox_schema::RecordError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("interrupted by user")]
    Interrupted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How an error is reported and whether the process fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad name or address block; reported, nothing was changed.
    UserInput,
    /// Already initialized or overlapping; reported, nothing was changed.
    Conflict,
    /// The provisioning tool failed.
    ExternalTool,
    Interrupted,
    NotFound,
    Internal,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Name(_) | CoreError::Cidr { .. } | CoreError::SubnetOutsideNetwork { .. } => {
                ErrorKind::UserInput
            }
            CoreError::Overlap(_) | CoreError::Store(StoreError::AlreadyExists(_)) => {
                ErrorKind::Conflict
            }
            CoreError::EnvNotFound(_) | CoreError::Store(StoreError::EnvNotFound(_)) => {
                ErrorKind::NotFound
            }
            CoreError::Driver(_) => ErrorKind::ExternalTool,
            CoreError::Interrupted | CoreError::Prompt(PromptError::Interrupted) => {
                ErrorKind::Interrupted
            }
            CoreError::InvalidTransition { .. }
            | CoreError::Render(_)
            | CoreError::Store(_)
            | CoreError::Record(_)
            | CoreError::Config(_)
            | CoreError::Prompt(_)
            | CoreError::Io(_) => ErrorKind::Internal,
        }
    }
}
