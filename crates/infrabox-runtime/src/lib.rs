//! External collaborators of the infrabox lifecycle.
//!
//! This crate puts the provisioning tool and the template engine behind
//! explicit seams: the `ProvisioningDriver` trait with a Terraform-backed
//! implementation and a recording mock, the `TemplateRenderer` that turns
//! environment parameters into Terraform files, and prerequisite checks for
//! the external binaries.

pub mod driver;
pub mod mock;
pub mod prereq;
pub mod templates;
pub mod terraform;

pub use driver::{select_driver, Action, PlanStatus, ProvisioningDriver, Step};
pub use mock::{DriverCall, MockDriver};
pub use prereq::{check_prereqs, format_missing, MissingPrereq};
pub use templates::{RenderError, TemplateRenderer, TemplateSource};
pub use terraform::TerraformDriver;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("driver I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("driver '{0}' is not available (expected 'terraform' or 'mock')")]
    Unavailable(String),
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{step} failed: `{command}` exited with status {code}")]
    StepFailed {
        step: Step,
        command: String,
        code: i32,
    },
    #[error("mock driver state poisoned: {0}")]
    Poisoned(String),
}
