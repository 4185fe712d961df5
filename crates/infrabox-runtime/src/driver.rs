use crate::DriverError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Whether plan and apply build the environment up or tear it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Apply,
    Destroy,
}

impl Action {
    #[inline]
    pub fn is_destroy(self) -> bool {
        matches!(self, Action::Destroy)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Apply => "apply",
            Action::Destroy => "destroy",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Init,
    Validate,
    Plan,
    Apply,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Init => "init",
            Step::Validate => "validate",
            Step::Plan => "plan",
            Step::Apply => "apply",
        })
    }
}

/// Result of comparing the configuration against live infrastructure.
/// Computed per invocation, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    NoChanges,
    ChangesPending,
    Failed,
}

/// The external tool that turns an environment directory into real
/// infrastructure.
///
/// Every call takes a dry-run flag; a dry-run call describes the command it
/// would run and has no effect.
pub trait ProvisioningDriver: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    fn init(&self, dir: &Path, dry_run: bool) -> Result<(), DriverError>;

    fn validate(&self, dir: &Path, dry_run: bool) -> Result<(), DriverError>;

    /// A plan that ran but reported an error is `Ok(PlanStatus::Failed)`;
    /// `Err` is reserved for not being able to run the tool at all.
    fn plan(&self, dir: &Path, action: Action, dry_run: bool) -> Result<PlanStatus, DriverError>;

    fn apply(&self, dir: &Path, action: Action, dry_run: bool) -> Result<(), DriverError>;
}

pub fn select_driver(
    name: &str,
    terraform_bin: &str,
) -> Result<Box<dyn ProvisioningDriver>, DriverError> {
    match name {
        "terraform" => Ok(Box::new(crate::terraform::TerraformDriver::new(
            terraform_bin,
        ))),
        "mock" => Ok(Box::new(crate::mock::MockDriver::from_env())),
        other => Err(DriverError::Unavailable(other.to_owned())),
    }
}
