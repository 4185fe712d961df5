use crate::driver::{Action, PlanStatus, ProvisioningDriver, Step};
use crate::DriverError;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

const PLAN_NO_CHANGES: i32 = 0;
const PLAN_CHANGES_PENDING: i32 = 2;

/// Drives the `terraform` binary inside an environment directory.
#[derive(Debug, Clone)]
pub struct TerraformDriver {
    binary: String,
}

impl TerraformDriver {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command_line(&self, args: &[&str]) -> String {
        let mut line = self.binary.clone();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Print the command about to run. Returns `true` if it should actually
    /// be executed.
    fn announce(&self, args: &[&str], dir: &Path, dry_run: bool) -> bool {
        let line = self.command_line(args);
        eprintln!("[infrabox] running: {line} (in {})", dir.display());
        if dry_run {
            eprintln!("[infrabox] dry-run: command not executed");
            info!("dry-run: skipped `{line}`");
            return false;
        }
        debug!("exec `{line}` in {}", dir.display());
        true
    }

    /// Run with output captured, then relay it. Non-zero exit is an error.
    fn run_captured(&self, step: Step, dir: &Path, dry_run: bool) -> Result<(), DriverError> {
        let args = step_args(step, Action::Apply);
        if !self.announce(&args, dir, dry_run) {
            return Ok(());
        }
        let output = Command::new(&self.binary)
            .args(&args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(&args, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            eprintln!("{}", stdout.trim_end());
        }
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            eprintln!("{}", stderr.trim_end());
        }
        Err(DriverError::StepFailed {
            step,
            command: self.command_line(&args),
            code: output.status.code().unwrap_or(-1),
        })
    }

    /// Run attached to the terminal, returning the exit code.
    fn run_inherited(&self, args: &[&str], dir: &Path) -> Result<i32, DriverError> {
        let status = Command::new(&self.binary)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| self.spawn_error(args, e))?;
        Ok(status.code().unwrap_or(-1))
    }

    fn spawn_error(&self, args: &[&str], source: std::io::Error) -> DriverError {
        DriverError::Spawn {
            command: self.command_line(args),
            source,
        }
    }
}

/// Terraform arguments for one lifecycle step.
pub fn step_args(step: Step, action: Action) -> Vec<&'static str> {
    let mut args = match step {
        Step::Init => vec!["init", "-input=false"],
        Step::Validate => vec!["validate"],
        Step::Plan => vec!["plan", "-detailed-exitcode"],
        Step::Apply => vec!["apply", "-auto-approve"],
    };
    if action.is_destroy() && matches!(step, Step::Plan | Step::Apply) {
        args.push("-destroy");
    }
    args
}

/// Map the exit code of `terraform plan -detailed-exitcode`.
pub fn plan_status_from_code(code: i32) -> PlanStatus {
    match code {
        PLAN_NO_CHANGES => PlanStatus::NoChanges,
        PLAN_CHANGES_PENDING => PlanStatus::ChangesPending,
        _ => PlanStatus::Failed,
    }
}

impl ProvisioningDriver for TerraformDriver {
    fn name(&self) -> &'static str {
        "terraform"
    }

    fn available(&self) -> bool {
        Command::new(&self.binary)
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    fn init(&self, dir: &Path, dry_run: bool) -> Result<(), DriverError> {
        self.run_captured(Step::Init, dir, dry_run)
    }

    fn validate(&self, dir: &Path, dry_run: bool) -> Result<(), DriverError> {
        self.run_captured(Step::Validate, dir, dry_run)
    }

    fn plan(&self, dir: &Path, action: Action, dry_run: bool) -> Result<PlanStatus, DriverError> {
        let args = step_args(Step::Plan, action);
        if !self.announce(&args, dir, dry_run) {
            return Ok(PlanStatus::NoChanges);
        }
        let code = self.run_inherited(&args, dir)?;
        let status = plan_status_from_code(code);
        debug!("plan exited with {code}: {status:?}");
        Ok(status)
    }

    fn apply(&self, dir: &Path, action: Action, dry_run: bool) -> Result<(), DriverError> {
        let args = step_args(Step::Apply, action);
        if !self.announce(&args, dir, dry_run) {
            return Ok(());
        }
        match self.run_inherited(&args, dir)? {
            0 => Ok(()),
            code => Err(DriverError::StepFailed {
                step: Step::Apply,
                command: self.command_line(&args),
                code,
            }),
        }
    }
}
