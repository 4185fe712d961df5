use crate::driver::{Action, PlanStatus, ProvisioningDriver, Step};
use crate::DriverError;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Environment variable selecting the plan status `MockDriver::from_env`
/// reports: `no_changes` (default), `changes_pending`, or `failed`.
pub const MOCK_PLAN_ENV: &str = "INFRABOX_MOCK_PLAN";
/// Environment variable naming a step (`init`, `validate`, `plan`, `apply`)
/// at which `MockDriver::from_env` fails.
pub const MOCK_FAIL_ENV: &str = "INFRABOX_MOCK_FAIL";

/// One recorded driver invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverCall {
    pub step: Step,
    pub action: Option<Action>,
    pub dry_run: bool,
    pub dir: PathBuf,
}

#[derive(Debug)]
struct MockState {
    calls: Vec<DriverCall>,
    plan_status: PlanStatus,
    fail_at: Option<Step>,
}

type StepHook = Arc<dyn Fn(Step) + Send + Sync>;

/// In-memory driver for tests. Clones share the same call log.
#[derive(Clone)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
    hook: Option<StepHook>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                calls: Vec::new(),
                plan_status: PlanStatus::NoChanges,
                fail_at: None,
            })),
            hook: None,
        }
    }
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriver")
            .field("state", &self.state)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

fn parse_step(s: &str) -> Option<Step> {
    match s {
        "init" => Some(Step::Init),
        "validate" => Some(Step::Validate),
        "plan" => Some(Step::Plan),
        "apply" => Some(Step::Apply),
        _ => None,
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock configured from `INFRABOX_MOCK_PLAN` / `INFRABOX_MOCK_FAIL`, so
    /// the CLI binary can be exercised end to end without Terraform.
    pub fn from_env() -> Self {
        let mut mock = Self::new();
        if let Ok(plan) = std::env::var(MOCK_PLAN_ENV) {
            mock = mock.with_plan_status(match plan.as_str() {
                "changes_pending" => PlanStatus::ChangesPending,
                "failed" => PlanStatus::Failed,
                _ => PlanStatus::NoChanges,
            });
        }
        if let Some(step) = std::env::var(MOCK_FAIL_ENV)
            .ok()
            .as_deref()
            .and_then(parse_step)
        {
            mock = mock.failing_at(step);
        }
        mock
    }

    #[must_use]
    pub fn with_plan_status(self, status: PlanStatus) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.plan_status = status;
        }
        self
    }

    /// Make every non-dry-run call to `step` fail.
    #[must_use]
    pub fn failing_at(self, step: Step) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.fail_at = Some(step);
        }
        self
    }

    /// Run `hook` after each recorded call, e.g. to simulate an interrupt
    /// arriving while a step is in progress.
    #[must_use]
    pub fn with_step_hook(mut self, hook: impl Fn(Step) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn count(&self, step: Step) -> usize {
        self.calls().iter().filter(|c| c.step == step).count()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockState>, DriverError> {
        self.state
            .lock()
            .map_err(|e| DriverError::Poisoned(e.to_string()))
    }

    fn record(
        &self,
        step: Step,
        action: Option<Action>,
        dir: &Path,
        dry_run: bool,
    ) -> Result<PlanStatus, DriverError> {
        let (fail, plan_status) = {
            let mut state = self.lock()?;
            state.calls.push(DriverCall {
                step,
                action,
                dry_run,
                dir: dir.to_path_buf(),
            });
            (state.fail_at == Some(step) && !dry_run, state.plan_status)
        };
        if let Some(hook) = &self.hook {
            hook(step);
        }
        if fail {
            return Err(DriverError::StepFailed {
                step,
                command: format!("mock {step}"),
                code: 1,
            });
        }
        Ok(plan_status)
    }
}

impl ProvisioningDriver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn init(&self, dir: &Path, dry_run: bool) -> Result<(), DriverError> {
        self.record(Step::Init, None, dir, dry_run).map(|_| ())
    }

    fn validate(&self, dir: &Path, dry_run: bool) -> Result<(), DriverError> {
        self.record(Step::Validate, None, dir, dry_run).map(|_| ())
    }

    fn plan(&self, dir: &Path, action: Action, dry_run: bool) -> Result<PlanStatus, DriverError> {
        let status = self.record(Step::Plan, Some(action), dir, dry_run)?;
        Ok(if dry_run { PlanStatus::NoChanges } else { status })
    }

    fn apply(&self, dir: &Path, action: Action, dry_run: bool) -> Result<(), DriverError> {
        self.record(Step::Apply, Some(action), dir, dry_run).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn records_calls_in_order() {
        let mock = MockDriver::new();
        let dir = Path::new("/tmp/env/dev");
        mock.init(dir, false).unwrap();
        mock.validate(dir, false).unwrap();
        mock.plan(dir, Action::Destroy, false).unwrap();
        mock.apply(dir, Action::Destroy, true).unwrap();

        let calls = mock.calls();
        let steps: Vec<_> = calls.iter().map(|c| c.step).collect();
        assert_eq!(steps, [Step::Init, Step::Validate, Step::Plan, Step::Apply]);
        assert_eq!(calls[3].action, Some(Action::Destroy));
        assert!(calls[3].dry_run);
        assert_eq!(calls[0].dir, dir);
    }

    #[test]
    fn clones_share_the_log() {
        let mock = MockDriver::new();
        let handle = mock.clone();
        mock.init(Path::new("/tmp"), false).unwrap();
        assert_eq!(handle.count(Step::Init), 1);
    }

    #[test]
    fn plan_status_is_configurable() {
        let mock = MockDriver::new().with_plan_status(PlanStatus::ChangesPending);
        let dir = Path::new("/tmp");
        assert_eq!(
            mock.plan(dir, Action::Apply, false).unwrap(),
            PlanStatus::ChangesPending
        );
        assert_eq!(
            mock.plan(dir, Action::Apply, true).unwrap(),
            PlanStatus::NoChanges
        );
    }

    #[test]
    fn failing_step_errors_only_for_real_runs() {
        let mock = MockDriver::new().failing_at(Step::Validate);
        let dir = Path::new("/tmp");
        assert!(mock.validate(dir, true).is_ok());
        let err = mock.validate(dir, false).unwrap_err();
        assert!(matches!(err, DriverError::StepFailed { step: Step::Validate, .. }));
        assert_eq!(mock.count(Step::Validate), 2);
    }

    #[test]
    fn hook_runs_after_each_call() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let mock = MockDriver::new().with_step_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        mock.init(Path::new("/tmp"), false).unwrap();
        mock.validate(Path::new("/tmp"), false).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn step_names_parse() {
        assert_eq!(parse_step("apply"), Some(Step::Apply));
        assert_eq!(parse_step("bogus"), None);
    }
}
