use crate::collect::{check_containment, collect_params, ParamOverrides};
use crate::config::Config;
use crate::lifecycle::{validate_transition, EnvState};
use crate::prompt::Prompter;
use crate::signal::CancelToken;
use crate::CoreError;
use infrabox_runtime::{
    select_driver, Action, DriverError, PlanStatus, ProvisioningDriver, TemplateRenderer,
};
use infrabox_schema::{Artifact, EnvName, EnvParams, EnvRecord, ParamDefaults};
use infrabox_store::{
    check_overlap, find_conflicts, read_declaration, Declaration, EnvLayout, EnvStore,
    OverlapError, Rollback, RollbackStep,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Central orchestration engine for the environment lifecycle.
///
/// Owns the environment store and the two external collaborators, the
/// template renderer and the provisioning driver, both injected at
/// construction.
pub struct Engine {
    store: EnvStore,
    renderer: TemplateRenderer,
    driver: Box<dyn ProvisioningDriver>,
    defaults: ParamDefaults,
    cancel: CancelToken,
}

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub dry_run: bool,
    pub overrides: ParamOverrides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStatus {
    Created,
    DryRun,
    /// The directory already existed; nothing was touched.
    AlreadyInitialized,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedArtifact {
    pub artifact: Artifact,
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub environment: EnvName,
    pub path: PathBuf,
    pub status: InitStatus,
    pub params: Option<EnvParams>,
    pub rendered: Vec<RenderedArtifact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    NoChanges,
    /// The plan reported an error; nothing was applied.
    PlanFailed,
    Declined,
    Applied,
    DryRun,
}

/// The planning half of `create`/`destroy`: init, validate and plan have
/// run, nothing has been applied yet.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub environment: String,
    pub path: PathBuf,
    pub action: Action,
    pub dry_run: bool,
    pub status: PlanStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub environment: String,
    pub path: PathBuf,
    pub action: Action,
    pub dry_run: bool,
    pub plan: PlanStatus,
    pub outcome: ApplyOutcome,
    pub state: EnvState,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvSummary {
    pub name: String,
    pub path: PathBuf,
    pub declaration: Option<Declaration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvDetails {
    pub name: String,
    pub path: PathBuf,
    pub state: EnvState,
    pub record: Option<EnvRecord>,
    pub declaration: Option<Declaration>,
    pub files: Vec<String>,
}

impl Engine {
    pub fn new(
        layout: EnvLayout,
        renderer: TemplateRenderer,
        driver: Box<dyn ProvisioningDriver>,
    ) -> Self {
        Self {
            store: EnvStore::new(layout),
            renderer,
            driver,
            defaults: ParamDefaults::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Build the engine a configuration describes.
    pub fn from_config(config: &Config) -> Result<Self, CoreError> {
        let driver = select_driver(&config.driver, &config.terraform_bin)?;
        let renderer = TemplateRenderer::new(config.templates_dir.as_deref())?;
        debug!(
            "engine: environments={} driver={} templates={:?}",
            config.environments_dir.display(),
            driver.name(),
            renderer.source()
        );
        Ok(Self::new(EnvLayout::new(&config.environments_dir), renderer, driver)
            .with_defaults(config.defaults.clone()))
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: ParamDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn store(&self) -> &EnvStore {
        &self.store
    }

    pub fn driver(&self) -> &dyn ProvisioningDriver {
        self.driver.as_ref()
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn defaults(&self) -> &ParamDefaults {
        &self.defaults
    }

    /// Scaffold a new environment.
    ///
    /// An existing directory is left untouched and reported as
    /// `AlreadyInitialized`. Any failure or interrupt after the directory was
    /// created removes it again before the error is returned.
    pub fn initialize(
        &self,
        raw_name: &str,
        prompter: &dyn Prompter,
        options: &InitOptions,
    ) -> Result<InitReport, CoreError> {
        let name = EnvName::sanitize(raw_name)?;
        let path = self.store.layout().env_path(&name);

        let state = self.current_state(&name);
        if validate_transition(state, EnvState::Initialized).is_err() {
            info!("environment '{name}' already exists at {}", path.display());
            return Ok(InitReport {
                environment: name,
                path,
                status: InitStatus::AlreadyInitialized,
                params: None,
                rendered: Vec::new(),
            });
        }
        info!("initializing environment '{name}' (dry_run={})", options.dry_run);

        let params = collect_params(&name, &self.defaults, &options.overrides, prompter)?;
        self.cancel.check()?;
        self.check_peers(&name, &params)?;
        check_containment(&params)?;
        let rendered = self.render_all(&name, &params)?;

        if options.dry_run {
            self.interruptible(self.driver.init(&path, true))?;
            self.interruptible(self.driver.validate(&path, true))?;
            return Ok(InitReport {
                environment: name,
                path,
                status: InitStatus::DryRun,
                params: Some(params),
                rendered,
            });
        }

        // A repeated Ctrl-C must not exit before the rollback has run.
        let _guard = self.cancel.guard();
        let mut rollback = Rollback::new();
        match self.materialize(&name, &params, &rendered, &mut rollback) {
            Ok(()) => {
                rollback.disarm();
                info!("environment '{name}' initialized at {}", path.display());
                Ok(InitReport {
                    environment: name,
                    path,
                    status: InitStatus::Created,
                    params: Some(params),
                    rendered,
                })
            }
            Err(e) => {
                warn!("initialization of '{name}' failed, rolling back: {e}");
                rollback.execute();
                Err(e)
            }
        }
    }

    /// Run the overlap guard for both blocks against every other environment.
    fn check_peers(&self, name: &EnvName, params: &EnvParams) -> Result<(), CoreError> {
        let peers: Vec<(String, PathBuf)> = self
            .store
            .list()?
            .into_iter()
            .map(|e| (e.name, e.path))
            .collect();
        for block in [params.vnet_address_space, params.subnet_address_space] {
            check_overlap(
                &block,
                name,
                peers.iter().map(|(n, p)| (n.as_str(), p.as_path())),
            )?;
        }
        Ok(())
    }

    fn render_all(
        &self,
        name: &EnvName,
        params: &EnvParams,
    ) -> Result<Vec<RenderedArtifact>, CoreError> {
        let context = params.context();
        Artifact::ALL
            .into_iter()
            .map(|artifact| -> Result<RenderedArtifact, CoreError> {
                Ok(RenderedArtifact {
                    artifact,
                    path: self.store.layout().artifact_path(name, artifact),
                    content: self.renderer.render(artifact, &context)?,
                })
            })
            .collect()
    }

    fn materialize(
        &self,
        name: &EnvName,
        params: &EnvParams,
        rendered: &[RenderedArtifact],
        rollback: &mut Rollback,
    ) -> Result<(), CoreError> {
        let dir = self.store.create_dir(name)?;
        rollback.push(RollbackStep::RemoveDir(dir.clone()));
        self.cancel.check()?;

        for r in rendered {
            self.store.write_artifact(name, r.artifact, &r.content)?;
            self.cancel.check()?;
        }
        self.store.write_record(&EnvRecord::new(params.clone()))?;
        self.cancel.check()?;

        self.interruptible(self.driver.init(&dir, false))?;
        self.cancel.check()?;
        self.interruptible(self.driver.validate(&dir, false))?;
        self.cancel.check()?;
        Ok(())
    }

    /// Ctrl-C reaches the provisioning tool as well, so a step that fails
    /// after an interrupt is reported as the interrupt.
    fn interruptible<T>(&self, result: Result<T, DriverError>) -> Result<T, CoreError> {
        match result {
            Err(_) if self.cancel.is_cancelled() => Err(CoreError::Interrupted),
            other => other.map_err(CoreError::from),
        }
    }

    /// Only the presence of the directory is observable. A name that is
    /// not in sanitized form never names an environment.
    fn current_state(&self, name: &str) -> EnvState {
        let sanitized = EnvName::sanitize(name).is_ok_and(|n| n == name);
        if sanitized && self.store.exists(name) {
            EnvState::Initialized
        } else {
            EnvState::Uninitialized
        }
    }

    pub fn create(
        &self,
        name: &str,
        prompter: &dyn Prompter,
        dry_run: bool,
    ) -> Result<ApplyReport, CoreError> {
        let planned = self.plan(name, Action::Apply, dry_run)?;
        self.apply_plan(&planned, prompter)
    }

    pub fn destroy(
        &self,
        name: &str,
        prompter: &dyn Prompter,
        dry_run: bool,
    ) -> Result<ApplyReport, CoreError> {
        let planned = self.plan(name, Action::Destroy, dry_run)?;
        self.apply_plan(&planned, prompter)
    }

    /// init, validate and plan an existing environment for `action`.
    pub fn plan(
        &self,
        name: &str,
        action: Action,
        dry_run: bool,
    ) -> Result<PlanReport, CoreError> {
        let path = self.resolve(name, target_state(action))?;
        info!("{action} environment '{name}' (dry_run={dry_run})");

        self.interruptible(self.driver.init(&path, dry_run))?;
        self.cancel.check()?;
        self.interruptible(self.driver.validate(&path, dry_run))?;
        self.cancel.check()?;
        let status = self.interruptible(self.driver.plan(&path, action, dry_run))?;
        self.cancel.check()?;

        Ok(PlanReport {
            environment: name.to_owned(),
            path,
            action,
            dry_run,
            status,
        })
    }

    /// Apply what `plan` found: only pending changes are applied, and only
    /// after `prompter` confirms. A dry-run plan describes the apply instead.
    pub fn apply_plan(
        &self,
        planned: &PlanReport,
        prompter: &dyn Prompter,
    ) -> Result<ApplyReport, CoreError> {
        let PlanReport {
            environment: name,
            path,
            action,
            dry_run,
            status,
        } = planned;
        let (action, dry_run, plan) = (*action, *dry_run, *status);

        let outcome = if dry_run {
            self.interruptible(self.driver.apply(path, action, true))?;
            ApplyOutcome::DryRun
        } else {
            match plan {
                PlanStatus::NoChanges => ApplyOutcome::NoChanges,
                PlanStatus::Failed => {
                    warn!("plan for '{name}' failed; not applying");
                    ApplyOutcome::PlanFailed
                }
                PlanStatus::ChangesPending => {
                    let question = format!("Proceed with {action} of environment '{name}'?");
                    if prompter.confirm(&question, false)? {
                        self.cancel.check()?;
                        self.interruptible(self.driver.apply(path, action, false))?;
                        ApplyOutcome::Applied
                    } else {
                        info!("{action} of '{name}' declined");
                        ApplyOutcome::Declined
                    }
                }
            }
        };

        Ok(ApplyReport {
            environment: name.clone(),
            path: path.clone(),
            action,
            dry_run,
            plan,
            outcome,
            state: if outcome == ApplyOutcome::Applied {
                target_state(action)
            } else {
                EnvState::Initialized
            },
        })
    }

    /// Directory of an environment that can move to `to`. `name` must
    /// already be in sanitized form.
    fn resolve(&self, name: &str, to: EnvState) -> Result<PathBuf, CoreError> {
        validate_transition(self.current_state(name), to)
            .map_err(|_| CoreError::EnvNotFound(name.to_owned()))?;
        Ok(self.store.layout().env_path(name))
    }

    pub fn list(&self) -> Result<Vec<EnvSummary>, CoreError> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .map(|e| EnvSummary {
                declaration: read_declaration(&e.path),
                name: e.name,
                path: e.path,
            })
            .collect())
    }

    pub fn inspect(&self, name: &str) -> Result<EnvDetails, CoreError> {
        let path = self.resolve(name, EnvState::Applied)?;
        let record = self.store.read_record(name)?;
        let mut files: Vec<String> = std::fs::read_dir(&path)?
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|e| e.file_name().to_str().map(str::to_owned))
            .collect();
        files.sort();
        Ok(EnvDetails {
            name: name.to_owned(),
            declaration: read_declaration(&path),
            path,
            state: self.current_state(name),
            record,
            files,
        })
    }

    /// Every overlapping pair among the environments already on disk.
    pub fn overlap_audit(&self) -> Result<Vec<OverlapError>, CoreError> {
        let declared: Vec<(String, Declaration)> = self
            .list()?
            .into_iter()
            .filter_map(|s| s.declaration.map(|d| (s.name, d)))
            .collect();
        Ok(find_conflicts(&declared))
    }

    pub fn environments_root(&self) -> &Path {
        self.store.layout().root()
    }
}

fn target_state(action: Action) -> EnvState {
    match action {
        Action::Apply => EnvState::Applied,
        Action::Destroy => EnvState::Destroyed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::DefaultsPrompter;
    use infrabox_runtime::MockDriver;

    fn engine(root: &Path) -> (Engine, MockDriver) {
        let mock = MockDriver::new();
        let engine = Engine::new(
            EnvLayout::new(root.join("environments")),
            TemplateRenderer::builtin().unwrap(),
            Box::new(mock.clone()),
        );
        (engine, mock)
    }

    #[test]
    fn resolve_rejects_unsanitized_names() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _) = engine(dir.path());
        std::fs::create_dir_all(dir.path().join("environments/dev")).unwrap();
        assert!(engine.resolve("dev", EnvState::Applied).is_ok());
        assert!(matches!(
            engine.resolve("../environments/dev", EnvState::Applied),
            Err(CoreError::EnvNotFound(_))
        ));
    }

    #[test]
    fn state_follows_directory_presence() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _) = engine(dir.path());
        assert_eq!(engine.current_state("dev"), EnvState::Uninitialized);
        assert!(matches!(
            engine.resolve("dev", EnvState::Destroyed),
            Err(CoreError::EnvNotFound(_))
        ));
        std::fs::create_dir_all(dir.path().join("environments/dev")).unwrap();
        assert_eq!(engine.current_state("dev"), EnvState::Initialized);
        assert_eq!(engine.current_state("Dev"), EnvState::Uninitialized);
        assert!(engine.resolve("dev", EnvState::Destroyed).is_ok());
        let report = engine
            .initialize("dev", &DefaultsPrompter, &InitOptions::default())
            .unwrap();
        assert_eq!(report.status, InitStatus::AlreadyInitialized);
    }

    #[test]
    fn driver_failure_after_interrupt_is_an_interrupt() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _) = engine(dir.path());
        let failure = || {
            Err::<(), _>(DriverError::StepFailed {
                step: infrabox_runtime::Step::Plan,
                command: "terraform plan".into(),
                code: 130,
            })
        };
        assert!(matches!(engine.interruptible(failure()), Err(CoreError::Driver(_))));
        engine.cancel.cancel();
        assert!(matches!(engine.interruptible(failure()), Err(CoreError::Interrupted)));
    }

    #[test]
    fn from_config_uses_mock_driver() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            driver: "mock".into(),
            ..Config::default()
        }
        .resolved(dir.path());
        let engine = Engine::from_config(&config).unwrap();
        assert_eq!(engine.driver().name(), "mock");
        assert_eq!(engine.environments_root(), dir.path().join("environments"));
    }

    #[test]
    fn from_config_rejects_unknown_driver() {
        let config = Config {
            driver: "ansible".into(),
            ..Config::default()
        };
        assert!(matches!(
            Engine::from_config(&config),
            Err(CoreError::Driver(_))
        ));
    }

    #[test]
    fn list_reports_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _) = engine(dir.path());
        engine
            .initialize("dev", &DefaultsPrompter, &InitOptions::default())
            .unwrap();
        let envs = engine.list().unwrap();
        assert_eq!(envs.len(), 1);
        let decl = envs[0].declaration.as_ref().unwrap();
        assert_eq!(decl.network[0].to_string(), "10.0.0.0/16");
    }

    #[test]
    fn inspect_lists_generated_files() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _) = engine(dir.path());
        engine
            .initialize("dev", &DefaultsPrompter, &InitOptions::default())
            .unwrap();
        let details = engine.inspect("dev").unwrap();
        assert_eq!(
            details.files,
            ["environment.toml", "main.tf", "outputs.tf", "provider.tf", "variables.tf"]
        );
        assert_eq!(details.record.unwrap().params.location, "westeurope");
    }
}
