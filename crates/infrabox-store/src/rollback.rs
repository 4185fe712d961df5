use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One undo action recorded while an environment is being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackStep {
    RemoveDir(PathBuf),
    RemoveFile(PathBuf),
}

impl RollbackStep {
    fn run(&self) -> std::io::Result<()> {
        let result = match self {
            RollbackStep::RemoveDir(path) => fs::remove_dir_all(path),
            RollbackStep::RemoveFile(path) => fs::remove_file(path),
        };
        match result {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Undo log for a multi-step operation.
///
/// Steps are pushed as side effects happen and executed newest-first if the
/// operation fails. A successful operation calls [`Rollback::disarm`].
#[derive(Debug, Default)]
pub struct Rollback {
    steps: Vec<RollbackStep>,
}

impl Rollback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: RollbackStep) {
        debug!("rollback: registered {step:?}");
        self.steps.push(step);
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Forget every registered step.
    pub fn disarm(&mut self) {
        self.steps.clear();
    }

    /// Run every step in reverse order. Failures are logged and do not stop
    /// the remaining steps. Returns the number of steps that succeeded.
    pub fn execute(&mut self) -> usize {
        let mut done = 0;
        while let Some(step) = self.steps.pop() {
            match step.run() {
                Ok(()) => {
                    warn!("rolled back: {}", describe(&step));
                    done += 1;
                }
                Err(e) => warn!("rollback step failed ({}): {e}", describe(&step)),
            }
        }
        done
    }
}

fn describe(step: &RollbackStep) -> String {
    match step {
        RollbackStep::RemoveDir(p) => format!("removed directory {}", p.display()),
        RollbackStep::RemoveFile(p) => format!("removed file {}", p.display()),
    }
}
