use crate::CoreError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    guards: AtomicUsize,
}

/// Cooperative cancellation flag, checked by the engine after every
/// side-effecting step.
///
/// While a [`CancelGuard`] is alive the process must not exit on a repeated
/// interrupt: the engine holds one from the first write of a new
/// environment until its rollback has finished.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<CancelState>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(CoreError::Interrupted)` once cancelled.
    pub fn check(&self) -> Result<(), CoreError> {
        if self.is_cancelled() {
            Err(CoreError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Defer forced exits until the returned guard is dropped.
    #[must_use]
    pub fn guard(&self) -> CancelGuard {
        self.0.guards.fetch_add(1, Ordering::SeqCst);
        CancelGuard(self.clone())
    }

    pub fn is_guarded(&self) -> bool {
        self.0.guards.load(Ordering::SeqCst) > 0
    }
}

#[derive(Debug)]
pub struct CancelGuard(CancelToken);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        (self.0).0.guards.fetch_sub(1, Ordering::SeqCst);
    }
}

/// What the process does about one Ctrl-C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptResponse {
    /// First interrupt: the token is now cancelled.
    Stop,
    /// Repeated interrupt while cleanup is still running.
    Wait,
    /// Repeated interrupt with nothing left to clean up.
    Exit,
}

pub fn on_interrupt(token: &CancelToken) -> InterruptResponse {
    if !token.is_cancelled() {
        token.cancel();
        InterruptResponse::Stop
    } else if token.is_guarded() {
        InterruptResponse::Wait
    } else {
        InterruptResponse::Exit
    }
}

/// Route Ctrl-C into `token`. A second interrupt exits immediately unless
/// a rollback is still in progress.
pub fn install_signal_handler(token: &CancelToken) {
    let token = token.clone();
    let _ = ctrlc::set_handler(move || match on_interrupt(&token) {
        InterruptResponse::Stop => {
            eprintln!("\ninterrupt received, stopping after the current step...");
        }
        InterruptResponse::Wait => {
            eprintln!("\nrolling back, please wait...");
        }
        InterruptResponse::Exit => std::process::exit(130),
    });
}
