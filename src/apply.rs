//! Plan execution
//!
//! Runs an `InstallationPlan` action by action, strictly sequentially:
//! later actions depend on the filesystem state left by earlier ones. The
//! first failing install stops the run; there is no rollback, so partial
//! application is a possible end state and is reported as such. Callers
//! re-probe afterwards for the new ground truth - the applier never updates
//! a snapshot itself.

use std::path::Path;
use std::sync::Arc;

use crate::logging::log_install;
use crate::package::{self, InstallError};
use crate::planner::{Action, InstallationPlan};
use crate::uninstall::clear_component;

// ============================================================================
// Task Context
// ============================================================================

/// Callback bundle for surfacing per-step progress to the caller.
///
/// All callbacks fire synchronously on the applying thread; callers needing
/// a responsive front end run `apply` on a worker and marshal these back.
#[derive(Clone)]
pub struct TaskContext {
    pub status_callback: Arc<dyn Fn(String) + Send + Sync>,
    /// Cumulative downloaded bytes and the total when the server reports one.
    pub progress_callback: Arc<dyn Fn(u64, Option<u64>) + Send + Sync>,
}

impl TaskContext {
    pub fn new(
        status: impl Fn(String) + Send + Sync + 'static,
        progress: impl Fn(u64, Option<u64>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            status_callback: Arc::new(status),
            progress_callback: Arc::new(progress),
        }
    }

    /// Context that swallows all callbacks.
    pub fn silent() -> Self {
        Self::new(|_| {}, |_, _| {})
    }

    pub fn set_status(&self, msg: String) {
        (self.status_callback)(msg);
    }
}

// ============================================================================
// Applier
// ============================================================================

/// Execute a plan against the game directory.
///
/// Uninstall steps are best-effort (failures inside them are logged and the
/// eventual state is observed by re-probing); a failing install step stops
/// the run and is wrapped with the action and its position in the plan.
pub fn apply(
    plan: &InstallationPlan,
    game_dir: &Path,
    ctx: &TaskContext,
) -> Result<(), InstallError> {
    log_install(&format!(
        "Applying plan with {} action(s) to {:?}",
        plan.len(),
        game_dir
    ));

    for (position, action) in plan.actions().iter().enumerate() {
        ctx.set_status(format!(
            "[{}/{}] {}",
            position + 1,
            plan.len(),
            action
        ));

        match action {
            Action::Uninstall(component) => {
                clear_component(game_dir, *component);
            }
            Action::Install(descriptor) => {
                let progress = ctx.progress_callback.clone();
                package::install(descriptor, game_dir, &mut |done, total| {
                    progress(done, total)
                })
                .map_err(|e| InstallError::Step {
                    position,
                    action: action.to_string(),
                    reason: e.to_string(),
                })?;
            }
        }
    }

    log_install("Plan applied successfully");
    Ok(())
}
