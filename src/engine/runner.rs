//! Chain execution.
//!
//! [`ChainRunner`] applies a stored chain either to the open workspace or to a
//! list of files imported one at a time into that same workspace.
//!
//! # Batch ordering
//!
//! For every file, in the order given:
//!
//! 1. stop if the user cancelled or closed the progress window
//! 2. advance the progress highlight
//! 3. import, select all, apply the chain
//! 4. stop if the user cancelled or closed the progress window
//! 5. clear history and remove all content
//!
//! The first failure ends the batch. After the loop the workspace is reset
//! once more, so it is empty whatever the outcome.

use crate::capabilities::{ChainApplier, ProgressSink, Settings, UserPrompt, Workspace};
use crate::engine::guard::guarded;
use crate::engine::run_state::{RunStage, RunTracker};
use crate::error::{ChainError, Result};
use crate::settings::ACTIVE_CHAIN_KEY;
use crate::store::ChainStore;
use crate::types::{
    Chain, ExecutionOutcome, ExecutionRequest, FileReport, RunOutcome, RunReport, Target,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Capabilities a run is executed against.
pub struct RunEnv<'a> {
    pub workspace: &'a mut dyn Workspace,
    pub applier: &'a mut dyn ChainApplier,
    pub progress: &'a mut dyn ProgressSink,
    pub prompt: &'a mut dyn UserPrompt,
    pub settings: &'a mut dyn Settings,
}

/// Executes requests against chains in a store.
#[derive(Debug)]
pub struct ChainRunner<'s> {
    store: &'s ChainStore,
    tracker: RunTracker,
}

impl<'s> ChainRunner<'s> {
    pub fn new(store: &'s ChainStore) -> Self {
        Self {
            store,
            tracker: RunTracker::new(),
        }
    }

    /// Stage reached by the most recent run.
    pub fn stage(&self) -> RunStage {
        self.tracker.current_stage()
    }

    /// Stages entered by the most recent run.
    pub fn history(&self) -> &[(RunStage, u64)] {
        self.tracker.history()
    }

    /// Execute one request.
    ///
    /// Never returns an error: lookup, import and step failures as well as
    /// cancellation all end up in the report.
    pub fn run(&mut self, request: &ExecutionRequest, env: &mut RunEnv<'_>) -> RunReport {
        self.tracker.reset();
        info!("Run requested: chain '{}' on {}", request.chain, request.target.kind());

        self.step_to(RunStage::Preparing);

        let mut files: Vec<FileReport> = match &request.target {
            Target::SingleWorkspace => Vec::new(),
            Target::FileBatch(paths) => paths
                .iter()
                .map(|path| FileReport {
                    path: path.clone(),
                    outcome: None,
                })
                .collect(),
        };

        let chain = match self.prepare(request, env) {
            Ok(chain) => chain,
            Err(e) => {
                warn!("Run of '{}' not started: {}", request.chain, e);
                if e.is_user_facing() {
                    env.prompt.notify_error(&e.to_string());
                }
                self.finish_stage(&RunOutcome::Failed(e.clone()));
                return RunReport {
                    chain: request.chain.clone(),
                    target: request.target.kind(),
                    outcome: RunOutcome::Failed(e),
                    files,
                };
            }
        };

        remember_active_chain(env.settings, &chain.name);
        self.step_to(RunStage::Running);
        let outcome = match &request.target {
            Target::SingleWorkspace => run_single(&chain, env),
            Target::FileBatch(paths) => run_batch(&chain, paths, &mut files, env),
        };
        self.finish_stage(&outcome);

        info!("Run of '{}' ended: {}", chain.name, self.stage());
        RunReport {
            chain: chain.name,
            target: request.target.kind(),
            outcome,
            files,
        }
    }

    /// Resolve the chain and check the target. No side effects.
    fn prepare(&self, request: &ExecutionRequest, env: &RunEnv<'_>) -> Result<Chain> {
        let chain = self.store.load(&request.chain)?;
        if let Target::FileBatch(_) = request.target {
            if !env.workspace.is_empty() {
                return Err(ChainError::WorkspaceNotEmpty);
            }
        }
        debug!("Prepared '{}' with {} steps", chain.name, chain.len());
        Ok(chain)
    }

    fn step_to(&mut self, stage: RunStage) {
        if let Err(e) = self.tracker.transition_to(stage) {
            warn!("Unexpected run stage change: {}", e);
        }
    }

    fn finish_stage(&mut self, outcome: &RunOutcome) {
        let result = match outcome {
            RunOutcome::Completed => self.tracker.transition_to(RunStage::Completed).map(|_| ()),
            RunOutcome::Failed(_) => self.tracker.fail(),
            RunOutcome::Aborted => self.tracker.abort(),
        };
        if let Err(e) = result {
            warn!("Unexpected run stage change: {}", e);
        }
    }
}

fn remember_active_chain(settings: &mut dyn Settings, name: &str) {
    settings.write_string(ACTIVE_CHAIN_KEY, name);
    if let Err(e) = settings.flush() {
        warn!("Failed to persist active chain '{}': {:#}", name, e);
    }
}

fn run_single(chain: &Chain, env: &mut RunEnv<'_>) -> RunOutcome {
    env.progress
        .show_run(&format!("Applying '{}' to current project", chain.name));
    let outcome = match apply(chain, env) {
        Ok(()) => RunOutcome::Completed,
        Err(e) => {
            warn!("{}", e);
            RunOutcome::Failed(e)
        }
    };
    env.progress.finish();
    outcome
}

fn run_batch(
    chain: &Chain,
    paths: &[PathBuf],
    reports: &mut [FileReport],
    env: &mut RunEnv<'_>,
) -> RunOutcome {
    let total = paths.len();
    env.progress.show_run(&format!(
        "Applying '{}' to {} file(s)",
        chain.name, total
    ));
    env.progress.show_files(paths);

    let mut outcome = RunOutcome::Completed;
    for (index, path) in paths.iter().enumerate() {
        if user_stopped(env.progress) {
            info!("Batch stopped by user before {}", path.display());
            outcome = RunOutcome::Aborted;
            break;
        }
        env.progress.advance(index, total);

        let file_outcome = process_file(chain, path, env);
        info!("{} [{}/{}]: {:?}", path.display(), index + 1, total, file_outcome);
        reports[index].outcome = Some(file_outcome.clone());

        match file_outcome {
            ExecutionOutcome::Success => reset_workspace(env.workspace),
            ExecutionOutcome::Failed(e) => {
                outcome = RunOutcome::Failed(e);
                break;
            }
            ExecutionOutcome::Aborted => {
                outcome = RunOutcome::Aborted;
                break;
            }
        }
    }

    reset_workspace(env.workspace);
    env.progress.finish();
    outcome
}

fn process_file(chain: &Chain, path: &Path, env: &mut RunEnv<'_>) -> ExecutionOutcome {
    if let Err(reason) = guarded(|| env.workspace.import_file(path)) {
        let e = ChainError::import(path, reason);
        warn!("{}", e);
        return ExecutionOutcome::Failed(e);
    }
    env.workspace.select_all();

    if let Err(e) = apply(chain, env) {
        warn!("{}", e);
        return ExecutionOutcome::Failed(e);
    }
    if user_stopped(env.progress) {
        return ExecutionOutcome::Aborted;
    }
    ExecutionOutcome::Success
}

/// Apply the whole chain once. An empty chain is a no-op success.
fn apply(chain: &Chain, env: &mut RunEnv<'_>) -> Result<()> {
    if chain.is_empty() {
        debug!("Chain '{}' has no steps", chain.name);
        return Ok(());
    }
    match guarded(|| env.applier.apply_chain(chain, &mut *env.workspace)) {
        Ok(true) => Ok(()),
        Ok(false) => Err(ChainError::apply_failed(
            &chain.name,
            "a step reported failure",
        )),
        Err(reason) => Err(ChainError::apply_failed(&chain.name, reason)),
    }
}

fn user_stopped(progress: &dyn ProgressSink) -> bool {
    progress.is_cancelled() || !progress.is_still_visible()
}

fn reset_workspace(workspace: &mut dyn Workspace) {
    workspace.clear_history();
    workspace.select_all();
    workspace.remove_all_content();
}
