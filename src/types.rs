//! Core data types for chains and chain runs
//!
//! A chain is a named, ordered list of (command, params) steps. Both fields are
//! opaque strings here; interpreting them is the command registry's job.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum::{Display, EnumString};

/// One chain entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    /// Opaque command identifier (e.g. "Normalize")
    pub command: String,
    /// Command-specific serialized parameters, possibly empty
    #[serde(default)]
    pub params: String,
}

impl Step {
    pub fn new(command: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            params: params.into(),
        }
    }
}

/// A named, ordered sequence of steps.
///
/// Step order is application order. The implicit "- END -" row shown to users
/// is not part of `steps`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chain {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Chain {
    /// Create an empty chain
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Create a chain from existing steps
    pub fn with_steps(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// What a run is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum TargetKind {
    #[strum(serialize = "project")]
    SingleWorkspace,
    #[strum(serialize = "files")]
    FileBatch,
}

/// Run target with its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The already-open workspace
    SingleWorkspace,
    /// Files imported one at a time, in the given order
    FileBatch(Vec<PathBuf>),
}

impl Target {
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::SingleWorkspace => TargetKind::SingleWorkspace,
            Self::FileBatch(_) => TargetKind::FileBatch,
        }
    }
}

/// One user-initiated run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub chain: String,
    pub target: Target,
}

impl ExecutionRequest {
    /// Apply `chain` to the current workspace
    pub fn workspace(chain: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            target: Target::SingleWorkspace,
        }
    }

    /// Apply `chain` to each file in order.
    ///
    /// The runner does not re-sort; callers that want lexicographic order sort
    /// before submitting.
    pub fn batch(chain: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            chain: chain.into(),
            target: Target::FileBatch(files),
        }
    }
}

/// Result for a single target (the workspace, or one batch file)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    Failed(ChainError),
    Aborted,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Per-file entry of a batch report; `outcome` is `None` for files the run
/// never reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: Option<ExecutionOutcome>,
}

impl FileReport {
    pub fn was_attempted(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Overall result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed(ChainError),
    Aborted,
}

/// Everything the caller learns about a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub chain: String,
    pub target: TargetKind,
    pub outcome: RunOutcome,
    /// One entry per requested file (empty for workspace runs)
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    /// Outcomes of the files that were attempted, in processing order
    pub fn attempted(&self) -> impl Iterator<Item = (&PathBuf, &ExecutionOutcome)> {
        self.files
            .iter()
            .filter_map(|f| f.outcome.as_ref().map(|o| (&f.path, o)))
    }

    /// Human-readable multi-line summary
    pub fn summary(&self) -> String {
        let status = match &self.outcome {
            RunOutcome::Completed => "completed".to_string(),
            RunOutcome::Failed(err) => format!("failed: {}", err),
            RunOutcome::Aborted => "aborted".to_string(),
        };
        let mut lines = vec![format!("Chain '{}' on {}: {}", self.chain, self.target, status)];
        for file in &self.files {
            let state = match &file.outcome {
                Some(ExecutionOutcome::Success) => "ok".to_string(),
                Some(ExecutionOutcome::Failed(err)) => format!("failed ({})", err),
                Some(ExecutionOutcome::Aborted) => "aborted".to_string(),
                None => "not attempted".to_string(),
            };
            lines.push(format!("  {} - {}", file.path.display(), state));
        }
        lines.join("\n")
    }
}
