//! Run State Machine
//!
//! Tracks one execution request through its stages and rejects transitions
//! that would skip or revisit a stage.
//!
//! # Stage Flow
//!
//! ```text
//! Idle
//!   ↓
//! Preparing   (chain lookup, target checks; no side effects yet)
//!   ↓
//! Running     (workspace or file batch)
//!   ↓
//! Completed
//!
//! (Preparing and Running can also end in Failed or Aborted)
//! ```

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

/// Stages of a single run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RunStage {
    /// No run in progress
    Idle = 0,

    /// Resolving the chain and checking the target
    Preparing = 1,

    /// Applying the chain
    Running = 2,

    /// Every target succeeded (terminal state)
    Completed = 3,

    /// A lookup, import or step failed (terminal state)
    Failed = 254,

    /// The user cancelled or closed the progress window (terminal state)
    Aborted = 255,
}

impl RunStage {
    #[inline]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Returns true for Completed, Failed and Aborted
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }

    /// Next stage on the success path, or None at a terminal state
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Preparing),
            Self::Preparing => Some(Self::Running),
            Self::Running => Some(Self::Completed),
            Self::Completed | Self::Failed | Self::Aborted => None,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Preparing => "Preparing",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Aborted => "Aborted",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during stage transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunTransitionError {
    #[error("Cannot skip from {from} to {to}")]
    SkippedStage { from: RunStage, to: RunStage },

    #[error("Cannot leave terminal stage {from}")]
    FromTerminalState { from: RunStage },

    #[error("Run has not started (stage {stage})")]
    NotStarted { stage: RunStage },

    #[error("Already at stage {stage}")]
    AlreadyAtStage { stage: RunStage },
}

/// Stage tracker for one run.
#[derive(Debug, Clone)]
pub struct RunTracker {
    current: RunStage,

    /// Entered stages with unix timestamps
    history: Vec<(RunStage, u64)>,
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RunTracker {
    pub fn new() -> Self {
        Self {
            current: RunStage::Idle,
            history: Vec::with_capacity(4),
        }
    }

    #[inline]
    pub fn current_stage(&self) -> RunStage {
        self.current
    }

    pub fn history(&self) -> &[(RunStage, u64)] {
        &self.history
    }

    /// Move to the next stage on the success path.
    pub fn advance(&mut self) -> Result<RunStage, RunTransitionError> {
        let next = self
            .current
            .next()
            .ok_or(RunTransitionError::FromTerminalState { from: self.current })?;
        self.enter(next);
        Ok(next)
    }

    /// Move to `target`, which must be the immediate next stage.
    pub fn transition_to(&mut self, target: RunStage) -> Result<RunStage, RunTransitionError> {
        if self.current.is_terminal() {
            return Err(RunTransitionError::FromTerminalState { from: self.current });
        }
        if target == self.current {
            return Err(RunTransitionError::AlreadyAtStage { stage: target });
        }
        if self.current.next() != Some(target) {
            return Err(RunTransitionError::SkippedStage {
                from: self.current,
                to: target,
            });
        }
        self.enter(target);
        Ok(target)
    }

    /// End the run as Failed.
    pub fn fail(&mut self) -> Result<(), RunTransitionError> {
        self.end(RunStage::Failed)
    }

    /// End the run as Aborted.
    pub fn abort(&mut self) -> Result<(), RunTransitionError> {
        self.end(RunStage::Aborted)
    }

    fn end(&mut self, stage: RunStage) -> Result<(), RunTransitionError> {
        if self.current.is_terminal() {
            return Err(RunTransitionError::FromTerminalState { from: self.current });
        }
        if self.current == RunStage::Idle {
            return Err(RunTransitionError::NotStarted {
                stage: self.current,
            });
        }
        self.enter(stage);
        Ok(())
    }

    /// Return to Idle for the next request.
    pub fn reset(&mut self) {
        self.current = RunStage::Idle;
        self.history.clear();
    }

    fn enter(&mut self, stage: RunStage) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        debug!("Run stage {} -> {}", self.current, stage);
        self.history.push((stage, timestamp));
        self.current = stage;
    }
}
