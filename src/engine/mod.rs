//! Engine modules: the run state machine and the chain runner.
//!
//! The engine sits between the chain store (what to apply) and the external
//! capabilities (what it is applied to).

pub mod guard;
pub mod run_state;
pub mod runner;

pub use run_state::{RunStage, RunTracker, RunTransitionError};
pub use runner::{ChainRunner, RunEnv};
