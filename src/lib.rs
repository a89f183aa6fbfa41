//! batchchain Library
//!
//! Named chains of editing commands: persistent storage, an editor with an
//! unsaved-changes protocol, and a runner that applies a chain to the open
//! workspace or to a batch of files.

pub mod capabilities;
pub mod cli;
pub mod config;
pub mod console;
pub mod defaults;
pub mod dry_run;
pub mod editor;
pub mod engine;
pub mod error;
pub mod settings;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use capabilities::{
    ChainApplier, CommandCatalog, ProgressSink, PromptAnswer, Settings, UserPrompt, Workspace,
};
pub use config::AppConfig;
pub use defaults::{BuiltinChain, StaticCatalog};
pub use editor::{ChainSession, LoadedChain, StepRow, SwitchOutcome, END_LABEL};
pub use engine::{ChainRunner, RunEnv, RunStage, RunTracker, RunTransitionError};
pub use error::{ChainError, Result};
pub use settings::{JsonSettings, ACTIVE_CHAIN_KEY};
pub use store::ChainStore;
pub use types::{
    Chain, ExecutionOutcome, ExecutionRequest, FileReport, RunOutcome, RunReport, Step, Target,
    TargetKind,
};
