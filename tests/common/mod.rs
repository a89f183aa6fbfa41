//! In-memory capabilities shared by the integration tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use batchchain::capabilities::{
    ChainApplier, ProgressSink, PromptAnswer, Settings, UserPrompt, Workspace,
};
use batchchain::types::Chain;
use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

// =============================================================================
// Workspace
// =============================================================================

/// Workspace recording every call in order.
#[derive(Debug, Default)]
pub struct MockWorkspace {
    pub loaded: Vec<PathBuf>,
    pub history: usize,
    pub events: Vec<String>,
    pub failing_imports: Vec<PathBuf>,
}

impl MockWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(path: impl Into<PathBuf>) -> Self {
        Self {
            failing_imports: vec![path.into()],
            ..Self::default()
        }
    }

    pub fn with_content(path: impl Into<PathBuf>) -> Self {
        Self {
            loaded: vec![path.into()],
            ..Self::default()
        }
    }
}

impl Workspace for MockWorkspace {
    fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    fn import_file(&mut self, path: &Path) -> Result<()> {
        self.events.push(format!("import {}", path.display()));
        if self.failing_imports.iter().any(|p| p == path) {
            bail!("unsupported format");
        }
        self.loaded.push(path.to_path_buf());
        self.history += 1;
        Ok(())
    }

    fn select_all(&mut self) {
        self.events.push("select_all".to_string());
    }

    fn clear_history(&mut self) {
        self.events.push("clear_history".to_string());
        self.history = 0;
    }

    fn remove_all_content(&mut self) {
        self.events.push("remove_all".to_string());
        self.loaded.clear();
    }
}

// =============================================================================
// Applier
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyBehavior {
    Succeed,
    ReportFailure,
    Error,
    Panic,
}

/// Applier returning a fixed behavior and recording what it saw.
#[derive(Debug)]
pub struct MockApplier {
    pub behavior: ApplyBehavior,
    /// (chain name, step count, workspace empty at call time)
    pub calls: Vec<(String, usize, bool)>,
}

impl MockApplier {
    pub fn new(behavior: ApplyBehavior) -> Self {
        Self {
            behavior,
            calls: Vec::new(),
        }
    }
}

impl ChainApplier for MockApplier {
    fn apply_chain(&mut self, chain: &Chain, workspace: &mut dyn Workspace) -> Result<bool> {
        self.calls
            .push((chain.name.clone(), chain.len(), workspace.is_empty()));
        match self.behavior {
            ApplyBehavior::Succeed => Ok(true),
            ApplyBehavior::ReportFailure => Ok(false),
            ApplyBehavior::Error => bail!("Amplify: clipping"),
            ApplyBehavior::Panic => panic!("effect crashed"),
        }
    }
}

// =============================================================================
// Progress
// =============================================================================

/// Progress sink that can turn cancelled or invisible after a number of polls.
#[derive(Debug, Default)]
pub struct MockProgress {
    pub titles: Vec<String>,
    pub files: Vec<PathBuf>,
    pub advances: Vec<(usize, usize)>,
    pub finished: usize,
    /// Cancel once `is_cancelled` has been polled this many times
    pub cancel_after_polls: Option<usize>,
    /// Report the window as closed from the start
    pub dismissed: bool,
    polls: Cell<usize>,
}

impl MockProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after(polls: usize) -> Self {
        Self {
            cancel_after_polls: Some(polls),
            ..Self::default()
        }
    }
}

impl ProgressSink for MockProgress {
    fn show_run(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }

    fn show_files(&mut self, files: &[PathBuf]) {
        self.files = files.to_vec();
    }

    fn advance(&mut self, index: usize, total: usize) {
        self.advances.push((index, total));
    }

    fn is_cancelled(&self) -> bool {
        let seen = self.polls.get();
        self.polls.set(seen + 1);
        self.cancel_after_polls.is_some_and(|limit| seen >= limit)
    }

    fn is_still_visible(&self) -> bool {
        !self.dismissed
    }

    fn finish(&mut self) {
        self.finished += 1;
    }
}

// =============================================================================
// Prompt
// =============================================================================

/// Prompt answering from queues; an exhausted queue answers Cancel / None.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    pub answers: VecDeque<PromptAnswer>,
    pub inputs: VecDeque<Option<String>>,
    pub questions: Vec<String>,
    pub errors: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(answers: &[PromptAnswer]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn typing(inputs: &[Option<&str>]) -> Self {
        Self {
            inputs: inputs.iter().map(|i| i.map(str::to_string)).collect(),
            ..Self::default()
        }
    }
}

impl UserPrompt for ScriptedPrompt {
    fn confirm(&mut self, message: &str) -> PromptAnswer {
        self.questions.push(message.to_string());
        self.answers.pop_front().unwrap_or(PromptAnswer::Cancel)
    }

    fn input_text(&mut self, prompt: &str) -> Option<String> {
        self.questions.push(prompt.to_string());
        self.inputs.pop_front().flatten()
    }

    fn notify_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Default)]
pub struct MemorySettings {
    pub values: BTreeMap<String, String>,
    pub flushes: usize,
    pub fail_flush: bool,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Settings for MemorySettings {
    fn read_string(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn write_string(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn flush(&mut self) -> Result<()> {
        if self.fail_flush {
            bail!("read-only preferences");
        }
        self.flushes += 1;
        Ok(())
    }
}
