//! Capabilities the chain core consumes but does not implement.
//!
//! The visual shell, the audio document, file decoding, preference storage and
//! command dispatch all live outside this crate. The core only talks to them
//! through these traits, which are passed in explicitly by the caller.
//!
//! # Contract
//!
//! - All calls are synchronous. A call that blocks (a modal prompt, a hung
//!   command) blocks the run.
//! - `Workspace` is exclusively borrowed by one run at a time.
//! - `ChainApplier::apply_chain` is a single opaque call from the runner's
//!   point of view; step dispatch happens behind it.

use crate::types::Chain;
use std::path::{Path, PathBuf};
use strum::Display;

/// Progress display and cooperative cancellation channel.
pub trait ProgressSink {
    /// Show the progress window with a title.
    fn show_run(&mut self, title: &str);

    /// Show the ordered list of files a batch will process.
    fn show_files(&mut self, _files: &[PathBuf]) {}

    /// Highlight item `index` of `total`, clearing the previous highlight.
    fn advance(&mut self, index: usize, total: usize);

    /// True once the user has asked to stop.
    fn is_cancelled(&self) -> bool;

    /// False once the progress window has been dismissed.
    fn is_still_visible(&self) -> bool;

    /// Close the progress window and restore the pre-run UI state.
    fn finish(&mut self);
}

/// Answer to a yes/no/cancel question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PromptAnswer {
    Yes,
    No,
    Cancel,
}

/// Blocking questions and notices addressed to the user.
pub trait UserPrompt {
    fn confirm(&mut self, message: &str) -> PromptAnswer;

    /// Ask for a line of text; `None` means the user cancelled.
    fn input_text(&mut self, prompt: &str) -> Option<String>;

    fn notify_error(&mut self, message: &str);
}

/// The mutable document chain steps operate on.
pub trait Workspace {
    /// True when no content is loaded.
    fn is_empty(&self) -> bool;

    /// Import a file into the workspace.
    fn import_file(&mut self, path: &Path) -> anyhow::Result<()>;

    fn select_all(&mut self);

    /// Drop undo/redo history.
    fn clear_history(&mut self);

    /// Remove every loaded track/content item.
    fn remove_all_content(&mut self);
}

/// Executes every step of a chain against a workspace.
pub trait ChainApplier {
    /// Apply `chain` in stored order.
    ///
    /// `Ok(false)` and `Err(_)` both mean a step failed; the workspace is left
    /// in whatever state the failing step produced.
    fn apply_chain(&mut self, chain: &Chain, workspace: &mut dyn Workspace)
    -> anyhow::Result<bool>;
}

/// Read-only mapping from command identifiers to display names.
pub trait CommandCatalog {
    fn friendly_name(&self, command: &str) -> Option<String>;

    /// All known (identifier, display name) pairs.
    fn commands(&self) -> Vec<(String, String)>;

    /// Friendly name, falling back to the raw identifier.
    fn display_name(&self, command: &str) -> String {
        self.friendly_name(command)
            .unwrap_or_else(|| command.to_string())
    }
}

/// Persistent key/value preferences.
pub trait Settings {
    fn read_string(&self, key: &str, default: &str) -> String;

    fn write_string(&mut self, key: &str, value: &str);

    /// Make previous writes durable.
    fn flush(&mut self) -> anyhow::Result<()>;
}
