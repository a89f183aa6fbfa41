//! Dry-run capabilities.
//!
//! No audio is decoded and no command is dispatched. The workspace records
//! which files it was asked to import and the applier logs each step it would
//! have run. Used by the `run` subcommand to preview a chain against real
//! paths.

use crate::capabilities::{ChainApplier, CommandCatalog, Workspace};
use crate::defaults::StaticCatalog;
use crate::types::Chain;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Workspace that tracks imports without reading file contents.
#[derive(Debug, Default)]
pub struct DryRunWorkspace {
    loaded: Vec<PathBuf>,
    history: usize,
    selected: bool,
    imported: Vec<PathBuf>,
}

impl DryRunWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files currently loaded.
    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }

    /// Every file imported over the lifetime of this workspace.
    pub fn imported(&self) -> &[PathBuf] {
        &self.imported
    }

    pub fn history_len(&self) -> usize {
        self.history
    }

    pub fn has_selection(&self) -> bool {
        self.selected
    }

    fn record_edit(&mut self) {
        self.history += 1;
    }
}

impl Workspace for DryRunWorkspace {
    fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    fn import_file(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            bail!("{} is not a readable file", path.display());
        }
        self.loaded.push(path.to_path_buf());
        self.imported.push(path.to_path_buf());
        self.selected = false;
        self.record_edit();
        Ok(())
    }

    fn select_all(&mut self) {
        self.selected = !self.loaded.is_empty();
    }

    fn clear_history(&mut self) {
        self.history = 0;
    }

    fn remove_all_content(&mut self) {
        if self.selected {
            self.loaded.clear();
            self.selected = false;
        }
    }
}

/// Applier that logs what each step would do.
#[derive(Debug, Default)]
pub struct DryRunApplier {
    catalog: StaticCatalog,
    applied: usize,
}

impl DryRunApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chain applications so far.
    pub fn applied(&self) -> usize {
        self.applied
    }
}

impl ChainApplier for DryRunApplier {
    fn apply_chain(&mut self, chain: &Chain, _workspace: &mut dyn Workspace) -> Result<bool> {
        for (index, step) in chain.steps.iter().enumerate() {
            info!(
                "[DRY RUN] {} step {}: {} {}",
                chain.name,
                index + 1,
                self.catalog.display_name(&step.command),
                step.params
            );
        }
        self.applied += 1;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Step;
    use tempfile::TempDir;

    #[test]
    fn test_import_missing_file_fails() {
        let mut workspace = DryRunWorkspace::new();
        assert!(workspace.import_file(Path::new("/nonexistent/take1.wav")).is_err());
        assert!(workspace.is_empty());
    }

    #[test]
    fn test_import_then_reset_empties_workspace() {
        let dir = TempDir::new().expect("tempdir"); // test: environment setup
        let path = dir.path().join("take1.wav");
        std::fs::write(&path, b"RIFF").expect("write"); // test: writable tempdir

        let mut workspace = DryRunWorkspace::new();
        workspace.import_file(&path).expect("import"); // test: file exists
        assert!(!workspace.is_empty());
        assert_eq!(workspace.history_len(), 1);

        workspace.clear_history();
        workspace.select_all();
        workspace.remove_all_content();
        assert!(workspace.is_empty());
        assert_eq!(workspace.history_len(), 0);
        assert_eq!(workspace.imported(), &[path]);
    }

    #[test]
    fn test_remove_needs_selection() {
        let dir = TempDir::new().expect("tempdir"); // test: environment setup
        let path = dir.path().join("take1.wav");
        std::fs::write(&path, b"RIFF").expect("write"); // test: writable tempdir

        let mut workspace = DryRunWorkspace::new();
        workspace.import_file(&path).expect("import"); // test: file exists
        workspace.remove_all_content();
        assert_eq!(workspace.loaded().len(), 1);
    }

    #[test]
    fn test_applier_counts_applications() {
        let mut applier = DryRunApplier::new();
        let mut workspace = DryRunWorkspace::new();
        let chain = Chain::with_steps("Loud", vec![Step::new("Amplify", "Ratio=2")]);
        assert!(applier.apply_chain(&chain, &mut workspace).expect("apply")); // test: dry run never fails
        assert_eq!(applier.applied(), 1);
    }
}
