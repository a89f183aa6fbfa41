//! Chain editing.
//!
//! [`LoadedChain`] is the in-memory copy of one chain plus its dirty flag and
//! list selection. [`ChainSession`] owns at most one loaded chain and enforces
//! the save/discard/cancel protocol whenever a dirty chain would be replaced.
//!
//! # Rules
//!
//! - Every mutation of a fixed chain fails with `Immutable` and changes nothing.
//! - Every successful mutation marks the chain dirty; only a save clears it.
//! - Index errors are rejected with `OutOfRange` and change nothing.
//! - The "- END -" row exists only in [`LoadedChain::rows`], never in data.

use crate::capabilities::{CommandCatalog, PromptAnswer, Settings, UserPrompt};
use crate::error::{ChainError, Result};
use crate::settings::ACTIVE_CHAIN_KEY;
use crate::store::{validate_name, ChainStore};
use crate::types::{Chain, Step};
use tracing::{debug, info, warn};

/// Label of the terminal row shown after the last step.
pub const END_LABEL: &str = "- END -";

/// One displayed row of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRow {
    /// 1-based position
    pub number: usize,
    /// Friendly command name (or raw identifier if unknown)
    pub command: String,
    pub params: String,
    /// True for the trailing sentinel row
    pub is_end: bool,
}

/// A chain loaded for editing.
#[derive(Debug, Clone)]
pub struct LoadedChain {
    chain: Chain,
    fixed: bool,
    dirty: bool,
    selected: usize,
}

impl LoadedChain {
    pub fn new(chain: Chain, fixed: bool) -> Self {
        Self {
            chain,
            fixed,
            dirty: false,
            selected: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.chain.name
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn steps(&self) -> &[Step] {
        &self.chain.steps
    }

    pub fn len(&self) -> usize {
        self.chain.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.steps.is_empty()
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Selected row; `len()` means the END row.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Select a row, clamped to the END row.
    pub fn select(&mut self, row: usize) {
        self.selected = row.min(self.len());
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.fixed {
            Err(ChainError::immutable(self.name()))
        } else {
            Ok(())
        }
    }

    fn ensure_step(&self, index: usize) -> Result<()> {
        if index < self.len() {
            Ok(())
        } else {
            Err(ChainError::OutOfRange {
                index,
                len: self.len(),
            })
        }
    }

    fn touch(&mut self) {
        self.dirty = true;
    }

    /// Insert a step at `index`, clamped to `[0, len]`.
    ///
    /// Returns the position the step landed at. Inserting at or past the END
    /// row appends.
    pub fn insert_step(
        &mut self,
        index: usize,
        command: impl Into<String>,
        params: impl Into<String>,
    ) -> Result<usize> {
        self.ensure_mutable()?;
        let at = index.min(self.len());
        let step = Step::new(command, params);
        debug!("Inserting {:?} into '{}' at {}", step, self.name(), at);
        self.chain.steps.insert(at, step);
        self.touch();
        self.selected = at + 1;
        Ok(at)
    }

    /// Remove the step at `index`. The END row cannot be deleted.
    pub fn delete_step(&mut self, index: usize) -> Result<Step> {
        self.ensure_mutable()?;
        self.ensure_step(index)?;
        let removed = self.chain.steps.remove(index);
        debug!("Deleted {:?} from '{}' at {}", removed, self.name(), index);
        self.touch();
        // Removing the last step moves the selection onto the new last step.
        self.selected = if index >= self.len() {
            index.saturating_sub(1)
        } else {
            index
        };
        Ok(removed)
    }

    /// Swap the step at `index` with its predecessor.
    pub fn move_up(&mut self, index: usize) -> Result<()> {
        self.ensure_mutable()?;
        self.ensure_step(index)?;
        if index == 0 {
            return Err(ChainError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        self.chain.steps.swap(index - 1, index);
        self.touch();
        self.selected = index - 1;
        Ok(())
    }

    /// Swap the step at `index` with its successor.
    pub fn move_down(&mut self, index: usize) -> Result<()> {
        self.ensure_mutable()?;
        if index >= self.len().saturating_sub(1) {
            return Err(ChainError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        self.chain.steps.swap(index, index + 1);
        self.touch();
        self.selected = index + 1;
        Ok(())
    }

    /// Replace a step's parameters, keeping its command and position.
    pub fn edit_step_params(&mut self, index: usize, params: impl Into<String>) -> Result<()> {
        self.ensure_mutable()?;
        self.ensure_step(index)?;
        self.chain.steps[index].params = params.into();
        self.touch();
        self.selected = index;
        Ok(())
    }

    /// Reset a fixed chain to its built-in content.
    ///
    /// The restored content is dirty until saved.
    pub fn restore_default(&mut self, store: &ChainStore) -> Result<()> {
        let default = store.restore_default(self.name())?;
        info!("Restored '{}' to its default steps", self.name());
        self.chain.steps = default.steps;
        self.touch();
        self.select(self.selected);
        Ok(())
    }

    /// Display rows, ending with the END sentinel.
    pub fn rows(&self, catalog: &dyn CommandCatalog) -> Vec<StepRow> {
        let mut rows: Vec<StepRow> = self
            .chain
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| StepRow {
                number: i + 1,
                command: catalog.display_name(&step.command),
                params: step.params.clone(),
                is_end: false,
            })
            .collect();
        rows.push(StepRow {
            number: self.len() + 1,
            command: END_LABEL.to_string(),
            params: String::new(),
            is_end: true,
        });
        rows
    }

    fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn set_name(&mut self, name: &str) {
        self.chain.name = name.to_string();
    }
}

/// Result of a request to replace the loaded chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched,
    /// The user cancelled; the previous chain is still loaded, unchanged.
    Cancelled,
}

/// Editing session over a chain store.
#[derive(Debug)]
pub struct ChainSession<'s> {
    store: &'s ChainStore,
    loaded: Option<LoadedChain>,
}

impl<'s> ChainSession<'s> {
    pub fn new(store: &'s ChainStore) -> Self {
        Self {
            store,
            loaded: None,
        }
    }

    pub fn store(&self) -> &'s ChainStore {
        self.store
    }

    pub fn loaded(&self) -> Option<&LoadedChain> {
        self.loaded.as_ref()
    }

    /// Name of the loaded chain, if any.
    pub fn active_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(LoadedChain::name)
    }

    /// Mutable access to the loaded chain.
    pub fn editor(&mut self) -> Result<&mut LoadedChain> {
        self.loaded
            .as_mut()
            .ok_or(ChainError::NoChainLoaded)
    }

    fn load(&self, name: &str) -> Result<LoadedChain> {
        let chain = self.store.load(name)?;
        Ok(LoadedChain::new(chain, self.store.is_fixed(name)))
    }

    /// Load the chain recorded as active in `settings`, or the first stored
    /// chain if that one is gone.
    pub fn open_initial(&mut self, settings: &dyn Settings) -> Result<&LoadedChain> {
        let active = settings.read_string(ACTIVE_CHAIN_KEY, "");
        let name = if self.store.exists(&active) {
            active
        } else {
            self.store
                .list_names()?
                .into_iter()
                .next()
                .ok_or_else(|| ChainError::not_found(active))?
        };
        let loaded = self.load(&name)?;
        Ok(self.loaded.insert(loaded))
    }

    /// Ask what to do with unsaved edits.
    ///
    /// Returns `Ok(false)` if the user cancelled. A failed save is returned as
    /// an error and leaves the chain dirty.
    fn resolve_unsaved(&mut self, prompt: &mut dyn UserPrompt) -> Result<bool> {
        let Some(loaded) = self.loaded.as_ref() else {
            return Ok(true);
        };
        if !loaded.is_dirty() {
            return Ok(true);
        }

        let name = loaded.name().to_string();
        let message = format!("{} changed. Do you want to save the changes?", name);
        match prompt.confirm(&message) {
            PromptAnswer::Cancel => Ok(false),
            PromptAnswer::Yes => {
                self.save()?;
                Ok(true)
            }
            PromptAnswer::No => {
                debug!("Discarding unsaved edits to '{}'", name);
                Ok(true)
            }
        }
    }

    /// Replace the loaded chain with `name`.
    ///
    /// A missing chain is rejected before the user is asked about unsaved
    /// edits, so it never costs the current one. The new chain is read after
    /// the question is settled, so switching to the loaded chain picks up
    /// edits that were just saved.
    pub fn switch_to(&mut self, name: &str, prompt: &mut dyn UserPrompt) -> Result<SwitchOutcome> {
        if !self.store.exists(name) {
            return Err(ChainError::not_found(name));
        }
        if !self.resolve_unsaved(prompt)? {
            return Ok(SwitchOutcome::Cancelled);
        }
        self.loaded = Some(self.load(name)?);
        Ok(SwitchOutcome::Switched)
    }

    /// Unload the current chain, asking about unsaved edits.
    pub fn close(&mut self, prompt: &mut dyn UserPrompt) -> Result<SwitchOutcome> {
        if !self.resolve_unsaved(prompt)? {
            return Ok(SwitchOutcome::Cancelled);
        }
        self.loaded = None;
        Ok(SwitchOutcome::Switched)
    }

    /// Persist the loaded chain and clear its dirty flag.
    pub fn save(&mut self) -> Result<()> {
        let loaded = self.editor()?;
        let chain = loaded.chain().clone();
        self.store.save(&chain)?;
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.mark_saved();
        }
        Ok(())
    }

    /// Record the loaded chain as active and persist pending edits.
    ///
    /// Called before a run is started from the editor.
    pub fn save_changes(&mut self, settings: &mut dyn Settings) -> Result<()> {
        let Some(name) = self.active_name().map(str::to_string) else {
            return Ok(());
        };
        settings.write_string(ACTIVE_CHAIN_KEY, &name);
        if let Err(e) = settings.flush() {
            warn!("Failed to persist active chain '{}': {:#}", name, e);
        }
        if self.loaded.as_ref().is_some_and(LoadedChain::is_dirty) {
            self.save()?;
        }
        Ok(())
    }

    /// Rename the loaded chain in the store, keeping any unsaved edits.
    pub fn rename_active(&mut self, new_name: &str) -> Result<()> {
        let loaded = self.editor()?;
        loaded.ensure_mutable()?;
        let old_name = loaded.name().to_string();
        self.store.rename(&old_name, new_name)?;
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.set_name(new_name);
        }
        Ok(())
    }

    /// Create an empty chain and switch to it.
    pub fn add_chain(&mut self, name: &str, prompt: &mut dyn UserPrompt) -> Result<SwitchOutcome> {
        let chain = self.store.create(name)?;
        self.switch_to(&chain.name, prompt)
    }

    /// Ask the user for a new chain name until a valid one is given.
    ///
    /// Returns the created name, or `None` if the user cancelled.
    pub fn add_interactive(&mut self, prompt: &mut dyn UserPrompt) -> Result<Option<String>> {
        loop {
            let Some(input) = prompt.input_text("Enter name of new chain") else {
                return Ok(None);
            };
            let name = input.trim().to_string();

            if let Err(e) = validate_name(&name) {
                prompt.notify_error(&e.to_string());
                continue;
            }
            match self.store.create(&name) {
                Ok(_) => {}
                Err(e @ ChainError::AlreadyExists { .. }) => {
                    prompt.notify_error(&e.to_string());
                    continue;
                }
                Err(e) => return Err(e),
            }

            self.switch_to(&name, prompt)?;
            return Ok(Some(name));
        }
    }

    /// Delete `name` after asking the user.
    ///
    /// Returns `Ok(false)` unless the user answered yes. When the loaded chain
    /// is deleted its neighbour in the list is loaded in its place.
    pub fn delete_with_confirmation(
        &mut self,
        name: &str,
        prompt: &mut dyn UserPrompt,
    ) -> Result<bool> {
        if self.store.is_fixed(name) {
            return Err(ChainError::immutable(name));
        }
        if !self.store.exists(name) {
            return Err(ChainError::not_found(name));
        }
        let message = format!("Are you sure you want to delete {}?", name);
        if prompt.confirm(&message) != PromptAnswer::Yes {
            return Ok(false);
        }

        let position = self
            .store
            .list_names()?
            .iter()
            .position(|n| n == name)
            .unwrap_or(0);
        self.store.delete(name)?;

        if self.active_name() == Some(name) {
            let remaining = self.store.list_names()?;
            self.loaded = match remaining.get(position.min(remaining.len().saturating_sub(1))) {
                Some(neighbour) => Some(self.load(neighbour)?),
                None => None,
            };
        }
        Ok(true)
    }
}
