//! Durable chain storage.
//!
//! One JSON file per chain in a single directory:
//!
//! ```text
//! <chains_dir>/MP3 Conversion.json
//! <chains_dir>/Loud.json
//! ```
//!
//! Each file holds only the ordered step list; the chain name is the file
//! stem. Every write completes before the call returns, so `Ok` means the
//! change is on disk.

use crate::defaults::{is_builtin_name, BuiltinChain};
use crate::error::{ChainError, Result};
use crate::types::{Chain, Step};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing::{debug, info};

const CHAIN_EXTENSION: &str = "json";

/// On-disk representation of a chain.
#[derive(Debug, Serialize, Deserialize)]
struct ChainRecord {
    steps: Vec<Step>,
}

/// Check that `name` can be used as a chain name.
///
/// Names map to file names, so they must be non-blank and free of `/` and `\`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ChainError::invalid_name(name, "name must not be blank"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ChainError::invalid_name(
            name,
            "names may not contain '/' and '\\'",
        ));
    }
    Ok(())
}

/// Directory-backed chain store.
#[derive(Debug, Clone)]
pub struct ChainStore {
    dir: PathBuf,
}

impl ChainStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// Built-in chains missing from the directory are written with their
    /// default content.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ChainError::write(dir.display().to_string(), e))?;

        let store = Self { dir };
        for builtin in BuiltinChain::iter() {
            if !store.exists(builtin.name()) {
                info!("Creating built-in chain '{}'", builtin.name());
                store.save(&builtin.chain())?;
            }
        }
        Ok(store)
    }

    /// Directory holding the chain files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn chain_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, CHAIN_EXTENSION))
    }

    /// True if a chain with this name is stored.
    pub fn exists(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.chain_path(name).is_file()
    }

    /// All stored chain names, sorted.
    pub fn list_names(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| ChainError::read(&self.dir, e))?;

        let mut names = BTreeSet::new();
        for entry in entries {
            let path = entry.map_err(|e| ChainError::read(&self.dir, e))?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(CHAIN_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.insert(stem.to_string());
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Load a chain by name.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no chain with that name is stored
    /// - `Read` if the file exists but cannot be read or parsed
    pub fn load(&self, name: &str) -> Result<Chain> {
        if !self.exists(name) {
            return Err(ChainError::not_found(name));
        }
        let path = self.chain_path(name);
        let record = read_record(&path)?;
        debug!("Loaded chain '{}' ({} steps)", name, record.steps.len());
        Ok(Chain::with_steps(name, record.steps))
    }

    /// Write a chain, replacing any stored chain of the same name.
    pub fn save(&self, chain: &Chain) -> Result<()> {
        validate_name(&chain.name)?;
        let record = ChainRecord {
            steps: chain.steps.clone(),
        };
        let json =
            serde_json::to_string_pretty(&record).map_err(|e| ChainError::write(&chain.name, e))?;

        // Write next to the target and rename so a failed write never leaves
        // a truncated chain behind.
        let path = self.chain_path(&chain.name);
        let tmp = path.with_extension(format!("{}.tmp", CHAIN_EXTENSION));
        fs::write(&tmp, json).map_err(|e| ChainError::write(&chain.name, e))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            ChainError::write(&chain.name, e)
        })?;

        info!("Saved chain '{}' ({} steps)", chain.name, chain.steps.len());
        Ok(())
    }

    /// Create a new empty chain.
    ///
    /// Surrounding whitespace is stripped from `name` first.
    pub fn create(&self, name: &str) -> Result<Chain> {
        let name = name.trim();
        validate_name(name)?;
        if self.exists(name) || is_builtin_name(name) {
            return Err(ChainError::AlreadyExists {
                name: name.to_string(),
            });
        }
        let chain = Chain::new(name);
        self.save(&chain)?;
        Ok(chain)
    }

    /// Rename a stored chain.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if `new_name` is blank or contains a path separator
    /// - `Immutable` if `old_name` is a built-in chain
    /// - `NotFound` if `old_name` is not stored
    /// - `AlreadyExists` if `new_name` is taken
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        validate_name(new_name)?;
        if self.is_fixed(old_name) {
            return Err(ChainError::immutable(old_name));
        }
        if !self.exists(old_name) {
            return Err(ChainError::not_found(old_name));
        }
        if old_name == new_name {
            return Ok(());
        }
        if self.exists(new_name) || is_builtin_name(new_name) {
            return Err(ChainError::AlreadyExists {
                name: new_name.to_string(),
            });
        }

        fs::rename(self.chain_path(old_name), self.chain_path(new_name))
            .map_err(|e| ChainError::write(old_name, e))?;
        info!("Renamed chain '{}' to '{}'", old_name, new_name);
        Ok(())
    }

    /// Delete a stored chain.
    pub fn delete(&self, name: &str) -> Result<()> {
        if self.is_fixed(name) {
            return Err(ChainError::immutable(name));
        }
        if !self.exists(name) {
            return Err(ChainError::not_found(name));
        }
        fs::remove_file(self.chain_path(name)).map_err(|e| ChainError::write(name, e))?;
        info!("Deleted chain '{}'", name);
        Ok(())
    }

    /// True for built-in chain names.
    pub fn is_fixed(&self, name: &str) -> bool {
        is_builtin_name(name)
    }

    /// Built-in definition of a fixed chain.
    ///
    /// Nothing is written; the caller decides whether to save the result.
    pub fn restore_default(&self, name: &str) -> Result<Chain> {
        BuiltinChain::from_name(name)
            .map(BuiltinChain::chain)
            .ok_or_else(|| ChainError::NoDefault {
                name: name.to_string(),
            })
    }

    /// Copy a chain file into the store, naming the chain after the file stem.
    ///
    /// Returns the new chain's name. Existing chains are never overwritten.
    pub fn import_file(&self, source: &Path) -> Result<String> {
        let name = source
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ChainError::invalid_name(source.display().to_string(), "no file name"))?
            .to_string();
        validate_name(&name)?;
        if self.exists(&name) || is_builtin_name(&name) {
            return Err(ChainError::AlreadyExists { name });
        }

        let record = read_record(source)?;
        self.save(&Chain::with_steps(name.clone(), record.steps))?;
        info!("Imported chain '{}' from {}", name, source.display());
        Ok(name)
    }

    /// Write a stored chain to `dest` in the store's file format.
    pub fn export(&self, name: &str, dest: &Path) -> Result<()> {
        let chain = self.load(name)?;
        let record = ChainRecord { steps: chain.steps };
        let json = serde_json::to_string_pretty(&record).map_err(|e| ChainError::write(name, e))?;
        fs::write(dest, json).map_err(|e| ChainError::write(name, e))?;
        info!("Exported chain '{}' to {}", name, dest.display());
        Ok(())
    }
}

fn read_record(path: &Path) -> Result<ChainRecord> {
    let content = fs::read_to_string(path).map_err(|e| ChainError::read(path, e))?;
    serde_json::from_str(&content).map_err(|e| ChainError::read(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, ChainStore) {
        let dir = TempDir::new().expect("tempdir"); // test: environment setup
        let store = ChainStore::open(dir.path().join("chains")).expect("open store"); // test: fresh dir
        (dir, store)
    }

    #[test]
    fn test_open_materializes_builtins() {
        let (_dir, store) = test_store();
        let names = store.list_names().expect("list"); // test: readable dir
        assert!(names.contains(&"MP3 Conversion".to_string()));
        assert!(names.contains(&"Fade Ends".to_string()));
    }

    #[test]
    fn test_open_keeps_modified_builtin() {
        let (dir, store) = test_store();
        let custom = Chain::with_steps("Fade Ends", vec![Step::new("FadeIn", "")]);
        store.save(&custom).expect("save"); // test: writable dir

        let reopened = ChainStore::open(dir.path().join("chains")).expect("reopen"); // test: existing dir
        assert_eq!(reopened.load("Fade Ends").expect("load"), custom); // test: just saved
    }

    #[test]
    fn test_list_names_is_sorted_and_ignores_other_files() {
        let (_dir, store) = test_store();
        store.create("zeta").expect("create"); // test: free name
        store.create("Alpha").expect("create"); // test: free name
        fs::write(store.dir().join("notes.txt"), "x").expect("write"); // test: writable dir

        let names = store.list_names().expect("list"); // test: readable dir
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(!names.iter().any(|n| n == "notes"));
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (_dir, store) = test_store();
        assert_eq!(store.load("nope"), Err(ChainError::not_found("nope")));
    }

    #[test]
    fn test_load_corrupt_file_is_read_error() {
        let (_dir, store) = test_store();
        fs::write(store.dir().join("broken.json"), "{ not json").expect("write"); // test: writable dir
        assert!(matches!(store.load("broken"), Err(ChainError::Read { .. })));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let (_dir, store) = test_store();
        store
            .save(&Chain::with_steps("Loud", vec![Step::new("Amplify", "6dB")]))
            .expect("save"); // test: writable dir
        let leftovers: Vec<_> = fs::read_dir(store.dir())
            .expect("read dir") // test: readable dir
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_create_trims_and_rejects_duplicates() {
        let (_dir, store) = test_store();
        let chain = store.create("  Loud  ").expect("create"); // test: free name
        assert_eq!(chain.name, "Loud");
        assert_eq!(
            store.create("Loud"),
            Err(ChainError::AlreadyExists {
                name: "Loud".to_string()
            })
        );
        assert!(matches!(store.create("   "), Err(ChainError::InvalidName { .. })));
    }

    #[test]
    fn test_rename_errors() {
        let (_dir, store) = test_store();
        store.create("Loud").expect("create"); // test: free name
        store.create("Quiet").expect("create"); // test: free name

        assert!(matches!(store.rename("Loud", "a/b"), Err(ChainError::InvalidName { .. })));
        assert!(matches!(store.rename("Loud", ""), Err(ChainError::InvalidName { .. })));
        assert_eq!(
            store.rename("Fade Ends", "Mine"),
            Err(ChainError::immutable("Fade Ends"))
        );
        assert_eq!(store.rename("Ghost", "Mine"), Err(ChainError::not_found("Ghost")));
        assert!(matches!(store.rename("Loud", "Quiet"), Err(ChainError::AlreadyExists { .. })));
        assert!(matches!(
            store.rename("Loud", "MP3 Conversion"),
            Err(ChainError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_rename_moves_chain() {
        let (_dir, store) = test_store();
        store
            .save(&Chain::with_steps("Loud", vec![Step::new("Amplify", "6dB")]))
            .expect("save"); // test: writable dir
        store.rename("Loud", "Louder").expect("rename"); // test: valid rename

        assert!(!store.exists("Loud"));
        let moved = store.load("Louder").expect("load"); // test: just renamed
        assert_eq!(moved.steps, vec![Step::new("Amplify", "6dB")]);
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = test_store();
        store.create("Loud").expect("create"); // test: free name
        store.delete("Loud").expect("delete"); // test: existing chain
        assert!(!store.exists("Loud"));
        assert_eq!(store.delete("Loud"), Err(ChainError::not_found("Loud")));
        assert_eq!(
            store.delete("MP3 Conversion"),
            Err(ChainError::immutable("MP3 Conversion"))
        );
    }

    #[test]
    fn test_restore_default() {
        let (_dir, store) = test_store();
        let restored = store.restore_default("Fade Ends").expect("restore"); // test: built-in
        assert_eq!(restored, BuiltinChain::FadeEnds.chain());
        assert!(matches!(store.restore_default("Loud"), Err(ChainError::NoDefault { .. })));
    }

    #[test]
    fn test_export_then_import_under_new_name() {
        let (dir, store) = test_store();
        let chain = Chain::with_steps(
            "Loud",
            vec![Step::new("Normalize", ""), Step::new("Amplify", "6dB")],
        );
        store.save(&chain).expect("save"); // test: writable dir

        let exported = dir.path().join("Shared Loud.json");
        store.export("Loud", &exported).expect("export"); // test: writable dir

        let name = store.import_file(&exported).expect("import"); // test: valid file
        assert_eq!(name, "Shared Loud");
        assert_eq!(store.load("Shared Loud").expect("load").steps, chain.steps); // test: just imported

        assert!(matches!(store.import_file(&exported), Err(ChainError::AlreadyExists { .. })));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Loud").is_ok());
        assert!(validate_name("Cleanup for Speech").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("a\\b").is_err());
        assert!(validate_name("a/b").is_err());
    }
}
