//! File-backed state store
//!
//! Records of applied dependencies are kept in a TOML file:
//!
//! ```toml
//! last_updated = "2026-01-01T00:00:00Z"
//!
//! [records]
//! brew = ["brew:git:latest", "brew:wget:latest"]
//! cask = ["cask:firefox:latest"]
//! ```

use chrono::{DateTime, Utc};
use reconcile::{Error, RecordTable, Result, StateProvider};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use brewkit::Dependency;

// ============================================================================
// State File
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    /// Last time the state was written
    last_updated: DateTime<Utc>,

    /// Recorded identifiers per collection label
    #[serde(default)]
    records: BTreeMap<String, BTreeSet<String>>,
}

// ============================================================================
// FileProvider
// ============================================================================

/// State provider persisted to a TOML file
#[derive(Debug)]
pub struct FileProvider {
    path: PathBuf,
    table: Option<RecordTable>,
    last_updated: Option<DateTime<Utc>>,
    dirty: bool,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: None,
            last_updated: None,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the file was last written, once initialized
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    fn read(&self) -> Result<Option<StateFile>> {
        if !self.path.exists() {
            log::debug!("State file {} does not exist yet", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::init(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let state: StateFile = toml::from_str(&content).map_err(|e| {
            Error::init(format!("failed to parse {}: {e}", self.path.display()))
        })?;

        log::debug!("Loaded state from {}", self.path.display());
        Ok(Some(state))
    }

    fn loaded(&self) -> Result<&RecordTable> {
        self.table
            .as_ref()
            .ok_or_else(|| Error::provider("state file used before init"))
    }

    fn loaded_mut(&mut self) -> Result<&mut RecordTable> {
        self.table
            .as_mut()
            .ok_or_else(|| Error::provider("state file used before init"))
    }
}

impl StateProvider for FileProvider {
    fn init(&mut self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                Error::init(format!(
                    "failed to create state directory {}: {e}",
                    dir.display()
                ))
            })?;
        }

        let (table, last_updated) = match self.read()? {
            Some(state) => (RecordTable::from_map(state.records), Some(state.last_updated)),
            None => (RecordTable::new(), None),
        };
        self.table = Some(table);
        self.last_updated = last_updated;
        self.dirty = false;
        Ok(())
    }

    fn recorded(&self, label: &str) -> Result<BTreeSet<String>> {
        Ok(self.loaded()?.get(label))
    }

    fn record_removed(&mut self, label: &str, record: &str) -> Result<()> {
        if !self.loaded_mut()?.remove(label, record) {
            return Err(Error::provider(format!(
                "no record '{record}' under '{label}' in {}",
                self.path.display()
            )));
        }
        self.dirty = true;
        Ok(())
    }

    fn record_installed(&mut self, label: &str, dependency: &Dependency) -> Result<()> {
        self.loaded_mut()?.replace(label, dependency);
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let now = Utc::now();
        let state = StateFile {
            last_updated: now,
            records: self.loaded()?.clone().into_map(),
        };
        let content = toml::to_string_pretty(&state)
            .map_err(|e| Error::provider(format!("failed to serialize state: {e}")))?;

        // Write next to the target and rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|e| {
                Error::provider(format!("failed to write {}: {e}", self.path.display()))
            })?;

        log::debug!("Saved state to {}", self.path.display());
        self.last_updated = Some(now);
        self.dirty = false;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
