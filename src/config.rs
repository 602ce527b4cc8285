//! Manifest loading
//!
//! The manifest declares the Homebrew installation, the state store and the
//! `brew`/`cask` dependency collections:
//!
//! ```toml
//! [homebrew]
//! root = "/opt/homebrew"
//! timeout_secs = 1800
//!
//! [store]
//! backend = "file"
//!
//! [brew]
//! dependencies = ["git", { name = "node", version = "20", requires = ["icu4c"] }]
//!
//! [cask]
//! dependencies = ["firefox"]
//! ```

use anyhow::{Context, Result, bail};
use brewkit::Category;
use reconcile::DependencyCollection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

/// Starter manifest written by `brewsync init`
pub const STARTER_MANIFEST: &str = r#"# brewsync manifest

[homebrew]
# Installation root; brew is run as <root>/bin/brew from this directory.
# root = "/opt/homebrew"
# Kill a brew command that runs longer than this (0 disables).
timeout_secs = 0

[store]
# "file" keeps applied dependencies in the state directory,
# "memory" forgets them after every run.
backend = "file"
# path = "~/.local/state/brewsync/state.toml"

[brew]
dependencies = [
    "git",
]

[cask]
dependencies = []
"#;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub homebrew: HomebrewConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub brew: CollectionConfig,
    #[serde(default)]
    pub cask: CollectionConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomebrewConfig {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default)]
    pub transitive: bool,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

/// A dependency line: either a bare name or a table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        requires: Vec<String>,
    },
}

impl DependencyEntry {
    fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name.as_str(),
        }
    }
}

impl Manifest {
    /// Load a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| {
            format!(
                "Could not read manifest {} (run `brewsync init` to create one)",
                path.display()
            )
        })?;
        Self::parse(&content).with_context(|| format!("Invalid manifest: {}", path.display()))
    }

    /// Parse manifest TOML
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content).context("Failed to parse TOML")?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        for (label, config) in [("brew", &self.brew), ("cask", &self.cask)] {
            for entry in &config.dependencies {
                validate_field(label, "name", entry.name())?;
                if let DependencyEntry::Detailed {
                    version: Some(version),
                    ..
                } = entry
                {
                    validate_field(label, "version", version)?;
                }
            }
        }
        Ok(())
    }

    /// Build the formula and cask collections
    pub fn collections(&self) -> Result<(DependencyCollection, DependencyCollection)> {
        Ok((
            build_collection(Category::Formula, &self.brew)?,
            build_collection(Category::Cask, &self.cask)?,
        ))
    }

    /// Installation root, expanded, or the detected default
    pub fn homebrew_root(&self) -> PathBuf {
        self.homebrew
            .root
            .as_deref()
            .map(paths::expand)
            .unwrap_or_else(paths::detect_homebrew_root)
    }

    /// Per-invocation timeout, if enabled
    pub fn timeout(&self) -> Option<Duration> {
        self.homebrew
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Location of the file-backed store
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(paths::expand(path)),
            None => paths::default_state_file(),
        }
    }
}

/// Names and versions end up in `group:name:version` records
fn validate_field(label: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("[{label}] dependency {field} must not be empty");
    }
    if value.contains(':') || value.chars().any(char::is_whitespace) {
        bail!("[{label}] dependency {field} '{value}' must not contain ':' or whitespace");
    }
    Ok(())
}

fn build_collection(category: Category, config: &CollectionConfig) -> Result<DependencyCollection> {
    let mut collection = DependencyCollection::new(category);
    collection.set_transitive(config.transitive);

    for entry in &config.dependencies {
        let declared = match entry {
            DependencyEntry::Name(name) => collection.declare(name, None, Vec::new()),
            DependencyEntry::Detailed {
                name,
                version,
                requires,
            } => collection.declare(name, version.as_deref(), requires.clone()),
        };
        if !declared {
            bail!(
                "[{}] declares '{}' more than once",
                category.label(),
                entry.name()
            );
        }
    }

    Ok(collection)
}
