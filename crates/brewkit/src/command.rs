//! Building brew invocations.
//!
//! An [`Invocation`] is a complete, immutable description of one brew call.
//! [`CommandBuilder::build`] is a pure function of the operation and the
//! category; the program and working directory come from the installation
//! root and are the same for every invocation of a run.

use crate::error::Result;
use crate::types::{Category, Dependency, RecordedId};
use std::fmt;
use std::path::{Path, PathBuf};

/// Location of the brew executable relative to the installation root.
pub const BREW_BIN: &str = "bin/brew";

/// An operation against the package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Update Homebrew itself (`brew update`)
    UpdateSelf,
    /// Upgrade every installed package (`brew upgrade`)
    UpgradeAll,
    /// Remove one package by name
    Uninstall(String),
    /// Install one package by name
    Install(String),
}

impl Operation {
    /// Uninstall the package named by a recorded `group:name:version` identifier.
    pub fn uninstall_record(record: &str) -> Result<Self> {
        let id = RecordedId::parse(record)?;
        Ok(Self::Uninstall(id.name.to_string()))
    }

    /// Install a declared dependency.
    pub fn install(dependency: &Dependency) -> Self {
        Self::Install(dependency.name.clone())
    }

    /// The package this operation targets, if any.
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::Uninstall(name) | Self::Install(name) => Some(name),
            Self::UpdateSelf | Self::UpgradeAll => None,
        }
    }

    fn args(&self, category: Category) -> Vec<String> {
        let cask = category == Category::Cask;
        let mut args = Vec::with_capacity(3);
        match self {
            Self::UpdateSelf => args.push("update".to_string()),
            Self::UpgradeAll => args.push("upgrade".to_string()),
            Self::Uninstall(name) | Self::Install(name) => {
                if cask {
                    args.push("cask".to_string());
                }
                let verb = if matches!(self, Self::Uninstall(_)) {
                    "uninstall"
                } else {
                    "install"
                };
                args.push(verb.to_string());
                args.push(name.clone());
            }
        }
        args
    }
}

/// A single brew call: program, working directory and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
}

impl Invocation {
    /// Path of the executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Directory the process runs in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Argument vector, without the program.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .program
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.program.to_string_lossy());
        write!(f, "{name}")?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Builds invocations against one Homebrew installation.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    root: PathBuf,
    program: PathBuf,
}

impl CommandBuilder {
    /// Create a builder for the installation at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let program = root.join(BREW_BIN);
        Self { root, program }
    }

    /// Installation root (also the working directory).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the brew executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the invocation for `operation` in `category`.
    ///
    /// `UpdateSelf` and `UpgradeAll` ignore the category.
    pub fn build(&self, operation: &Operation, category: Category) -> Invocation {
        Invocation {
            program: self.program.clone(),
            working_dir: self.root.clone(),
            args: operation.args(category),
        }
    }
}
