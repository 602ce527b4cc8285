//! Core types for reconciliation runs

use brewkit::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stage of an apply run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Init,
    UninstallFormula,
    UninstallCask,
    UpdateSelf,
    UpgradeAll,
    InstallFormula,
    InstallCask,
    Done,
}

impl Stage {
    /// Every stage, in the order they run
    pub const ALL: [Stage; 8] = [
        Stage::Init,
        Stage::UninstallFormula,
        Stage::UninstallCask,
        Stage::UpdateSelf,
        Stage::UpgradeAll,
        Stage::InstallFormula,
        Stage::InstallCask,
        Stage::Done,
    ];

    /// Uninstall stage for a category
    pub fn uninstall(category: Category) -> Self {
        match category {
            Category::Formula => Self::UninstallFormula,
            Category::Cask => Self::UninstallCask,
        }
    }

    /// Install stage for a category
    pub fn install(category: Category) -> Self {
        match category {
            Category::Formula => Self::InstallFormula,
            Category::Cask => Self::InstallCask,
        }
    }

    /// Short machine-friendly name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::UninstallFormula => "uninstall-formula",
            Self::UninstallCask => "uninstall-cask",
            Self::UpdateSelf => "update-self",
            Self::UpgradeAll => "upgrade-all",
            Self::InstallFormula => "install-formula",
            Self::InstallCask => "install-cask",
            Self::Done => "done",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Init => "Opening state store",
            Self::UninstallFormula => "Removing obsolete formulae",
            Self::UninstallCask => "Removing obsolete casks",
            Self::UpdateSelf => "Updating Homebrew",
            Self::UpgradeAll => "Upgrading installed packages",
            Self::InstallFormula => "Installing new formulae",
            Self::InstallCask => "Installing new casks",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A package that was removed or installed during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub category: Category,
    pub name: String,
}

impl Change {
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }
}

/// Summary of an apply run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySummary {
    pub removed: Vec<Change>,
    pub installed: Vec<Change>,
    pub updated: bool,
    pub upgraded: bool,
}

impl ApplySummary {
    /// Number of packages removed or installed
    pub fn total_changes(&self) -> usize {
        self.removed.len() + self.installed.len()
    }

    /// Check if no package was removed or installed
    pub fn is_noop(&self) -> bool {
        self.total_changes() == 0
    }

    /// Names removed in one category
    pub fn removed_in(&self, category: Category) -> Vec<&str> {
        names_in(&self.removed, category)
    }

    /// Names installed in one category
    pub fn installed_in(&self, category: Category) -> Vec<&str> {
        names_in(&self.installed, category)
    }
}

fn names_in(changes: &[Change], category: Category) -> Vec<&str> {
    changes
        .iter()
        .filter(|c| c.category == category)
        .map(|c| c.name.as_str())
        .collect()
}
