//! Core types for Homebrew package management.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version placeholder used when a dependency does not pin one.
pub const LATEST: &str = "latest";

/// Category of Homebrew package.
///
/// The category decides the command shape for install and uninstall and
/// which declared collection a dependency belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Homebrew formula (CLI tool)
    Formula,
    /// Homebrew cask (GUI application)
    Cask,
}

impl Category {
    /// All categories, in processing order.
    pub const ALL: [Category; 2] = [Category::Formula, Category::Cask];

    /// Label used for the declared collection and recorded identifiers.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Formula => "brew",
            Category::Cask => "cask",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A declared package.
///
/// Identity for diffing is `(category, name)`. The version is informational
/// and only ends up in the recorded identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Package category
    pub category: Category,
    /// Package name (e.g., "git", "firefox")
    pub name: String,
    /// Declared version, or [`LATEST`]
    pub version: String,
}

impl Dependency {
    /// Create a dependency with the given category and name.
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
            version: LATEST.to_string(),
        }
    }

    /// Create a formula dependency.
    pub fn formula(name: impl Into<String>) -> Self {
        Self::new(Category::Formula, name)
    }

    /// Create a cask dependency.
    pub fn cask(name: impl Into<String>) -> Self {
        Self::new(Category::Cask, name)
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Identifier used when recording this dependency (`group:name:version`).
    pub fn coordinate(&self) -> String {
        format!("{}:{}:{}", self.category.label(), self.name, self.version)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.category)
    }
}

/// A recorded identifier split into its `group:name:version` parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedId<'a> {
    /// Group, normally the category label
    pub group: &'a str,
    /// Package name
    pub name: &'a str,
    /// Recorded version
    pub version: &'a str,
}

impl<'a> RecordedId<'a> {
    /// Parse a recorded identifier.
    ///
    /// Exactly three non-empty colon-delimited fields are accepted.
    pub fn parse(record: &'a str) -> Result<Self> {
        let malformed = || Error::MalformedRecord {
            record: record.to_string(),
        };

        let mut parts = record.split(':');
        let (Some(group), Some(name), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        if group.is_empty() || name.is_empty() || version.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            group,
            name,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::Formula.label(), "brew");
        assert_eq!(Category::Cask.label(), "cask");
        assert_eq!(Category::Cask.to_string(), "cask");
    }

    #[test]
    fn test_dependency_coordinate() {
        assert_eq!(Dependency::formula("git").coordinate(), "brew:git:latest");
        assert_eq!(
            Dependency::cask("firefox").with_version("128.0").coordinate(),
            "cask:firefox:128.0"
        );
    }

    #[test]
    fn test_version_is_separate_from_name() {
        let a = Dependency::formula("git");
        let b = Dependency::formula("git").with_version("2.40.0");
        assert_ne!(a, b);
        assert_eq!(a.name, b.name);
        assert_eq!(a.category, b.category);
    }

    #[test]
    fn test_parse_recorded_id() {
        let id = RecordedId::parse("group:foo:1.2.3").unwrap();
        assert_eq!(id.group, "group");
        assert_eq!(id.name, "foo");
        assert_eq!(id.version, "1.2.3");
    }

    #[test]
    fn test_parse_recorded_id_malformed() {
        for record in ["foo", "group:foo", "a:b:c:d", "group::1.0", ":foo:1.0", "group:foo:", ""] {
            let err = RecordedId::parse(record).unwrap_err();
            assert!(
                matches!(err, Error::MalformedRecord { .. }),
                "expected malformed for {record:?}"
            );
        }
    }
}
