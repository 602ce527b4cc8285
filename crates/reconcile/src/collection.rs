//! Declared dependency collections
//!
//! A collection holds the direct dependencies declared for one category.
//! Each dependency may name packages it requires; with transitive resolution
//! enabled those are folded into the resolved set. Reconciliation always
//! runs with transitive resolution disabled so that exactly the declared set
//! is diffed and installed.

use brewkit::{Category, Dependency, LATEST};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Declared dependencies for one category
#[derive(Debug, Clone)]
pub struct DependencyCollection {
    label: String,
    category: Category,
    transitive: bool,
    dependencies: BTreeMap<String, Dependency>,
    requires: BTreeMap<String, Vec<String>>,
}

impl DependencyCollection {
    /// Create an empty collection labelled after its category
    pub fn new(category: Category) -> Self {
        Self::with_label(category, category.label())
    }

    /// Create an empty collection with a custom label
    pub fn with_label(category: Category, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            category,
            transitive: false,
            dependencies: BTreeMap::new(),
            requires: BTreeMap::new(),
        }
    }

    /// Create a collection from plain names
    pub fn from_names<I, S>(category: Category, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut collection = Self::new(category);
        for name in names {
            collection.declare(name.as_ref(), None, Vec::new());
        }
        collection
    }

    /// Declare a dependency
    ///
    /// Returns `false` without changing anything if the name is already
    /// declared.
    pub fn declare(&mut self, name: &str, version: Option<&str>, requires: Vec<String>) -> bool {
        if self.dependencies.contains_key(name) {
            return false;
        }

        let dependency =
            Dependency::new(self.category, name).with_version(version.unwrap_or(LATEST));
        self.dependencies.insert(name.to_string(), dependency);
        if !requires.is_empty() {
            self.requires.insert(name.to_string(), requires);
        }
        true
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    /// Toggle transitive resolution
    pub fn set_transitive(&mut self, transitive: bool) {
        self.transitive = transitive;
    }

    /// Number of direct dependencies
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Directly declared dependencies
    pub fn direct(&self) -> BTreeSet<Dependency> {
        self.dependencies.values().cloned().collect()
    }

    /// Resolved dependency set
    ///
    /// Without transitive resolution this is [`direct`](Self::direct).
    /// Otherwise required packages are added, following requirements of
    /// declared packages until no new name appears.
    pub fn resolve(&self) -> BTreeSet<Dependency> {
        let mut resolved = self.direct();
        if !self.transitive {
            return resolved;
        }

        let mut seen: BTreeSet<&str> = self.dependencies.keys().map(String::as_str).collect();
        let mut queue: VecDeque<&str> = seen.iter().copied().collect();

        while let Some(name) = queue.pop_front() {
            let Some(required) = self.requires.get(name) else {
                continue;
            };
            for req in required {
                if seen.insert(req.as_str()) {
                    resolved.insert(Dependency::new(self.category, req.as_str()));
                    queue.push_back(req.as_str());
                }
            }
        }

        resolved
    }
}
