//! State provider trait and in-memory implementation
//!
//! A provider owns the record of what was installed by previous runs,
//! grouped by collection label. Records are `group:name:version` identifiers.

use crate::error::{Error, Result};
use brewkit::{Dependency, RecordedId};
use std::collections::{BTreeMap, BTreeSet};

/// Store of previously applied dependencies
///
/// Implement this trait to back reconciliation with a datastore. The
/// provider is only ever used from one thread, one call at a time.
pub trait StateProvider {
    /// Prepare the store for a run
    ///
    /// Return [`Error::ProviderInit`] if the store is unreachable or corrupt.
    fn init(&mut self) -> Result<()>;

    /// Recorded identifiers for a label
    fn recorded(&self, label: &str) -> Result<BTreeSet<String>>;

    /// Forget one identifier after it was uninstalled
    fn record_removed(&mut self, label: &str, record: &str) -> Result<()>;

    /// Remember a dependency after it was installed
    ///
    /// Replaces any existing record with the same name under the label.
    fn record_installed(&mut self, label: &str, dependency: &Dependency) -> Result<()>;

    /// Persist pending changes
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Recorded identifiers whose package is no longer declared
    ///
    /// At most one identifier is returned per package name, since one
    /// uninstall removes every recorded version. Identifiers that do not
    /// parse are returned too, so the uninstall stage reports them instead
    /// of silently keeping them.
    fn find_all_obsolete_deps(
        &self,
        declared: &BTreeSet<Dependency>,
        label: &str,
    ) -> Result<BTreeSet<String>> {
        let names: BTreeSet<&str> = declared.iter().map(|d| d.name.as_str()).collect();
        let mut seen = BTreeSet::new();
        Ok(self
            .recorded(label)?
            .into_iter()
            .filter(|record| match RecordedId::parse(record) {
                Ok(id) => !names.contains(id.name) && seen.insert(id.name.to_string()),
                Err(_) => true,
            })
            .collect())
    }

    /// Declared dependencies that have no record yet
    fn find_all_incoming_deps(
        &self,
        declared: &BTreeSet<Dependency>,
        label: &str,
    ) -> Result<BTreeSet<Dependency>> {
        let recorded = self.recorded(label)?;
        let names: BTreeSet<&str> = recorded
            .iter()
            .filter_map(|record| RecordedId::parse(record).ok())
            .map(|id| id.name)
            .collect();
        Ok(declared
            .iter()
            .filter(|d| !names.contains(d.name.as_str()))
            .cloned()
            .collect())
    }
}

impl<P: StateProvider + ?Sized> StateProvider for &mut P {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn recorded(&self, label: &str) -> Result<BTreeSet<String>> {
        (**self).recorded(label)
    }

    fn record_removed(&mut self, label: &str, record: &str) -> Result<()> {
        (**self).record_removed(label, record)
    }

    fn record_installed(&mut self, label: &str, dependency: &Dependency) -> Result<()> {
        (**self).record_installed(label, dependency)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn find_all_obsolete_deps(
        &self,
        declared: &BTreeSet<Dependency>,
        label: &str,
    ) -> Result<BTreeSet<String>> {
        (**self).find_all_obsolete_deps(declared, label)
    }

    fn find_all_incoming_deps(
        &self,
        declared: &BTreeSet<Dependency>,
        label: &str,
    ) -> Result<BTreeSet<Dependency>> {
        (**self).find_all_incoming_deps(declared, label)
    }
}

impl<P: StateProvider + ?Sized> StateProvider for Box<P> {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn recorded(&self, label: &str) -> Result<BTreeSet<String>> {
        (**self).recorded(label)
    }

    fn record_removed(&mut self, label: &str, record: &str) -> Result<()> {
        (**self).record_removed(label, record)
    }

    fn record_installed(&mut self, label: &str, dependency: &Dependency) -> Result<()> {
        (**self).record_installed(label, dependency)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn find_all_obsolete_deps(
        &self,
        declared: &BTreeSet<Dependency>,
        label: &str,
    ) -> Result<BTreeSet<String>> {
        (**self).find_all_obsolete_deps(declared, label)
    }

    fn find_all_incoming_deps(
        &self,
        declared: &BTreeSet<Dependency>,
        label: &str,
    ) -> Result<BTreeSet<Dependency>> {
        (**self).find_all_incoming_deps(declared, label)
    }
}

/// Records kept in memory, grouped by label
///
/// Shared by [`MemoryProvider`] and file-backed providers that load and
/// save the whole table at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    records: BTreeMap<String, BTreeSet<String>>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(records: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { records }
    }

    pub fn into_map(self) -> BTreeMap<String, BTreeSet<String>> {
        self.records
    }

    pub fn get(&self, label: &str) -> BTreeSet<String> {
        self.records.get(label).cloned().unwrap_or_default()
    }

    pub fn insert(&mut self, label: &str, record: impl Into<String>) {
        self.records
            .entry(label.to_string())
            .or_default()
            .insert(record.into());
    }

    /// Forget `record` and every other record of the same package
    ///
    /// Returns false if `record` itself was not present.
    pub fn remove(&mut self, label: &str, record: &str) -> bool {
        let Some(set) = self.records.get_mut(label) else {
            return false;
        };
        let removed = set.remove(record);
        if removed && let Ok(id) = RecordedId::parse(record) {
            set.retain(|other| {
                RecordedId::parse(other)
                    .map(|o| o.name != id.name)
                    .unwrap_or(true)
            });
        }
        if set.is_empty() {
            self.records.remove(label);
        }
        removed
    }

    /// Record `dependency`, dropping other records with the same name
    pub fn replace(&mut self, label: &str, dependency: &Dependency) {
        let set = self.records.entry(label.to_string()).or_default();
        set.retain(|record| {
            RecordedId::parse(record)
                .map(|id| id.name != dependency.name)
                .unwrap_or(true)
        });
        set.insert(dependency.coordinate());
    }
}

/// Provider that keeps records in memory
///
/// Useful for tests and dry runs: seed it from a real store and nothing
/// is ever persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    table: RecordTable,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider seeded with existing records
    pub fn from_table(table: RecordTable) -> Self {
        Self { table }
    }

    /// Add records under a label
    pub fn with_records<I, S>(mut self, label: &str, records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for record in records {
            self.table.insert(label, record);
        }
        self
    }

}

impl StateProvider for MemoryProvider {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn recorded(&self, label: &str) -> Result<BTreeSet<String>> {
        Ok(self.table.get(label))
    }

    fn record_removed(&mut self, label: &str, record: &str) -> Result<()> {
        if !self.table.remove(label, record) {
            return Err(Error::provider(format!(
                "no record '{record}' under '{label}'"
            )));
        }
        Ok(())
    }

    fn record_installed(&mut self, label: &str, dependency: &Dependency) -> Result<()> {
        self.table.replace(label, dependency);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared(names: &[&str]) -> BTreeSet<Dependency> {
        names.iter().map(|n| Dependency::formula(*n)).collect()
    }

    #[test]
    fn test_obsolete_is_recorded_minus_declared() {
        let provider =
            MemoryProvider::new().with_records("brew", ["brew:git:2.40", "brew:curl:8.0"]);
        let obsolete = provider
            .find_all_obsolete_deps(&declared(&["git", "wget"]), "brew")
            .unwrap();
        assert_eq!(obsolete, BTreeSet::from(["brew:curl:8.0".to_string()]));
    }

    #[test]
    fn test_incoming_is_declared_minus_recorded() {
        let provider =
            MemoryProvider::new().with_records("brew", ["brew:git:2.40", "brew:curl:8.0"]);
        let incoming = provider
            .find_all_incoming_deps(&declared(&["git", "wget"]), "brew")
            .unwrap();
        assert_eq!(incoming, declared(&["wget"]));
    }

    #[test]
    fn test_version_change_is_not_a_diff() {
        let provider = MemoryProvider::new().with_records("brew", ["brew:git:2.39"]);
        let mut set = BTreeSet::new();
        set.insert(Dependency::formula("git").with_version("2.40"));
        assert!(provider.find_all_obsolete_deps(&set, "brew").unwrap().is_empty());
        assert!(provider.find_all_incoming_deps(&set, "brew").unwrap().is_empty());
    }

    #[test]
    fn test_labels_are_isolated() {
        let provider = MemoryProvider::new().with_records("cask", ["cask:firefox:latest"]);
        assert!(
            provider
                .find_all_obsolete_deps(&BTreeSet::new(), "brew")
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            provider
                .find_all_obsolete_deps(&BTreeSet::new(), "cask")
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_malformed_records_are_obsolete() {
        let provider = MemoryProvider::new().with_records("brew", ["git"]);
        let obsolete = provider
            .find_all_obsolete_deps(&declared(&["git"]), "brew")
            .unwrap();
        assert_eq!(obsolete, BTreeSet::from(["git".to_string()]));
    }

    #[test]
    fn test_record_installed_replaces_same_name() {
        let mut provider = MemoryProvider::new().with_records("brew", ["brew:git:2.39"]);
        provider
            .record_installed("brew", &Dependency::formula("git").with_version("2.40"))
            .unwrap();
        assert_eq!(
            provider.recorded("brew").unwrap(),
            BTreeSet::from(["brew:git:2.40".to_string()])
        );
    }

    #[test]
    fn test_record_removed() {
        let mut provider = MemoryProvider::new().with_records("brew", ["brew:curl:8.0"]);
        provider.record_removed("brew", "brew:curl:8.0").unwrap();
        assert!(provider.recorded("brew").unwrap().is_empty());
        assert!(provider.record_removed("brew", "brew:curl:8.0").is_err());
    }

    #[test]
    fn test_table_drops_empty_labels() {
        let mut table = RecordTable::new();
        table.insert("cask", "cask:firefox:latest");
        assert!(table.remove("cask", "cask:firefox:latest"));
        assert!(table.into_map().is_empty());
    }

    #[test]
    fn test_duplicate_versions_are_obsolete_once() {
        let provider = MemoryProvider::new().with_records("brew", ["brew:git:1", "brew:git:2"]);
        let obsolete = provider
            .find_all_obsolete_deps(&BTreeSet::new(), "brew")
            .unwrap();
        assert_eq!(obsolete, BTreeSet::from(["brew:git:1".to_string()]));
    }

    #[test]
    fn test_remove_drops_every_version_of_the_package() {
        let mut table = RecordTable::new();
        table.insert("brew", "brew:git:1");
        table.insert("brew", "brew:git:2");
        table.insert("brew", "brew:wget:latest");

        assert!(table.remove("brew", "brew:git:1"));
        assert_eq!(table.get("brew"), BTreeSet::from(["brew:wget:latest".to_string()]));
        assert!(!table.remove("brew", "brew:git:2"));
    }
}
