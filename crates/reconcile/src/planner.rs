//! Reconciliation planner - obsolete and incoming sets per category

use crate::collection::DependencyCollection;
use crate::error::Result;
use crate::provider::StateProvider;
use brewkit::{Category, Dependency};
use serde::Serialize;
use std::collections::BTreeSet;

/// Recorded identifiers to uninstall for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObsoletePlan {
    pub category: Category,
    pub records: BTreeSet<String>,
}

impl ObsoletePlan {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Dependencies to install for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingPlan {
    pub category: Category,
    pub dependencies: BTreeSet<Dependency>,
}

impl IncomingPlan {
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }
}

/// Compute what is recorded for the collection but no longer declared
pub fn obsolete<P: StateProvider + ?Sized>(
    provider: &P,
    collection: &DependencyCollection,
) -> Result<ObsoletePlan> {
    let records = provider.find_all_obsolete_deps(&collection.resolve(), collection.label())?;
    log::debug!(
        "{} obsolete record(s) for '{}'",
        records.len(),
        collection.label()
    );
    Ok(ObsoletePlan {
        category: collection.category(),
        records,
    })
}

/// Compute what is declared in the collection but not yet recorded
pub fn incoming<P: StateProvider + ?Sized>(
    provider: &P,
    collection: &DependencyCollection,
) -> Result<IncomingPlan> {
    let dependencies =
        provider.find_all_incoming_deps(&collection.resolve(), collection.label())?;
    log::debug!(
        "{} incoming dependenc(ies) for '{}'",
        dependencies.len(),
        collection.label()
    );
    Ok(IncomingPlan {
        category: collection.category(),
        dependencies,
    })
}

/// Read-only view of everything an apply would change
///
/// All four sets are computed at once against the current record. An
/// apply run computes the incoming sets later, after the update stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub obsolete: Vec<ObsoletePlan>,
    pub incoming: Vec<IncomingPlan>,
}

impl Preview {
    /// Total number of uninstalls and installs
    pub fn total(&self) -> usize {
        self.obsolete.iter().map(ObsoletePlan::len).sum::<usize>()
            + self.incoming.iter().map(IncomingPlan::len).sum::<usize>()
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Preview an apply without touching anything
///
/// Collections are resolved without transitive requirements, as an apply
/// would.
pub fn preview<P: StateProvider + ?Sized>(
    provider: &P,
    collections: &[&DependencyCollection],
) -> Result<Preview> {
    let mut obsolete_plans = Vec::with_capacity(collections.len());
    let mut incoming_plans = Vec::with_capacity(collections.len());

    for collection in collections {
        let mut direct = (*collection).clone();
        direct.set_transitive(false);
        obsolete_plans.push(obsolete(provider, &direct)?);
        incoming_plans.push(incoming(provider, &direct)?);
    }

    Ok(Preview {
        obsolete: obsolete_plans,
        incoming: incoming_plans,
    })
}
