//! # Reconcile
//!
//! Converge a Homebrew installation to declared formula and cask collections.
//!
//! ## Core Concepts
//!
//! - **DependencyCollection**: the packages declared for one category
//! - **StateProvider**: the record of what previous runs installed
//! - **Planner**: obsolete (recorded, not declared) and incoming (declared,
//!   not recorded) sets per category
//! - **Executor**: uninstall obsolete, update and upgrade, install incoming
//!
//! ## Example
//!
//! ```no_run
//! use brewkit::{Category, CommandBuilder, ProcessRunner};
//! use reconcile::{DependencyCollection, Executor, LogEvents, MemoryProvider};
//!
//! let mut formulae = DependencyCollection::from_names(Category::Formula, ["git", "wget"]);
//! let mut casks = DependencyCollection::from_names(Category::Cask, ["firefox"]);
//! let provider = MemoryProvider::new().with_records("brew", ["brew:curl:8.0"]);
//!
//! let mut executor = Executor::new(
//!     CommandBuilder::new("/opt/homebrew"),
//!     ProcessRunner::new(),
//!     provider,
//!     LogEvents,
//! );
//! let summary = executor.apply(&mut formulae, &mut casks)?;
//! println!("{} change(s)", summary.total_changes());
//! # Ok::<(), reconcile::Error>(())
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`StateProvider`]: where applied dependencies are recorded
//! - [`brewkit::Runner`]: how invocations are executed
//! - [`EventSink`]: where progress is reported
//!
//! This keeps the engine free of any particular datastore, process model or
//! UI.

pub mod collection;
pub mod error;
pub mod events;
pub mod executor;
pub mod planner;
pub mod provider;
pub mod types;

// Re-export main types at crate root
pub use collection::DependencyCollection;
pub use error::{Error, Result};
pub use events::{Event, EventSink, LogEvents, NoEvents};
pub use executor::Executor;
pub use planner::{IncomingPlan, ObsoletePlan, Preview, incoming, obsolete, preview};
pub use provider::{MemoryProvider, RecordTable, StateProvider};
pub use types::{ApplySummary, Change, Stage};
