//! # brewkit
//!
//! Homebrew building blocks for declarative package convergence.
//!
//! This crate provides:
//! - [`Category`] and [`Dependency`], the declared package model
//! - [`RecordedId`], parsing of recorded `group:name:version` identifiers
//! - [`CommandBuilder`], turning an [`Operation`] into an immutable [`Invocation`]
//! - [`Runner`] implementations that execute invocations
//!
//! ## Example
//!
//! ```no_run
//! use brewkit::{Category, CommandBuilder, Operation, ProcessRunner, Runner};
//!
//! let builder = CommandBuilder::new("/opt/homebrew");
//! let runner = ProcessRunner::new();
//!
//! let install = builder.build(&Operation::Install("firefox".into()), Category::Cask);
//! assert_eq!(install.args(), ["cask", "install", "firefox"]);
//! runner.run(&install)?;
//! # Ok::<(), brewkit::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod command;
pub mod error;
pub mod types;

pub use backend::{DryRunRunner, ProcessRunner, Runner};
pub use command::{BREW_BIN, CommandBuilder, Invocation, Operation};
pub use error::{Error, ErrorCategory, Result};
pub use types::{Category, Dependency, LATEST, RecordedId};
