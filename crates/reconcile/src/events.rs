//! Observability sink for apply runs
//!
//! The executor reports what it does through an injected [`EventSink`]
//! instead of writing to a global logger, so callers decide how progress
//! is shown.

use crate::types::{ApplySummary, Stage};
use brewkit::{Category, Invocation};

/// Something that happened during an apply run
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// A stage began
    StageStarted(Stage),
    /// A stage had nothing to do
    StageSkipped(Stage),
    /// An invocation is about to run
    Invoking {
        stage: Stage,
        category: Option<Category>,
        package: Option<&'a str>,
        invocation: &'a Invocation,
    },
    /// An invocation finished successfully
    Completed {
        stage: Stage,
        category: Option<Category>,
        package: Option<&'a str>,
    },
    /// The run finished
    Finished(&'a ApplySummary),
}

/// Receives events from the executor
pub trait EventSink {
    fn emit(&mut self, event: &Event<'_>);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &Event<'_>) {
        (**self).emit(event);
    }
}

/// Sink that drops every event
pub struct NoEvents;

impl EventSink for NoEvents {
    fn emit(&mut self, _event: &Event<'_>) {}
}

/// Sink that forwards events to the `log` facade
pub struct LogEvents;

impl EventSink for LogEvents {
    fn emit(&mut self, event: &Event<'_>) {
        match event {
            Event::StageStarted(stage) => log::info!("{}", stage.description()),
            Event::StageSkipped(stage) => log::debug!("{stage}: nothing to do"),
            Event::Invoking {
                stage,
                package,
                invocation,
                ..
            } => log::info!(
                "[{stage}] {invocation}{}",
                package.map(|p| format!(" ({p})")).unwrap_or_default()
            ),
            Event::Completed { stage, package, .. } => {
                log::debug!("[{stage}] done{}", package.map(|p| format!(": {p}")).unwrap_or_default());
            }
            Event::Finished(summary) => log::info!(
                "Finished: {} removed, {} installed",
                summary.removed.len(),
                summary.installed.len()
            ),
        }
    }
}
