pub mod apply;
pub mod init;
pub mod plan;
pub mod status;

use anyhow::{Context as _, Result};
use brewkit::Category;
use colored::Colorize;
use reconcile::{Event, EventSink, MemoryProvider, Preview, RecordTable, StateProvider};
use std::path::PathBuf;

use crate::Context;
use crate::config::{Manifest, StoreBackend};
use crate::paths;
use crate::state::FileProvider;
use crate::ui;

/// Resolve and load the manifest for this invocation
pub(crate) fn load_manifest(ctx: &Context) -> Result<(PathBuf, Manifest)> {
    let path = paths::manifest_path(ctx.manifest.as_deref())?;
    log::debug!("Loading manifest from {}", path.display());
    let manifest = Manifest::load(&path)?;
    Ok((path, manifest))
}

/// State store selected by the manifest
pub(crate) fn open_provider(manifest: &Manifest) -> Result<Box<dyn StateProvider>> {
    Ok(match manifest.store.backend {
        StoreBackend::File => Box::new(FileProvider::new(manifest.store_path()?)),
        StoreBackend::Memory => Box::new(MemoryProvider::new()),
    })
}

/// Open and initialize the state store
pub(crate) fn init_provider(manifest: &Manifest) -> Result<Box<dyn StateProvider>> {
    let mut provider = open_provider(manifest)?;
    provider
        .init()
        .context("Failed to open the state store")?;
    Ok(provider)
}

/// Copy the recorded state into memory so a run can mutate it freely
pub(crate) fn snapshot(provider: &dyn StateProvider) -> Result<MemoryProvider> {
    let mut table = RecordTable::new();
    for category in Category::ALL {
        for record in provider.recorded(category.label())? {
            table.insert(category.label(), record);
        }
    }
    Ok(MemoryProvider::from_table(table))
}

/// Print a preview as removal/addition lines
pub(crate) fn print_preview(preview: &Preview) {
    for plan in &preview.obsolete {
        for record in &plan.records {
            let name = brewkit::RecordedId::parse(record).map_or(record.as_str(), |id| id.name);
            ui::removal(plan.category, name);
        }
    }
    for plan in &preview.incoming {
        for dependency in &plan.dependencies {
            ui::addition(plan.category, &dependency.name);
        }
    }
}

// ============================================================================
// Terminal Events
// ============================================================================

/// Event sink that reports progress on the terminal
pub(crate) struct TerminalEvents {
    quiet: bool,
    step: usize,
}

impl TerminalEvents {
    pub fn new(quiet: bool) -> Self {
        Self { quiet, step: 0 }
    }
}

impl EventSink for TerminalEvents {
    fn emit(&mut self, event: &Event<'_>) {
        match event {
            Event::StageStarted(stage) => {
                log::debug!("Stage {stage} started");
            }
            Event::StageSkipped(stage) => {
                log::debug!("Stage {stage} skipped");
            }
            Event::Invoking { invocation, .. } => {
                self.step += 1;
                if !self.quiet {
                    println!(
                        "{} {}",
                        format!("[{}]", self.step).blue().bold(),
                        invocation.to_string().bold()
                    );
                }
            }
            Event::Completed { .. } => {}
            Event::Finished(summary) => {
                if self.quiet {
                    return;
                }
                println!();
                if summary.is_noop() {
                    ui::success("Already up to date");
                } else {
                    ui::success(&format!(
                        "Removed {}, installed {}",
                        ui::count(summary.removed.len(), "package"),
                        ui::count(summary.installed.len(), "package")
                    ));
                }
            }
        }
    }
}
