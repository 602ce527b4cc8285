//! `brewsync apply` - converge Homebrew to the manifest

use anyhow::{Context as _, Result};
use brewkit::{CommandBuilder, DryRunRunner, ProcessRunner, Runner};
use reconcile::{ApplySummary, DependencyCollection, Executor, StateProvider};

use crate::Context;
use crate::cli::ApplyArgs;
use crate::commands::{self, TerminalEvents};
use crate::config::Manifest;
use crate::ui;

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let (path, manifest) = commands::load_manifest(ctx)?;
    let (mut formulae, mut casks) = manifest.collections()?;
    let provider = commands::init_provider(&manifest)?;
    let builder = CommandBuilder::new(manifest.homebrew_root());

    if !ctx.quiet {
        ui::header(if args.dry_run {
            "Apply (dry run)"
        } else {
            "Apply"
        });
        ui::kv("manifest", &path.display().to_string());
        ui::kv("homebrew", &builder.root().display().to_string());
    }

    let preview = reconcile::preview(provider.as_ref(), &[&formulae, &casks])?;
    if !ctx.quiet {
        if preview.has_changes() {
            ui::section(&format!("Changes ({})", preview.total()));
            commands::print_preview(&preview);
        } else {
            ui::section("No package changes");
        }
        ui::dim("Homebrew will also be updated and all packages upgraded");
        println!();
    }

    if !args.dry_run && !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Proceed?")
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            ui::info("Aborted");
            return Ok(());
        }
    }

    let events = TerminalEvents::new(ctx.quiet);
    if args.dry_run {
        // Records change in the snapshot only; the store is never written.
        let snapshot = commands::snapshot(provider.as_ref())?;
        execute(builder, DryRunRunner, snapshot, events, &mut formulae, &mut casks)?;
    } else {
        let runner = process_runner(&manifest);
        if let Some(timeout) = runner.timeout() {
            log::debug!("Killing brew invocations after {}s", timeout.as_secs());
        }
        execute(builder, runner, provider, events, &mut formulae, &mut casks)?;
    }

    Ok(())
}

/// Real runner, honoring the manifest's timeout
fn process_runner(manifest: &Manifest) -> ProcessRunner {
    match manifest.timeout() {
        Some(timeout) => ProcessRunner::new().with_timeout(timeout),
        None => ProcessRunner::new(),
    }
}

fn execute<R, P>(
    builder: CommandBuilder,
    runner: R,
    provider: P,
    events: TerminalEvents,
    formulae: &mut DependencyCollection,
    casks: &mut DependencyCollection,
) -> Result<ApplySummary>
where
    R: Runner,
    P: StateProvider,
{
    let mut executor = Executor::new(builder, runner, provider, events);
    match executor.apply(formulae, casks) {
        Ok(summary) => Ok(summary),
        Err(err) => {
            if let reconcile::Error::Brew(brew_err) = err.root() {
                let category = brew_err.category();
                ui::error(category.description());
                ui::dim(category.advice());
            }
            Err(err.into())
        }
    }
}
