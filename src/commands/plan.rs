//! `brewsync plan` - preview what apply would change

use anyhow::{Context as _, Result};

use crate::Context;
use crate::cli::PlanArgs;
use crate::commands;
use crate::ui;

pub fn run(ctx: &Context, args: PlanArgs) -> Result<()> {
    let (_, manifest) = commands::load_manifest(ctx)?;
    let (formulae, casks) = manifest.collections()?;
    let provider = commands::init_provider(&manifest)?;

    let preview = reconcile::preview(provider.as_ref(), &[&formulae, &casks])?;

    if args.json {
        let json = serde_json::to_string_pretty(&preview).context("Failed to serialize plan")?;
        println!("{json}");
        return Ok(());
    }

    ui::header("Plan");
    if !preview.has_changes() {
        ui::success("Nothing to install or uninstall");
        return Ok(());
    }

    commands::print_preview(&preview);
    println!();
    ui::info(&format!(
        "{} (run `brewsync apply` to make them)",
        ui::count(preview.total(), "change")
    ));
    Ok(())
}
