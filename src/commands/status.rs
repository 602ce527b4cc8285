//! `brewsync status` - recorded vs declared packages

use anyhow::{Context as _, Result};
use brewkit::{Category, RecordedId};
use colored::Colorize;
use reconcile::{DependencyCollection, StateProvider};

use crate::Context;
use crate::commands;
use crate::config::StoreBackend;
use crate::state::FileProvider;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let (path, manifest) = commands::load_manifest(ctx)?;
    let (formulae, casks) = manifest.collections()?;

    ui::header("brewsync status");
    ui::kv("manifest", &path.display().to_string());
    ui::kv("homebrew", &manifest.homebrew_root().display().to_string());

    match manifest.store.backend {
        StoreBackend::File => {
            let mut provider = FileProvider::new(manifest.store_path()?);
            provider
                .init()
                .context("Failed to open the state store")?;
            ui::kv("state", &provider.path().display().to_string());
            let updated = provider
                .last_updated()
                .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string());
            ui::kv("last applied", &updated);
            report(&provider, &[&formulae, &casks])
        }
        StoreBackend::Memory => {
            ui::kv("state", "memory (not persisted)");
            let provider = commands::init_provider(&manifest)?;
            report(provider.as_ref(), &[&formulae, &casks])
        }
    }
}

fn report(provider: &dyn StateProvider, collections: &[&DependencyCollection]) -> Result<()> {
    let preview = reconcile::preview(provider, collections)?;

    for (collection, (obsolete, incoming)) in collections
        .iter()
        .zip(preview.obsolete.iter().zip(&preview.incoming))
    {
        let category = collection.category();
        let recorded = provider.recorded(collection.label())?;

        ui::section(&category_title(category));
        ui::kv("declared", &collection.len().to_string());
        ui::kv("recorded", &recorded.len().to_string());

        if obsolete.is_empty() && incoming.is_empty() {
            println!("  {}", "in sync".green());
        } else {
            ui::kv("to uninstall", &obsolete.len().to_string().red().to_string());
            ui::kv("to install", &incoming.len().to_string().green().to_string());
        }

        for record in recorded.iter().filter(|r| RecordedId::parse(r).is_err()) {
            ui::warn(&format!("Malformed record '{record}' will fail the next apply"));
        }
    }

    println!();
    if preview.has_changes() {
        ui::dim("Run `brewsync plan` for details");
    }
    Ok(())
}

fn category_title(category: Category) -> String {
    match category {
        Category::Formula => "Formulae".to_string(),
        Category::Cask => "Casks".to_string(),
    }
}
