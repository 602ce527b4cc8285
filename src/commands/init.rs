//! `brewsync init` - write a starter manifest

use anyhow::{Context as _, Result, bail};
use std::fs;
use std::path::Path;

use crate::Context;
use crate::commands;
use crate::config::STARTER_MANIFEST;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context, force: bool) -> Result<()> {
    let path = paths::manifest_path(ctx.manifest.as_deref())?;
    write_starter(&path, force)?;

    ui::success(&format!("Wrote {}", path.display()));
    if !ctx.quiet {
        ui::dim("Add formulae under [brew] and casks under [cask], then run `brewsync plan`");
    }

    // A fresh manifest should at least load.
    commands::load_manifest(ctx).map(|_| ())
}

fn write_starter(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    fs::write(path, STARTER_MANIFEST)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_starter_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("brewsync.toml");

        write_starter(&path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_MANIFEST);
    }

    #[test]
    fn test_write_starter_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brewsync.toml");
        fs::write(&path, "[brew]\n").unwrap();

        let err = write_starter(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[brew]\n");

        write_starter(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_MANIFEST);
    }
}
