//! Centralized path resolution for brewsync
//!
//! # Environment Variables
//!
//! - `BREWSYNC_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/brewsync`)
//! - `BREWSYNC_STATE_DIR` - Override state directory
//! - `BREWSYNC_MANIFEST` - Manifest file (read by the CLI, see `cli.rs`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `BREWSYNC_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/brewsync` (if set)
//! 3. `~/.config/brewsync`
//!
//! For state_dir():
//! 1. `BREWSYNC_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/brewsync` (if set)
//! 3. `~/.local/state/brewsync`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "BREWSYNC_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "BREWSYNC_STATE_DIR";

/// Environment variable for the manifest path
pub const ENV_MANIFEST: &str = "BREWSYNC_MANIFEST";

/// Default manifest file name inside the config directory
pub const MANIFEST_FILE: &str = "brewsync.toml";

/// Default state file name inside the state directory
pub const STATE_FILE: &str = "state.toml";

/// Known Homebrew installation roots, in lookup order
const HOMEBREW_ROOTS: [&str; 3] = [
    "/opt/homebrew",              // Apple Silicon
    "/usr/local",                 // Intel
    "/home/linuxbrew/.linuxbrew", // Linux
];

/// Get the brewsync config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("brewsync");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("brewsync");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Get the brewsync state directory path
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join("brewsync");
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join("brewsync");
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// Resolve the manifest path: explicit path, else `<config_dir>/brewsync.toml`
pub fn manifest_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(config_dir()?.join(MANIFEST_FILE)),
    }
}

/// Default location of the file-backed state store
pub fn default_state_file() -> Result<PathBuf> {
    Ok(state_dir()?.join(STATE_FILE))
}

/// First Homebrew root that exists on this machine
pub fn detect_homebrew_root() -> PathBuf {
    HOMEBREW_ROOTS
        .iter()
        .map(PathBuf::from)
        .find(|root| root.join(brewkit::BREW_BIN).exists())
        .unwrap_or_else(|| PathBuf::from(HOMEBREW_ROOTS[0]))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
