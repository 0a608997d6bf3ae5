//! Launcher data directory resolution.

use std::path::PathBuf;

use anyhow::Result;
use directories::BaseDirs;

/// The launcher's data directory (`~/.config/.SolsticeLauncher` or
/// `%APPDATA%/.SolsticeLauncher`), created if missing.
pub fn app_config_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Failed to determine user's config directory"))?;

    let config_dir = base_dirs.config_dir().join(".SolsticeLauncher");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}
