use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "idle-shutdown";

/// Runtime directory for the lock and log files, created on demand.
pub fn base_dir() -> Result<PathBuf> {
    let root = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Could not find a data or home directory"))?;
    base_dir_in(&root)
}

pub fn base_dir_in(root: &Path) -> Result<PathBuf> {
    let path = root.join(APP_DIR);
    if !path.exists() {
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(path)
}

pub fn lock_path(base: &Path) -> PathBuf {
    base.join("idle-shutdown.lock")
}

pub fn log_path(base: &Path) -> PathBuf {
    base.join("idle-shutdown.log")
}
