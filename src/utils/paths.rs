//! Path Utilities
//!
//! Resolves the MindMate data directory (`~/.mindmate/`).

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the MindMate directory (~/.mindmate/)
pub fn mindmate_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".mindmate"))
}

/// Get the config file path (~/.mindmate/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(mindmate_dir()?.join("config.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
