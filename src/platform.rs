use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::{Error, Result};

const APP_NAME: &str = "invbackup";
const DB_FILE: &str = "inventory.db";
const CONFIG_FILE: &str = "config.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Default database path (~/.local/share/invbackup/inventory.db or platform equivalent)
pub fn default_db_path() -> Result<PathBuf> {
    let dirs = project_dirs().ok_or(Error::DataDir("data"))?;
    Ok(dirs.data_dir().join(DB_FILE))
}

/// Default config path (~/.config/invbackup/config.toml or platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
