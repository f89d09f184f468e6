use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::Result;
use crate::platform;
use crate::store::{SlotLayout, Store};

/// Contents of config.toml. Every key is optional.
///
/// ```toml
/// database = "/srv/minecraft/plugins/invbackup/inventory.db"
///
/// [layout]
/// armor = 4
/// extra = 1
/// main = 36
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
    pub layout: SlotLayout,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }
}

pub struct Config {
    pub database: PathBuf,
    pub layout: SlotLayout,
    pub verbose: bool,
}

impl Config {
    /// Resolve settings: command line first, then config file, then defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => match platform::default_config_path() {
                Some(path) if path.exists() => FileConfig::load(&path)?,
                _ => FileConfig::default(),
            },
        };

        Self::merge(cli.db.clone(), file, cli.verbose)
    }

    fn merge(db: Option<PathBuf>, file: FileConfig, verbose: bool) -> Result<Self> {
        let database = match db.or(file.database) {
            Some(path) => path,
            None => platform::default_db_path()?,
        };

        Ok(Config {
            database,
            layout: file.layout,
            verbose,
        })
    }

    pub fn open_store(&self) -> Result<Store> {
        Ok(Store::open(&self.database)?.with_layout(self.layout))
    }
}
