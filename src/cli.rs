use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "invbackup")]
#[command(about = "Back up and restore player inventories")]
#[command(version)]
pub struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (defaults to config.toml in the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log what the store is doing
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the snapshots of a player
    List(ListArgs),

    /// Snapshot a player profile
    Backup(BackupArgs),

    /// Restore a snapshot onto a player profile
    Restore(RestoreArgs),

    /// Remove one snapshot of a player
    Remove(RemoveArgs),

    /// Remove every snapshot of a player
    Purge(PurgeArgs),

    /// Print selector completions for a player, one per line
    Suggest(SuggestArgs),
}

#[derive(Parser)]
pub struct ListArgs {
    /// Player uuid
    pub owner: Uuid,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct BackupArgs {
    /// Player profile (JSON)
    pub profile: PathBuf,
}

#[derive(Parser)]
pub struct RestoreArgs {
    /// Player profile (JSON), rewritten in place
    pub profile: PathBuf,

    /// Snapshot id or "latest"
    #[arg(default_value = "latest")]
    pub selector: String,
}

#[derive(Parser)]
pub struct RemoveArgs {
    /// Player uuid
    pub owner: Uuid,

    /// Snapshot id or "latest"
    #[arg(default_value = "latest")]
    pub selector: String,
}

#[derive(Parser)]
pub struct PurgeArgs {
    /// Player uuid
    pub owner: Uuid,
}

#[derive(Parser)]
pub struct SuggestArgs {
    /// Player uuid
    pub owner: Uuid,
}
