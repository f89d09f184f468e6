//! Player inventory snapshots.
//!
//! - [`progression`]: point total <-> level and progress
//! - [`codec`]: slot arrays <-> durable text
//! - [`store`]: SQLite-backed snapshot records with id and timestamp indexes
//! - [`backup`]: capture from and restore onto a live player
//!
//! The game server plugs in through the traits in [`host`].

pub mod backup;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod host;
pub mod platform;
pub mod profile;
pub mod progression;
pub mod report;
pub mod store;
pub mod util;

pub use backup::BackupService;
pub use error::{Error, Result};
pub use store::{Selector, SlotLayout, SnapshotId, SnapshotRecord, Store};
