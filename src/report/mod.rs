pub mod table;
pub mod json;

use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::host::occupied;
use crate::progression;
use crate::store::{SnapshotId, SnapshotRecord};
use crate::util::format_timestamp;

/// One line of a snapshot listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub id: SnapshotId,
    pub owner_id: Uuid,
    pub timestamp: i64,
    pub time: String,
    pub points: u32,
    pub level: u32,
    pub armor_items: usize,
    pub extra_items: usize,
    pub main_items: usize,
}

impl SnapshotSummary {
    pub fn of(record: &SnapshotRecord) -> Self {
        let (level, _) = progression::level_from_points(i64::from(record.points));
        SnapshotSummary {
            id: record.id,
            owner_id: record.owner_id,
            timestamp: record.timestamp,
            time: format_timestamp(record.timestamp),
            points: record.points,
            level,
            armor_items: occupied(&record.armor_slots),
            extra_items: occupied(&record.extra_slots),
            main_items: occupied(&record.main_slots),
        }
    }

    pub fn items(&self) -> usize {
        self.armor_items + self.extra_items + self.main_items
    }
}

pub fn print(records: &[SnapshotRecord], owner: Uuid, as_json: bool) -> Result<()> {
    let summaries: Vec<SnapshotSummary> = records.iter().map(SnapshotSummary::of).collect();

    if as_json {
        println!("{}", json::render(&summaries)?);
    } else {
        print!("{}", table::render(&summaries, owner));
    }
    Ok(())
}
