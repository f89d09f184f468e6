//! Terminal table for snapshot listings.
//!
//! Newest snapshot first, one row per snapshot with its id, local capture
//! time, level and how many slots held an item.

use uuid::Uuid;

use super::SnapshotSummary;

pub fn render(summaries: &[SnapshotSummary], owner: Uuid) -> String {
    if summaries.is_empty() {
        return format!("No snapshots found for {owner}.\n");
    }

    let mut output = format!("Snapshots of {owner}:\n");
    output.push_str(&format!(
        "{:<8} {:<20} {:>6} {:>8} {:>6}\n",
        "ID", "Time", "Level", "Points", "Items"
    ));
    output.push_str(&"-".repeat(52));
    output.push('\n');

    for summary in summaries {
        output.push_str(&format!(
            "{:<8} {:<20} {:>6} {:>8} {:>6}\n",
            summary.id.get(),
            summary.time,
            summary.level,
            summary.points,
            summary.items()
        ));
    }

    output
}
