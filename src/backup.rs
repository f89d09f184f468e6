//! Capture and restore orchestration.
//!
//! `BackupService` is what the command and event layers talk to. It owns no
//! state beyond a shared handle on the store, so the same service can back a
//! death hook, a manual backup command and an autocomplete worker.

use std::sync::Arc;

use log::info;
use uuid::Uuid;

use crate::error::{Error, RestoreStage, Result};
use crate::host::{HostError, InventoryMut, InventoryView};
use crate::progression;
use crate::store::{Selector, SnapshotRecord, Store};

#[derive(Clone)]
pub struct BackupService {
    store: Arc<Store>,
}

impl BackupService {
    pub fn new(store: Arc<Store>) -> Self {
        BackupService { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Snapshot `owner`'s current inventory and points.
    ///
    /// Fails with [`Error::PointsOutOfRange`] when the owner holds more than
    /// [`progression::MAX_POINTS`], since such a total could not be restored.
    pub fn capture<P: InventoryView + ?Sized>(&self, owner: &P) -> Result<SnapshotRecord> {
        let points = owner.total_points().max(0);
        let points = u32::try_from(points).map_err(|_| Error::PointsOutOfRange {
            points,
            max: progression::MAX_POINTS,
        })?;

        self.store.insert(
            owner.owner_id(),
            owner.armor_slots(),
            owner.extra_slots(),
            owner.main_slots(),
            points,
        )
    }

    /// Write `record` back onto `target`.
    ///
    /// Slots go first (armor, extra, main), then progression. A failed write
    /// stops the restore and leaves the earlier writes in place.
    pub fn restore<T: InventoryMut + ?Sized>(&self, record: &SnapshotRecord, target: &mut T) -> Result<()> {
        let stage = |stage: RestoreStage| {
            move |e: HostError| Error::PartialRestore {
                stage,
                reason: e.to_string(),
            }
        };

        target
            .set_armor_slots(&record.armor_slots)
            .map_err(stage(RestoreStage::Armor))?;
        target
            .set_extra_slots(&record.extra_slots)
            .map_err(stage(RestoreStage::Extra))?;
        target
            .set_main_slots(&record.main_slots)
            .map_err(stage(RestoreStage::Main))?;
        progression::apply_points(target, i64::from(record.points))
            .map_err(stage(RestoreStage::Progression))?;

        info!("restored snapshot {} onto {}", record.id, record.owner_id);
        Ok(())
    }

    /// All snapshots of `owner_id`, newest first.
    pub fn list_snapshots(&self, owner_id: Uuid) -> Result<Vec<SnapshotRecord>> {
        let mut records = self.store.find_by_owner(owner_id)?;
        records.sort_by_key(|record| std::cmp::Reverse(record.timestamp));
        Ok(records)
    }

    pub fn capture_snapshot<P: InventoryView + ?Sized>(&self, owner: &P) -> Result<SnapshotRecord> {
        self.capture(owner)
    }

    /// Restore the snapshot `selector` names onto `target`.
    ///
    /// Returns the restored record, or `None` if the target has no such
    /// snapshot.
    pub fn restore_snapshot<T>(&self, target: &mut T, selector: Selector) -> Result<Option<SnapshotRecord>>
    where
        T: InventoryView + InventoryMut + ?Sized,
    {
        let Some(record) = self.store.resolve(target.owner_id(), selector)? else {
            return Ok(None);
        };

        self.restore(&record, target)?;
        Ok(Some(record))
    }

    /// Remove the snapshot `selector` names. Returns it if one was removed.
    pub fn remove_snapshot(&self, owner_id: Uuid, selector: Selector) -> Result<Option<SnapshotRecord>> {
        let Some(record) = self.store.resolve(owner_id, selector)? else {
            return Ok(None);
        };

        Ok(self.store.remove(&record)?.then_some(record))
    }

    pub fn purge_snapshots(&self, owner_id: Uuid) -> Result<usize> {
        self.store.remove_all_for_owner(owner_id)
    }

    /// Selector completions for `owner_id`: "latest", then ids oldest first.
    pub fn suggest_selectors(&self, owner_id: Uuid) -> Result<Vec<String>> {
        let mut records = self.store.find_by_owner(owner_id)?;
        records.sort_by_key(|record| record.id);

        let mut suggestions = Vec::with_capacity(records.len() + 1);
        suggestions.push(Selector::LATEST.to_string());
        suggestions.extend(records.iter().map(|record| record.id.to_string()));
        Ok(suggestions)
    }
}
