//! SQLite snapshot storage.
//!
//! One table, `snapshots`, one row per capture:
//! - id: AUTOINCREMENT, so ids only grow and are never reused
//! - ownerId: indexed, many snapshots per owner
//! - timestamp: uniquely indexed, two captures in the same millisecond conflict
//! - armorContents, extraContents, contents: codec text
//! - totalExperience: point total at capture time
//!
//! Writes are expected from one thread. Reads may come from any thread; the
//! connection sits behind a mutex so a shared `Store` is `Sync`.

pub mod record;

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::host::{ItemFormat, RawItems, Slots};
use crate::progression;
use record::{SnapshotDocument, SELECT_COLUMNS};

pub use record::{Selector, SlotLayout, SnapshotId, SnapshotRecord};

/// Source of capture timestamps.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ownerId TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            armorContents TEXT,
            extraContents TEXT,
            contents TEXT,
            totalExperience INTEGER NOT NULL CHECK (totalExperience >= 0)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_owner ON snapshots(ownerId)",
        [],
    )?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_snapshots_timestamp ON snapshots(timestamp)",
        [],
    )?;

    Ok(())
}

/// Database handle. Open once, share by reference or `Arc`.
pub struct Store {
    conn: Mutex<Connection>,
    layout: SlotLayout,
    format: Box<dyn ItemFormat>,
    clock: Box<dyn Clock>,
}

impl Store {
    /// Open or create the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("opened {} (journal_mode={mode})", path.display());

        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Store {
            conn: Mutex::new(conn),
            layout: SlotLayout::default(),
            format: Box::new(RawItems),
            clock: Box::new(SystemClock),
        })
    }

    pub fn with_layout(mut self, layout: SlotLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Item check applied to every blob read back.
    pub fn with_format(mut self, format: impl ItemFormat + 'static) -> Self {
        self.format = Box::new(format);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // a panic mid-statement leaves nothing half-applied in sqlite
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist a new snapshot stamped with the current time.
    pub fn insert(
        &self,
        owner_id: Uuid,
        armor_slots: Slots,
        extra_slots: Slots,
        main_slots: Slots,
        points: u32,
    ) -> Result<SnapshotRecord> {
        self.layout.check(&armor_slots, &extra_slots, &main_slots)?;
        if i64::from(points) > progression::MAX_POINTS {
            return Err(Error::PointsOutOfRange {
                points: i64::from(points),
                max: progression::MAX_POINTS,
            });
        }

        let timestamp = self.clock.now_millis();
        let doc = SnapshotDocument::encode(
            owner_id,
            timestamp,
            &armor_slots,
            &extra_slots,
            &main_slots,
            points,
        )?;

        let id = {
            let conn = self.conn();
            let inserted = conn.execute(
                "INSERT INTO snapshots (ownerId, timestamp, armorContents, extraContents, contents, totalExperience)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    doc.owner_id,
                    doc.timestamp,
                    doc.armor_contents,
                    doc.extra_contents,
                    doc.contents,
                    doc.total_experience
                ],
            );

            match inserted {
                Ok(_) => conn.last_insert_rowid(),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    warn!("snapshot for {owner_id} rejected: timestamp {timestamp} already taken");
                    return Err(Error::Conflict { timestamp });
                }
                Err(e) => return Err(e.into()),
            }
        };

        info!("stored snapshot {id} for {owner_id} ({points} points)");

        Ok(SnapshotRecord {
            id: SnapshotId::new(id),
            owner_id,
            timestamp,
            armor_slots,
            extra_slots,
            main_slots,
            points,
        })
    }

    /// Every snapshot of `owner_id`, decoded. Order is unspecified.
    pub fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<SnapshotRecord>> {
        let docs = {
            let conn = self.conn();
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {SELECT_COLUMNS} FROM snapshots WHERE ownerId = ?1"
            ))?;
            let docs = stmt
                .query_map(params![owner_id.hyphenated().to_string()], SnapshotDocument::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            docs
        };

        debug!("found {} snapshot(s) for {owner_id}", docs.len());
        docs.into_iter().map(|doc| self.decode(doc)).collect()
    }

    /// Exact lookup. Ids are positive; anything else is rejected.
    pub fn get_by_id(&self, id: i64) -> Result<Option<SnapshotRecord>> {
        if id <= 0 {
            return Err(Error::InvalidId(id));
        }

        let doc = self
            .conn()
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM snapshots WHERE id = ?1"),
                params![id],
                SnapshotDocument::from_row,
            )
            .optional()?;

        doc.map(|doc| self.decode(doc)).transpose()
    }

    /// The snapshot `selector` names for `owner_id`.
    ///
    /// An explicit id that belongs to another owner resolves to `None`.
    pub fn resolve(&self, owner_id: Uuid, selector: Selector) -> Result<Option<SnapshotRecord>> {
        match selector {
            Selector::Latest => Ok(self
                .find_by_owner(owner_id)?
                .into_iter()
                .max_by_key(|record| record.timestamp)),
            Selector::Id(id) => {
                let record = self.get_by_id(id)?;
                Ok(record.filter(|record| {
                    let owned = record.owner_id == owner_id;
                    if !owned {
                        warn!("snapshot {id} requested for {owner_id} belongs to {}", record.owner_id);
                    }
                    owned
                }))
            }
        }
    }

    /// Delete `record`. Returns false when it was already gone.
    pub fn remove(&self, record: &SnapshotRecord) -> Result<bool> {
        let removed = self
            .conn()
            .execute("DELETE FROM snapshots WHERE id = ?1", params![record.id.get()])?;

        if removed > 0 {
            info!("removed snapshot {} of {}", record.id, record.owner_id);
        } else {
            debug!("snapshot {} was already removed", record.id);
        }
        Ok(removed > 0)
    }

    /// Delete every snapshot of `owner_id`, returning how many went.
    pub fn remove_all_for_owner(&self, owner_id: Uuid) -> Result<usize> {
        let removed = self.conn().execute(
            "DELETE FROM snapshots WHERE ownerId = ?1",
            params![owner_id.hyphenated().to_string()],
        )?;

        info!("purged {removed} snapshot(s) of {owner_id}");
        Ok(removed)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn decode(&self, doc: SnapshotDocument) -> Result<SnapshotRecord> {
        doc.into_record(&*self.format, &self.layout).map_err(|e| {
            warn!("{e}");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ItemBlob;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Hands out the given timestamps in order, then counts up from the last.
    struct ScriptedClock(Mutex<VecDeque<i64>>, Mutex<i64>);

    impl ScriptedClock {
        fn new(times: &[i64]) -> Self {
            ScriptedClock(Mutex::new(times.iter().copied().collect()), Mutex::new(0))
        }
    }

    impl Clock for ScriptedClock {
        fn now_millis(&self) -> i64 {
            let mut last = self.1.lock().unwrap();
            *last = self.0.lock().unwrap().pop_front().unwrap_or(*last + 1);
            *last
        }
    }

    fn store(times: &[i64]) -> Store {
        Store::open_in_memory().unwrap().with_clock(ScriptedClock::new(times))
    }

    fn insert(store: &Store, owner: Uuid, points: u32) -> Result<SnapshotRecord> {
        let (armor, extra, main) = store.layout().empty_slots();
        store.insert(owner, armor, extra, main, points)
    }

    #[test]
    fn insert_assigns_growing_ids() {
        let store = store(&[10, 20, 30]);
        let owner = Uuid::new_v4();

        let a = insert(&store, owner, 1).unwrap();
        let b = insert(&store, owner, 2).unwrap();
        let c = insert(&store, Uuid::new_v4(), 3).unwrap();

        assert!(a.id < b.id && b.id < c.id);
        assert_eq!(a.timestamp, 10);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let store = store(&[]);
        let owner = Uuid::new_v4();

        let first = insert(&store, owner, 0).unwrap();
        assert!(store.remove(&first).unwrap());
        let second = insert(&store, owner, 0).unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn latest_picks_highest_timestamp() {
        let store = store(&[100, 200, 150]);
        let owner = Uuid::new_v4();
        for points in [1, 2, 3] {
            insert(&store, owner, points).unwrap();
        }

        let latest = store.resolve(owner, Selector::Latest).unwrap().unwrap();
        assert_eq!(latest.timestamp, 200);
        assert_eq!(latest.points, 2);
    }

    #[test]
    fn latest_for_unknown_owner_is_none() {
        let store = store(&[]);
        assert!(store.resolve(Uuid::new_v4(), Selector::Latest).unwrap().is_none());
    }

    #[test]
    fn explicit_id_of_other_owner_is_hidden() {
        let store = store(&[]);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let bobs = insert(&store, bob, 9).unwrap();

        assert!(store.resolve(alice, Selector::Id(bobs.id.get())).unwrap().is_none());
        assert_eq!(store.resolve(bob, Selector::Id(bobs.id.get())).unwrap(), Some(bobs));
    }

    #[test]
    fn same_timestamp_conflicts_for_any_owner() {
        let store = store(&[500, 500, 500]);
        let owner = Uuid::new_v4();

        insert(&store, owner, 1).unwrap();
        assert!(matches!(insert(&store, owner, 2), Err(Error::Conflict { timestamp: 500 })));
        assert!(matches!(
            insert(&store, Uuid::new_v4(), 3),
            Err(Error::Conflict { timestamp: 500 })
        ));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn get_by_id_absent_and_invalid() {
        let store = store(&[]);
        assert!(store.get_by_id(12345).unwrap().is_none());
        assert!(matches!(store.get_by_id(0), Err(Error::InvalidId(0))));
        assert!(matches!(store.get_by_id(-7), Err(Error::InvalidId(-7))));
    }

    #[test]
    fn remove_twice_reports_not_found() {
        let store = store(&[]);
        let record = insert(&store, Uuid::new_v4(), 0).unwrap();

        assert!(store.remove(&record).unwrap());
        assert!(!store.remove(&record).unwrap());
        assert!(store.get_by_id(record.id.get()).unwrap().is_none());
    }

    #[test]
    fn purge_removes_only_that_owner() {
        let store = store(&[]);
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        for _ in 0..3 {
            insert(&store, owner, 0).unwrap();
        }
        insert(&store, other, 0).unwrap();

        assert_eq!(store.remove_all_for_owner(owner).unwrap(), 3);
        assert!(store.find_by_owner(owner).unwrap().is_empty());
        assert_eq!(store.find_by_owner(other).unwrap().len(), 1);
        assert_eq!(store.remove_all_for_owner(owner).unwrap(), 0);
    }

    #[test]
    fn layout_is_enforced_on_insert() {
        let store = store(&[]);
        let err = store
            .insert(Uuid::new_v4(), vec![None; 3], vec![None], vec![None; 36], 0)
            .unwrap_err();
        assert!(matches!(err, Error::LayoutMismatch { expected: 4, actual: 3, .. }));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn points_above_the_maximum_are_rejected() {
        let store = store(&[]);
        let owner = Uuid::new_v4();
        let max = u32::try_from(progression::MAX_POINTS).unwrap();

        assert_eq!(insert(&store, owner, max).unwrap().points, max);
        let err = insert(&store, owner, max + 1).unwrap_err();
        assert!(matches!(err, Error::PointsOutOfRange { points, .. } if points == i64::from(max) + 1));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn corrupt_row_fails_the_read() {
        let store = store(&[]);
        let owner = Uuid::new_v4();
        let good = insert(&store, owner, 0).unwrap();
        let bad = insert(&store, owner, 0).unwrap();

        store
            .conn()
            .execute(
                "UPDATE snapshots SET contents = 'AQAAAAMB' WHERE id = ?1",
                params![bad.id.get()],
            )
            .unwrap();

        assert!(store.get_by_id(good.id.get()).unwrap().is_some());
        assert!(matches!(
            store.get_by_id(bad.id.get()),
            Err(Error::CorruptData { field: "contents", .. })
        ));
        assert!(matches!(store.find_by_owner(owner), Err(Error::CorruptData { .. })));
        assert!(matches!(store.resolve(owner, Selector::Latest), Err(Error::CorruptData { .. })));
    }

    #[test]
    fn unreadable_item_is_surfaced() {
        struct NoDiamonds;
        impl ItemFormat for NoDiamonds {
            fn verify(&self, blob: &[u8]) -> Result<(), String> {
                if blob == b"diamond" {
                    Err("unknown material".to_string())
                } else {
                    Ok(())
                }
            }
        }

        let store = store(&[]).with_format(NoDiamonds);
        let owner = Uuid::new_v4();
        let (armor, extra, mut main) = store.layout().empty_slots();
        main[5] = Some(ItemBlob::from("diamond"));
        let record = store.insert(owner, armor, extra, main, 0).unwrap();

        let err = store.get_by_id(record.id.get()).unwrap_err();
        assert!(err.to_string().contains("unknown material"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("inventory.db");
        let owner = Uuid::new_v4();

        let stored = {
            let store = Store::open(&path).unwrap();
            insert(&store, owner, 77).unwrap()
        };

        let store = Store::open(&path).unwrap();
        assert_eq!(store.resolve(owner, Selector::Latest).unwrap(), Some(stored));
    }

    #[test]
    fn reads_run_from_many_threads() {
        let store = Arc::new(store(&[]));
        let owner = Uuid::new_v4();
        for points in 0..5 {
            insert(&store, owner, points).unwrap();
        }

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.find_by_owner(owner).unwrap().len())
            })
            .collect();

        for reader in readers {
            assert_eq!(reader.join().unwrap(), 5);
        }
    }
}
