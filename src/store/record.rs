//! Snapshot entity and its mapping to the `snapshots` table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::{self, CodecError};
use crate::error::{Error, Result};
use crate::host::{ItemFormat, Slots};
use crate::progression::MAX_POINTS;

pub const ARMOR_FIELD: &str = "armorContents";
pub const EXTRA_FIELD: &str = "extraContents";
pub const MAIN_FIELD: &str = "contents";

/// Store-assigned snapshot identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SnapshotId(i64);

impl SnapshotId {
    pub(crate) fn new(id: i64) -> Self {
        SnapshotId(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which snapshot of an owner a command refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Latest,
    Id(i64),
}

impl Selector {
    pub const LATEST: &'static str = "latest";
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == Self::LATEST {
            return Ok(Selector::Latest);
        }
        s.parse::<i64>()
            .map(Selector::Id)
            .map_err(|_| Error::InvalidSelector(s.to_string()))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Latest => f.write_str(Self::LATEST),
            Selector::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Declared lengths of the three slot arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotLayout {
    pub armor: usize,
    pub extra: usize,
    pub main: usize,
}

impl Default for SlotLayout {
    fn default() -> Self {
        SlotLayout {
            armor: 4,
            extra: 1,
            main: 36,
        }
    }
}

impl SlotLayout {
    pub fn check(&self, armor: &Slots, extra: &Slots, main: &Slots) -> Result<()> {
        for (field, expected, actual) in [
            (ARMOR_FIELD, self.armor, armor.len()),
            (EXTRA_FIELD, self.extra, extra.len()),
            (MAIN_FIELD, self.main, main.len()),
        ] {
            if expected != actual {
                return Err(Error::LayoutMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Layout filled with empty slots.
    pub fn empty_slots(&self) -> (Slots, Slots, Slots) {
        (vec![None; self.armor], vec![None; self.extra], vec![None; self.main])
    }
}

/// One stored capture of an owner's inventory and progression.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    pub id: SnapshotId,
    pub owner_id: Uuid,
    /// Milliseconds since the Unix epoch. Unique across the store.
    pub timestamp: i64,
    pub armor_slots: Slots,
    pub extra_slots: Slots,
    pub main_slots: Slots,
    pub points: u32,
}

/// A `snapshots` row as stored, slot arrays still encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    pub id: Option<i64>,
    pub owner_id: String,
    pub timestamp: i64,
    pub armor_contents: Option<String>,
    pub extra_contents: Option<String>,
    pub contents: Option<String>,
    pub total_experience: i64,
}

pub(crate) const SELECT_COLUMNS: &str =
    "id, ownerId, timestamp, armorContents, extraContents, contents, totalExperience";

impl SnapshotDocument {
    /// Document for a record that has no id yet.
    pub fn encode(
        owner_id: Uuid,
        timestamp: i64,
        armor: &Slots,
        extra: &Slots,
        main: &Slots,
        points: u32,
    ) -> Result<Self, CodecError> {
        Ok(SnapshotDocument {
            id: None,
            owner_id: owner_id.hyphenated().to_string(),
            timestamp,
            armor_contents: codec::encode(Some(armor.as_slice()))?,
            extra_contents: codec::encode(Some(extra.as_slice()))?,
            contents: codec::encode(Some(main.as_slice()))?,
            total_experience: i64::from(points),
        })
    }

    pub fn from_record(record: &SnapshotRecord) -> Result<Self, CodecError> {
        let mut doc = Self::encode(
            record.owner_id,
            record.timestamp,
            &record.armor_slots,
            &record.extra_slots,
            &record.main_slots,
            record.points,
        )?;
        doc.id = Some(record.id.get());
        Ok(doc)
    }

    /// Reads columns in [`SELECT_COLUMNS`] order.
    pub(crate) fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(SnapshotDocument {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            timestamp: row.get(2)?,
            armor_contents: row.get(3)?,
            extra_contents: row.get(4)?,
            contents: row.get(5)?,
            total_experience: row.get(6)?,
        })
    }

    /// Decode into a record, checking every field against `layout`.
    pub fn into_record(self, format: &dyn ItemFormat, layout: &SlotLayout) -> Result<SnapshotRecord> {
        let id = self.id.unwrap_or_default();
        let corrupt = |field: &'static str, reason: String| Error::CorruptData { id, field, reason };

        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| corrupt("ownerId", e.to_string()))?;
        let points = u32::try_from(self.total_experience)
            .ok()
            .filter(|&points| i64::from(points) <= MAX_POINTS)
            .ok_or_else(|| corrupt("totalExperience", format!("{} is out of range", self.total_experience)))?;

        let decode_field = |field: &'static str, text: Option<&str>, expected: usize| -> Result<Slots> {
            let slots = codec::decode_with(text, format)
                .map_err(|e| Error::corrupt(id, field, e))?
                .ok_or_else(|| corrupt(field, "slot array is missing".to_string()))?;
            if slots.len() != expected {
                return Err(corrupt(
                    field,
                    format!("{} slots, layout declares {expected}", slots.len()),
                ));
            }
            Ok(slots)
        };

        let armor_slots = decode_field(ARMOR_FIELD, self.armor_contents.as_deref(), layout.armor)?;
        let extra_slots = decode_field(EXTRA_FIELD, self.extra_contents.as_deref(), layout.extra)?;
        let main_slots = decode_field(MAIN_FIELD, self.contents.as_deref(), layout.main)?;

        Ok(SnapshotRecord {
            id: SnapshotId::new(id),
            owner_id,
            timestamp: self.timestamp,
            armor_slots,
            extra_slots,
            main_slots,
            points,
        })
    }
}
