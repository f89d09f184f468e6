//! Seams to the game-server runtime.
//!
//! The core never looks inside an item. It sees a slot as an optional
//! [`ItemBlob`] produced by the host's own item serializer, reads live
//! inventories through [`InventoryView`] and writes them back through
//! [`InventoryMut`].

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::progression;

/// Serialized bytes of a single item, as produced by the host.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ItemBlob(Vec<u8>);

impl ItemBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        ItemBlob(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for ItemBlob {
    fn from(bytes: Vec<u8>) -> Self {
        ItemBlob(bytes)
    }
}

impl From<&[u8]> for ItemBlob {
    fn from(bytes: &[u8]) -> Self {
        ItemBlob(bytes.to_vec())
    }
}

impl From<&str> for ItemBlob {
    fn from(text: &str) -> Self {
        ItemBlob(text.as_bytes().to_vec())
    }
}

impl fmt::Debug for ItemBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) if text.len() <= 32 => write!(f, "ItemBlob({text:?})"),
            _ => write!(f, "ItemBlob({} bytes)", self.0.len()),
        }
    }
}

// profiles carry blobs as base64 strings
impl Serialize for ItemBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for ItemBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map(ItemBlob)
            .map_err(serde::de::Error::custom)
    }
}

/// An ordered slot array. `None` is an empty slot, not a missing one.
pub type Slots = Vec<Option<ItemBlob>>;

/// Number of slots that hold an item.
pub fn occupied(slots: &[Option<ItemBlob>]) -> usize {
    slots.iter().filter(|slot| slot.is_some()).count()
}

/// Host-side check that stored bytes can still be turned back into an item.
pub trait ItemFormat: Send + Sync {
    fn verify(&self, blob: &[u8]) -> Result<(), String>;
}

/// Accepts every blob. Used when the host cannot validate offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawItems;

impl ItemFormat for RawItems {
    fn verify(&self, _blob: &[u8]) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        HostError(message.into())
    }
}

/// Read access to a live player.
pub trait InventoryView {
    fn owner_id(&self) -> Uuid;
    fn armor_slots(&self) -> Slots;
    fn extra_slots(&self) -> Slots;
    fn main_slots(&self) -> Slots;
    fn level(&self) -> u32;
    fn progress(&self) -> f32;

    fn total_points(&self) -> i64 {
        progression::total_points(self.level(), self.progress())
    }
}

pub trait ProgressionMut {
    fn set_level(&mut self, level: u32) -> Result<(), HostError>;
    fn set_progress(&mut self, progress: f32) -> Result<(), HostError>;
}

/// Write access to a live player.
pub trait InventoryMut: ProgressionMut {
    fn set_armor_slots(&mut self, slots: &[Option<ItemBlob>]) -> Result<(), HostError>;
    fn set_extra_slots(&mut self, slots: &[Option<ItemBlob>]) -> Result<(), HostError>;
    fn set_main_slots(&mut self, slots: &[Option<ItemBlob>]) -> Result<(), HostError>;
}
