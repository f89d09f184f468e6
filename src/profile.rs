//! JSON player profiles.
//!
//! The CLI has no live server to talk to, so it treats a profile file as the
//! player: capture reads it, restore rewrites it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::host::{HostError, InventoryMut, InventoryView, ItemBlob, ProgressionMut, Slots};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub owner_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub armor: Slots,
    #[serde(default)]
    pub extra: Slots,
    #[serde(default)]
    pub main: Slots,
}

impl PlayerProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text + "\n")?;
        Ok(())
    }

    /// Name for messages, falling back to the owner id.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.owner_id.to_string())
    }
}

impl InventoryView for PlayerProfile {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    fn armor_slots(&self) -> Slots {
        self.armor.clone()
    }

    fn extra_slots(&self) -> Slots {
        self.extra.clone()
    }

    fn main_slots(&self) -> Slots {
        self.main.clone()
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn progress(&self) -> f32 {
        self.progress
    }
}

impl ProgressionMut for PlayerProfile {
    fn set_level(&mut self, level: u32) -> Result<(), HostError> {
        self.level = level;
        Ok(())
    }

    fn set_progress(&mut self, progress: f32) -> Result<(), HostError> {
        if !(0.0..1.0).contains(&progress) {
            return Err(HostError::new(format!("progress {progress} is outside [0, 1)")));
        }
        self.progress = progress;
        Ok(())
    }
}

impl InventoryMut for PlayerProfile {
    fn set_armor_slots(&mut self, slots: &[Option<ItemBlob>]) -> Result<(), HostError> {
        self.armor = slots.to_vec();
        Ok(())
    }

    fn set_extra_slots(&mut self, slots: &[Option<ItemBlob>]) -> Result<(), HostError> {
        self.extra = slots.to_vec();
        Ok(())
    }

    fn set_main_slots(&mut self, slots: &[Option<ItemBlob>]) -> Result<(), HostError> {
        self.main = slots.to_vec();
        Ok(())
    }
}
