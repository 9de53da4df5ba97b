//! Guild state: treasury, reputation, facilities and loot inventory

use crate::catalog::FacilityKind;
use crate::DefId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Base number of items the guild can store
pub const BASE_INVENTORY: usize = 4;
/// Extra storage per equipment storage level
pub const INVENTORY_PER_STORAGE_LEVEL: usize = 2;

/// The player's managed organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    /// Currency on hand; never negative after a day settles
    pub treasury: u64,
    /// Reputation score
    pub reputation: u32,
    /// Experience earned by the guild as a whole
    pub guild_exp: u32,
    /// Facility levels; absent means level 0
    pub facilities: IndexMap<FacilityKind, u8>,
    /// Unequipped items
    pub inventory: Vec<DefId>,
}

impl Guild {
    /// A guild with a starting treasury and nothing else
    pub fn new(treasury: u64) -> Self {
        Self {
            treasury,
            reputation: 0,
            guild_exp: 0,
            facilities: IndexMap::new(),
            inventory: Vec::new(),
        }
    }

    /// Current level of a facility
    pub fn facility_level(&self, kind: FacilityKind) -> u8 {
        self.facilities.get(&kind).copied().unwrap_or(0)
    }

    /// Raise a facility to `level`; lower values are ignored
    pub fn raise_facility(&mut self, kind: FacilityKind, level: u8) {
        let entry = self.facilities.entry(kind).or_insert(0);
        *entry = (*entry).max(level);
    }

    /// Sum of all facility levels
    pub fn total_facility_levels(&self) -> u32 {
        self.facilities.values().map(|&l| u32::from(l)).sum()
    }

    /// How many unequipped items the guild can hold
    pub fn inventory_capacity(&self) -> usize {
        BASE_INVENTORY
            + INVENTORY_PER_STORAGE_LEVEL
                * usize::from(self.facility_level(FacilityKind::EquipmentStorage))
    }

    /// Whether the inventory has room for another item
    pub fn has_storage_room(&self) -> bool {
        self.inventory.len() < self.inventory_capacity()
    }

    /// Remove one copy of an item from the inventory
    pub fn take_item(&mut self, item: &DefId) -> bool {
        match self.inventory.iter().position(|i| i == item) {
            Some(pos) => {
                self.inventory.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Apply a signed reputation change, flooring at zero
    pub fn adjust_reputation(&mut self, amount: i32) {
        self.reputation = if amount >= 0 {
            self.reputation.saturating_add(amount.unsigned_abs())
        } else {
            self.reputation.saturating_sub(amount.unsigned_abs())
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_levels_monotonic() {
        let mut guild = Guild::new(100);
        assert_eq!(guild.facility_level(FacilityKind::TrainingRoom), 0);
        guild.raise_facility(FacilityKind::TrainingRoom, 2);
        guild.raise_facility(FacilityKind::TrainingRoom, 1);
        assert_eq!(guild.facility_level(FacilityKind::TrainingRoom), 2);
        guild.raise_facility(FacilityKind::WellnessCenter, 1);
        assert_eq!(guild.total_facility_levels(), 3);
    }

    #[test]
    fn test_inventory_capacity() {
        let mut guild = Guild::new(0);
        assert_eq!(guild.inventory_capacity(), BASE_INVENTORY);
        guild.raise_facility(FacilityKind::EquipmentStorage, 2);
        assert_eq!(guild.inventory_capacity(), BASE_INVENTORY + 4);
    }

    #[test]
    fn test_take_item() {
        let mut guild = Guild::new(0);
        guild.inventory.push(DefId::new("badge"));
        guild.inventory.push(DefId::new("badge"));
        assert!(guild.take_item(&DefId::new("badge")));
        assert_eq!(guild.inventory.len(), 1);
        assert!(!guild.take_item(&DefId::new("license")));
    }

    #[test]
    fn test_reputation_floor() {
        let mut guild = Guild::new(0);
        guild.adjust_reputation(10);
        guild.adjust_reputation(-25);
        assert_eq!(guild.reputation, 0);
    }
}
