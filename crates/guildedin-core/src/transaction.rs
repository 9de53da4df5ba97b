//! Buffered day deltas
//!
//! The executor never mutates a `GameRun`. Every state change a day produces
//! is recorded as a `PendingDelta` in a `DayTransaction`; the controller
//! applies the whole transaction at once after settlement succeeds, or drops
//! it when the day rolls back.
//!
//! Guild-scoped deltas can also be staged onto a scratch `Guild` so later
//! sub-actions of the same day see the effect of earlier ones (a second
//! facility upgrade is priced at the next level, an equipped item leaves the
//! inventory).

use crate::adventurer::{Condition, StatKind};
use crate::catalog::{Candidate, EquipmentSlot, FacilityKind};
use crate::guild::Guild;
use crate::{AdventurerId, DefId};
use serde::{Deserialize, Serialize};

/// A single state change, already resolved to concrete values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingDelta {
    /// Set a trained stat to a new value
    SetStat {
        adventurer: AdventurerId,
        stat: StatKind,
        value: u8,
    },
    /// Add experience to an adventurer
    GainExperience {
        adventurer: AdventurerId,
        amount: u32,
    },
    /// Replace an adventurer's condition
    SetCondition {
        adventurer: AdventurerId,
        condition: Condition,
    },
    /// Count a successful expedition
    CompleteDungeon { adventurer: AdventurerId },
    /// Add a recruited candidate to the roster under `id`
    Hire {
        id: AdventurerId,
        candidate: Candidate,
    },
    /// Put looted equipment into the guild inventory
    AddItem { item: DefId },
    /// Move an item from the inventory into a slot, returning any item it replaces
    EquipItem {
        adventurer: AdventurerId,
        item: DefId,
        slot: EquipmentSlot,
        replaced: Option<DefId>,
    },
    /// Raise a facility to a level
    UpgradeFacility { facility: FacilityKind, to_level: u8 },
    /// Signed reputation change
    AdjustReputation(i32),
    /// Guild-wide experience
    GainGuildExp(u32),
}

impl PendingDelta {
    /// Apply the guild-scoped part of this delta
    ///
    /// Roster-scoped deltas are ignored here; the controller applies them at
    /// commit.
    pub fn stage(&self, guild: &mut Guild) {
        match self {
            PendingDelta::AddItem { item } => guild.inventory.push(item.clone()),
            PendingDelta::EquipItem { item, replaced, .. } => {
                guild.take_item(item);
                if let Some(old) = replaced {
                    guild.inventory.push(old.clone());
                }
            }
            PendingDelta::UpgradeFacility { facility, to_level } => {
                guild.raise_facility(*facility, *to_level)
            }
            PendingDelta::AdjustReputation(amount) => guild.adjust_reputation(*amount),
            PendingDelta::GainGuildExp(amount) => {
                guild.guild_exp = guild.guild_exp.saturating_add(*amount)
            }
            PendingDelta::SetStat { .. }
            | PendingDelta::GainExperience { .. }
            | PendingDelta::SetCondition { .. }
            | PendingDelta::CompleteDungeon { .. }
            | PendingDelta::Hire { .. } => {}
        }
    }

    /// The adventurer this delta touches, if any
    pub fn adventurer(&self) -> Option<AdventurerId> {
        match self {
            PendingDelta::SetStat { adventurer, .. }
            | PendingDelta::GainExperience { adventurer, .. }
            | PendingDelta::SetCondition { adventurer, .. }
            | PendingDelta::CompleteDungeon { adventurer }
            | PendingDelta::EquipItem { adventurer, .. } => Some(*adventurer),
            PendingDelta::Hire { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Ordered deltas for one day, applied together or not at all
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayTransaction {
    writes: Vec<PendingDelta>,
}

impl DayTransaction {
    /// Create an empty transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delta
    pub fn push(&mut self, delta: PendingDelta) {
        self.writes.push(delta);
    }

    /// Record several deltas
    pub fn extend(&mut self, deltas: impl IntoIterator<Item = PendingDelta>) {
        self.writes.extend(deltas);
    }

    /// Number of recorded deltas
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// True if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Iterate in recording order
    pub fn iter(&self) -> impl Iterator<Item = &PendingDelta> {
        self.writes.iter()
    }

    /// Consume into the recorded deltas
    pub fn into_writes(self) -> Vec<PendingDelta> {
        self.writes
    }
}

impl IntoIterator for DayTransaction {
    type Item = PendingDelta;
    type IntoIter = std::vec::IntoIter<PendingDelta>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_keeps_order() {
        let mut tx = DayTransaction::new();
        assert!(tx.is_empty());
        tx.push(PendingDelta::GainGuildExp(5));
        tx.extend([
            PendingDelta::AdjustReputation(3),
            PendingDelta::AddItem {
                item: DefId::new("badge"),
            },
        ]);
        assert_eq!(tx.len(), 3);
        let first = tx.iter().next().cloned();
        assert_eq!(first, Some(PendingDelta::GainGuildExp(5)));
    }

    #[test]
    fn test_stage_guild_deltas() {
        let mut guild = Guild::new(0);
        guild.inventory.push(DefId::new("license"));

        PendingDelta::UpgradeFacility {
            facility: FacilityKind::StrategyCenter,
            to_level: 1,
        }
        .stage(&mut guild);
        PendingDelta::EquipItem {
            adventurer: AdventurerId(1),
            item: DefId::new("license"),
            slot: EquipmentSlot::SoftwareLicense,
            replaced: Some(DefId::new("old_license")),
        }
        .stage(&mut guild);
        PendingDelta::AdjustReputation(-4).stage(&mut guild);
        PendingDelta::GainExperience {
            adventurer: AdventurerId(1),
            amount: 10,
        }
        .stage(&mut guild);

        assert_eq!(guild.facility_level(FacilityKind::StrategyCenter), 1);
        assert_eq!(guild.inventory, vec![DefId::new("old_license")]);
        assert_eq!(guild.reputation, 0);
    }

    #[test]
    fn test_delta_adventurer() {
        assert_eq!(
            PendingDelta::CompleteDungeon {
                adventurer: AdventurerId(7)
            }
            .adventurer(),
            Some(AdventurerId(7))
        );
        assert_eq!(PendingDelta::GainGuildExp(1).adventurer(), None);
    }
}
