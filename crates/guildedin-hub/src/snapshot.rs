//! GameRunSnapshot - detached copy of a run for reads and persistence
//!
//! A snapshot is taken under the run's lock and then released, so callers
//! can inspect it (or write it to disk) while other plans are submitted.
//!
//! # Full State Preservation
//!
//! The snapshot preserves everything needed to continue a run:
//! - Calendar, guild, roster and settlement history
//! - RNG state, so a restored run draws the same numbers
//! - The decision journal, when one is recorded
//!
//! # Example
//!
//! ```rust,ignore
//! let snapshot = controller.run_status(run_id)?;
//! std::fs::write("run.bin", snapshot.to_bytes()?)?;
//!
//! let restored = GameRunSnapshot::from_bytes(&std::fs::read("run.bin")?)?;
//! controller.restore_run(restored)?;
//! ```

use crate::Result;
use guildedin_core::{
    Catalog, DailyExpense, GameRun, IntegrityViolation, Journal, RunId, RunStatus,
};
use serde::{Deserialize, Serialize};

/// A detached copy of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRunSnapshot {
    pub run: GameRun,
    /// Plans accepted so far, when the controller records them
    pub journal: Option<Journal>,
}

impl GameRunSnapshot {
    /// Wrap a run and its journal
    pub fn new(run: GameRun, journal: Option<Journal>) -> Self {
        Self { run, journal }
    }

    /// Run id
    pub fn id(&self) -> RunId {
        self.run.id
    }

    /// Current day
    pub fn day(&self) -> u32 {
        self.run.day()
    }

    /// Current treasury
    pub fn treasury(&self) -> u64 {
        self.run.treasury()
    }

    /// Current status
    pub fn status(&self) -> RunStatus {
        self.run.status
    }

    /// Settlement history, oldest first
    pub fn history(&self) -> &[DailyExpense] {
        &self.run.history
    }

    /// Encode with bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Check that every catalog reference in the run resolves and that the
    /// run's own bookkeeping is consistent
    pub fn validate_against(&self, catalog: &Catalog) -> std::result::Result<(), IntegrityViolation> {
        let run = &self.run;

        for (kind, &level) in &run.guild.facilities {
            match catalog.facility(*kind) {
                Some(def) if level <= def.max_level => {}
                Some(def) => {
                    return Err(IntegrityViolation::CorruptState(format!(
                        "{} at level {} exceeds max {}",
                        kind, level, def.max_level
                    )))
                }
                None if level == 0 => {}
                None => {
                    return Err(IntegrityViolation::CorruptState(format!(
                        "facility {} has no definition",
                        kind
                    )))
                }
            }
        }

        for item in &run.guild.inventory {
            if catalog.equipment(item).is_none() {
                return Err(IntegrityViolation::UnknownEquipment(item.clone()));
            }
        }

        for (id, adv) in &run.roster {
            if *id != adv.id || id.raw() >= run.next_adventurer_id {
                return Err(IntegrityViolation::CorruptState(format!(
                    "roster key {} does not match its adventurer",
                    id
                )));
            }
            for item in adv.equipped.values() {
                if catalog.equipment(item).is_none() {
                    return Err(IntegrityViolation::UnknownEquipment(item.clone()));
                }
            }
        }

        if run.history.len() != run.day() as usize {
            return Err(IntegrityViolation::CorruptState(format!(
                "{} settlements recorded for day {}",
                run.history.len(),
                run.day()
            )));
        }
        if run.status.is_terminal() != run.end_reason.is_some() {
            return Err(IntegrityViolation::CorruptState(format!(
                "status {:?} disagrees with end reason",
                run.status
            )));
        }
        if let Some(journal) = &self.journal {
            if journal.run_id != run.id {
                return Err(IntegrityViolation::CorruptState(format!(
                    "journal for {} attached to {}",
                    journal.run_id, run.id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildedin_core::catalog::Rarity;
    use guildedin_core::{
        Difficulty, DifficultyProfile, DefId, EquipmentDef, EquipmentSlot, FacilityDef,
        FacilityKind,
    };

    fn profile() -> DifficultyProfile {
        DifficultyProfile {
            starting_treasury: 2000,
            starting_roster_size: 0,
            day_limit: 10,
            target_treasury: 9000,
            target_reputation: 50,
            cost_scaling_pct: 100,
            reward_scaling_pct: 100,
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.equipment.insert(
            DefId::new("lanyard"),
            EquipmentDef {
                id: DefId::new("lanyard"),
                name: "Conference Lanyard".to_string(),
                slot: EquipmentSlot::NetworkingTool,
                rarity: Rarity::Common,
                modifiers: Vec::new(),
                sale_value: 5,
            },
        );
        catalog.facilities.insert(
            FacilityKind::TrainingRoom,
            FacilityDef {
                kind: FacilityKind::TrainingRoom,
                name: "Training Room".to_string(),
                max_level: 2,
                base_cost: 100,
                cost_multiplier_pct: 150,
                upkeep_per_level: 5,
            },
        );
        catalog
    }

    fn snapshot() -> GameRunSnapshot {
        let run = GameRun::new(RunId(3), 11, Difficulty::Senior, profile());
        let journal = Journal::new(run.id, run.seed, run.difficulty);
        GameRunSnapshot::new(run, Some(journal))
    }

    #[test]
    fn test_bincode_round_trip() {
        let mut snapshot = snapshot();
        snapshot.run.guild.inventory.push(DefId::new("lanyard"));
        snapshot.run.rng.next_u64();

        let bytes = snapshot.to_bytes().unwrap();
        let back = GameRunSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(snapshot, back);
        assert_eq!(back.id(), RunId(3));
        assert_eq!(back.status(), RunStatus::Active);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = GameRunSnapshot::from_bytes(&[1, 2, 3]).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_validate_against_catalog() {
        let catalog = catalog();
        let mut snapshot = snapshot();
        assert!(snapshot.validate_against(&catalog).is_ok());

        snapshot.run.guild.raise_facility(FacilityKind::TrainingRoom, 2);
        assert!(snapshot.validate_against(&catalog).is_ok());

        snapshot.run.guild.inventory.push(DefId::new("fax_machine"));
        assert_eq!(
            snapshot.validate_against(&catalog),
            Err(IntegrityViolation::UnknownEquipment(DefId::new("fax_machine")))
        );
    }

    #[test]
    fn test_validate_rejects_undefined_facility() {
        let catalog = catalog();
        let mut snapshot = snapshot();
        snapshot.run.guild.raise_facility(FacilityKind::NetworkingLounge, 1);
        assert!(snapshot.validate_against(&catalog).is_err());
    }

    #[test]
    fn test_validate_rejects_mismatched_history() {
        let catalog = catalog();
        let mut snapshot = snapshot();
        snapshot.run.calendar.advance();
        assert!(snapshot.validate_against(&catalog).is_err());
    }
}
