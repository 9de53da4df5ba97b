//! Day transaction application and settlement commit
//!
//! - [`apply`]: Apply a `DayTransaction` to a run (no checks)
//! - [`check`]: Verify every delta targets something that exists
//! - [`commit`]: Check, then apply a whole `Settlement` and advance the calendar
//!
//! # Design
//!
//! - `DayTransaction` and `PendingDelta` are defined in `guildedin-core`
//! - Application lives here because the controller owns runs
//! - `commit` checks everything before touching the run, so a failed commit
//!   leaves the run exactly as it was
//!
//! # Example
//!
//! ```rust,ignore
//! use guildedin_core::{execute_day, DayContext};
//! use guildedin_hub::commit;
//!
//! let settlement = execute_day(&run, plan, DayContext::new(&catalog, &talent))?;
//! let result = commit(settlement, &mut run)?;
//! println!("day {} settled, {} hired", result.day, result.hired.len());
//! ```

use crate::Result;
use guildedin_core::{
    adventurer_from, AdventurerId, DayTransaction, GameRun, IntegrityViolation, PendingDelta,
    Settlement,
};
use std::collections::BTreeSet;

/// Result of a successful commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitResult {
    /// The day that settled
    pub day: u32,
    /// Adventurers added to the roster
    pub hired: Vec<AdventurerId>,
    /// Adventurers whose fatigue or injury cleared on the new day
    pub recovered: Vec<AdventurerId>,
}

/// Verify that every roster delta targets an adventurer that exists or is
/// hired earlier in the same transaction
pub fn check(transaction: &DayTransaction, run: &GameRun) -> std::result::Result<(), IntegrityViolation> {
    let mut hired = BTreeSet::new();
    for delta in transaction.iter() {
        if let PendingDelta::Hire { id, .. } = delta {
            if run.roster.contains_key(id) || !hired.insert(*id) {
                return Err(IntegrityViolation::CorruptState(format!(
                    "{} hired twice",
                    id
                )));
            }
            continue;
        }
        if let Some(id) = delta.adventurer() {
            if !run.roster.contains_key(&id) && !hired.contains(&id) {
                return Err(IntegrityViolation::MissingAdventurer(id));
            }
        }
    }
    Ok(())
}

/// Apply a DayTransaction to a run
///
/// Deltas are applied in order. Deltas for adventurers that do not exist are
/// skipped; call [`check`] first to rule that out.
///
/// Returns the ids of hired adventurers.
pub fn apply(transaction: &DayTransaction, run: &mut GameRun) -> Vec<AdventurerId> {
    let mut hired = Vec::new();

    for delta in transaction.iter() {
        delta.stage(&mut run.guild);

        match delta {
            PendingDelta::SetStat {
                adventurer,
                stat,
                value,
            } => {
                if let Some(adv) = run.roster.get_mut(adventurer) {
                    let capped = (*value).min(adv.stat_cap);
                    adv.stats.set(*stat, capped);
                }
            }

            PendingDelta::GainExperience { adventurer, amount } => {
                if let Some(adv) = run.roster.get_mut(adventurer) {
                    adv.experience = adv.experience.saturating_add(*amount);
                }
            }

            PendingDelta::SetCondition {
                adventurer,
                condition,
            } => {
                if let Some(adv) = run.roster.get_mut(adventurer) {
                    adv.condition = *condition;
                }
            }

            PendingDelta::CompleteDungeon { adventurer } => {
                if let Some(adv) = run.roster.get_mut(adventurer) {
                    adv.dungeons_completed += 1;
                }
            }

            PendingDelta::Hire { id, candidate } => {
                run.roster.insert(*id, adventurer_from(*id, candidate));
                run.next_adventurer_id = run.next_adventurer_id.max(id.raw() + 1);
                hired.push(*id);
            }

            PendingDelta::EquipItem {
                adventurer,
                item,
                slot,
                ..
            } => {
                if let Some(adv) = run.roster.get_mut(adventurer) {
                    adv.equipped.insert(*slot, item.clone());
                }
            }

            // Guild-scoped, handled by stage()
            PendingDelta::AddItem { .. }
            | PendingDelta::UpgradeFacility { .. }
            | PendingDelta::AdjustReputation(_)
            | PendingDelta::GainGuildExp(_) => {}
        }
    }

    hired
}

/// Commit a settled day to its run
///
/// Applies the buffered deltas, moves the treasury to the settled value,
/// appends the expense record, adopts the day's RNG state, advances the
/// calendar and clears conditions whose recovery day has arrived.
pub fn commit(settlement: Settlement, run: &mut GameRun) -> Result<CommitResult> {
    let Settlement {
        expense,
        transaction,
        rng,
        next_adventurer_id,
    } = settlement;

    if expense.run_id != run.id || expense.day != run.day() {
        return Err(IntegrityViolation::CorruptState(format!(
            "settlement for {} day {} does not match {} day {}",
            expense.run_id,
            expense.day,
            run.id,
            run.day()
        ))
        .into());
    }
    if expense.treasury_before != run.guild.treasury {
        return Err(IntegrityViolation::CorruptState(format!(
            "settlement expected treasury {}, run has {}",
            expense.treasury_before, run.guild.treasury
        ))
        .into());
    }
    check(&transaction, run)?;

    let day = expense.day;
    let hired = apply(&transaction, run);

    run.guild.treasury = expense.resulting_treasury;
    run.peak_treasury = run.peak_treasury.max(run.guild.treasury);
    run.lowest_treasury = run.lowest_treasury.min(run.guild.treasury);
    run.rng = rng;
    run.next_adventurer_id = run.next_adventurer_id.max(next_adventurer_id);
    run.history.push(expense);

    run.calendar.advance();
    let today = run.calendar.day();
    let mut recovered = Vec::new();
    for adv in run.roster.values_mut() {
        let was_ready = adv.check_ready().is_ok();
        adv.recover(today);
        if !was_ready && adv.check_ready().is_ok() {
            recovered.push(adv.id);
        }
    }

    Ok(CommitResult {
        day,
        hired,
        recovered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildedin_core::{
        Candidate, Condition, CorporateClass, DailyExpense, DayType, DefId, Difficulty,
        DifficultyProfile, EquipmentSlot, FacilityKind, GameRng, RunId, Seniority, StatBlock,
        StatKind,
    };

    fn candidate() -> Candidate {
        Candidate {
            id: DefId::new("riley"),
            name: "Riley".to_string(),
            class: CorporateClass::InnovationDirector,
            seniority: Seniority::Intern,
            stats: StatBlock::uniform(30),
            hire_cost: 100,
            salary: 10,
            weight: 1,
        }
    }

    fn run() -> GameRun {
        let profile = DifficultyProfile {
            starting_treasury: 1000,
            starting_roster_size: 0,
            day_limit: 30,
            target_treasury: 10_000,
            target_reputation: 100,
            cost_scaling_pct: 100,
            reward_scaling_pct: 100,
        };
        let mut run = GameRun::new(RunId(1), 5, Difficulty::Associate, profile);
        run.hire(&candidate());
        run
    }

    fn settlement(run: &GameRun, transaction: DayTransaction, resulting: u64) -> Settlement {
        Settlement {
            expense: DailyExpense {
                run_id: run.id,
                day: run.day(),
                day_type: DayType::Weekday,
                lines: Vec::new(),
                total_expenses: 0,
                total_income: 0,
                net_delta: resulting as i64 - run.treasury() as i64,
                treasury_before: run.treasury(),
                resulting_treasury: resulting,
                outcomes: Vec::new(),
            },
            transaction,
            rng: GameRng::new(99),
            next_adventurer_id: run.next_adventurer_id,
        }
    }

    #[test]
    fn test_apply_roster_and_guild_deltas() {
        let mut run = run();
        run.guild.inventory.push(DefId::new("badge"));
        let id = AdventurerId(1);

        let mut tx = DayTransaction::new();
        tx.push(PendingDelta::SetStat {
            adventurer: id,
            stat: StatKind::Agility,
            value: 99,
        });
        tx.push(PendingDelta::GainExperience {
            adventurer: id,
            amount: 300,
        });
        tx.push(PendingDelta::EquipItem {
            adventurer: id,
            item: DefId::new("badge"),
            slot: EquipmentSlot::LeadershipBadge,
            replaced: None,
        });
        tx.push(PendingDelta::UpgradeFacility {
            facility: FacilityKind::WellnessCenter,
            to_level: 1,
        });
        tx.push(PendingDelta::Hire {
            id: AdventurerId(2),
            candidate: candidate(),
        });

        let hired = apply(&tx, &mut run);
        assert_eq!(hired, vec![AdventurerId(2)]);

        let adv = &run.roster[&id];
        // intern cap is 60
        assert_eq!(adv.stats.get(StatKind::Agility), 60);
        assert_eq!(adv.level(), 2);
        assert_eq!(
            adv.equipped.get(&EquipmentSlot::LeadershipBadge),
            Some(&DefId::new("badge"))
        );
        assert!(run.guild.inventory.is_empty());
        assert_eq!(run.guild.facility_level(FacilityKind::WellnessCenter), 1);
        assert_eq!(run.roster.len(), 2);
        assert_eq!(run.next_adventurer_id, 3);
    }

    #[test]
    fn test_commit_advances_and_recovers() {
        let mut run = run();
        let mut tx = DayTransaction::new();
        tx.push(PendingDelta::SetCondition {
            adventurer: AdventurerId(1),
            condition: Condition::Fatigued { until_day: 1 },
        });

        let result = commit(settlement(&run, tx, 850), &mut run).unwrap();
        assert_eq!(result.day, 0);
        assert_eq!(result.recovered, vec![AdventurerId(1)]);
        assert_eq!(run.day(), 1);
        assert_eq!(run.treasury(), 850);
        assert_eq!(run.lowest_treasury, 850);
        assert_eq!(run.peak_treasury, 1000);
        assert_eq!(run.history.len(), 1);
        assert_eq!(run.rng, GameRng::new(99));
    }

    #[test]
    fn test_commit_rejects_stale_settlement() {
        let mut run = run();
        let stale = settlement(&run, DayTransaction::new(), 900);
        commit(settlement(&run, DayTransaction::new(), 950), &mut run).unwrap();

        let before = run.clone();
        assert!(commit(stale, &mut run).is_err());
        assert_eq!(run, before);
    }

    #[test]
    fn test_commit_rejects_unknown_adventurer_without_mutation() {
        let mut run = run();
        let mut tx = DayTransaction::new();
        tx.push(PendingDelta::AdjustReputation(5));
        tx.push(PendingDelta::CompleteDungeon {
            adventurer: AdventurerId(42),
        });

        let before = run.clone();
        let err = commit(settlement(&run, tx, 900), &mut run).unwrap_err();
        assert!(!err.is_recoverable());
        assert_eq!(run, before);
    }
}
