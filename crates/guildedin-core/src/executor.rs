//! Daily plan executor
//!
//! One day moves through four states:
//!
//! ```text
//! ProposedDay --validate()--> ValidatedDay --execute()--> ExecutedDay --settle()--> Settlement
//! ```
//!
//! Each transition consumes the previous state, so a day cannot be executed
//! without being validated or settled twice. The executor only ever borrows
//! the `GameRun`; everything it produces is buffered in the returned
//! [`Settlement`] and committed by the controller. A rejected or rolled-back
//! day leaves the run exactly as it was.
//!
//! # Example
//!
//! ```rust,ignore
//! let settlement = ProposedDay::new(&run, ctx, plan)
//!     .validate()?
//!     .execute()?
//!     .settle()?;
//! ```

use crate::adventurer::{Adventurer, Condition, Ineligibility};
use crate::catalog::{Catalog, TalentPool};
use crate::economy::{compute_action_cost, compute_daily_upkeep, ActionCost, EconomyContext};
use crate::error::{Error, IntegrityViolation, Result, ValidationError};
use crate::guild::Guild;
use crate::ledger::{total_expenses, total_income, DailyExpense, LedgerLine};
use crate::plan::{DailyPlan, SubAction, DAY_TIME_UNITS};
use crate::resolver::{
    effective_stat, resolve_equip, resolve_expedition, resolve_recruitment, resolve_rest,
    resolve_training, resolve_upgrade, ActionOutcome, ResolveContext,
};
use crate::rng::GameRng;
use crate::run::GameRun;
use crate::transaction::DayTransaction;
use crate::AdventurerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Shared read-only collaborators for executing a day
#[derive(Clone, Copy)]
pub struct DayContext<'a> {
    pub catalog: &'a Catalog,
    pub talent: &'a dyn TalentPool,
}

impl<'a> DayContext<'a> {
    /// Create a context
    pub fn new(catalog: &'a Catalog, talent: &'a dyn TalentPool) -> Self {
        Self { catalog, talent }
    }
}

/// Costs of a validated plan, charged unchanged at settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPreview {
    pub day: u32,
    pub upkeep: Vec<LedgerLine>,
    /// One entry per sub-action, in plan order
    pub costs: Vec<ActionCost>,
    pub time_used: u32,
    /// Upkeep plus every action cost
    pub total_cost: u64,
}

/// Output of a settled day, ready to commit
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub expense: DailyExpense,
    pub transaction: DayTransaction,
    /// The run RNG after every draw made today
    pub rng: GameRng,
    pub next_adventurer_id: u64,
}

// ============================================================================
// Proposed
// ============================================================================

/// A submitted plan that has not been checked yet
pub struct ProposedDay<'a> {
    run: &'a GameRun,
    ctx: DayContext<'a>,
    plan: DailyPlan,
}

impl<'a> ProposedDay<'a> {
    /// Wrap a plan for a run
    pub fn new(run: &'a GameRun, ctx: DayContext<'a>, plan: DailyPlan) -> Self {
        Self { run, ctx, plan }
    }

    /// Check shape, references, eligibility, time and treasury
    pub fn validate(self) -> Result<ValidatedDay<'a>> {
        let run = self.run;
        if run.status.is_terminal() {
            return Err(IntegrityViolation::RunConcluded {
                run: run.id,
                status: run.status,
            }
            .into());
        }
        if let Some(reason) = self.plan.shape_error() {
            return Err(ValidationError::MalformedPlan(reason).into());
        }

        let econ = EconomyContext::new(self.ctx.catalog, &run.profile, run.calendar.modifiers());
        let upkeep = compute_daily_upkeep(&econ, &run.guild, &run.roster)?;

        let mut staged = run.guild.clone();
        let mut assigned = BTreeSet::new();
        let mut costs = Vec::with_capacity(self.plan.actions.len());
        for action in &self.plan.actions {
            self.check_action(action, &staged, &mut assigned)?;
            let cost = compute_action_cost(&econ, &staged, run.roster.len(), action)?;
            self.stage_action(action, &mut staged)?;
            costs.push(cost);
        }

        let time_used: u32 = costs.iter().map(|c| c.time).sum();
        if time_used > DAY_TIME_UNITS {
            return Err(ValidationError::OverTimeBudget {
                required: time_used,
                available: DAY_TIME_UNITS,
            }
            .into());
        }

        let total_cost =
            total_expenses(&upkeep) + costs.iter().map(|c| c.treasury).sum::<u64>();
        if total_cost > run.guild.treasury {
            return Err(ValidationError::InsufficientTreasury {
                required: total_cost,
                available: run.guild.treasury,
            }
            .into());
        }

        Ok(ValidatedDay {
            run,
            ctx: self.ctx,
            plan: self.plan,
            preview: PlanPreview {
                day: run.day(),
                upkeep,
                costs,
                time_used,
                total_cost,
            },
        })
    }

    fn member(
        &self,
        id: AdventurerId,
        assigned: &mut BTreeSet<AdventurerId>,
    ) -> std::result::Result<&'a Adventurer, ValidationError> {
        let adventurer = self
            .run
            .adventurer(id)
            .ok_or(ValidationError::UnknownAdventurer(id))?;
        if !assigned.insert(id) {
            return Err(ValidationError::IneligibleAdventurer {
                id,
                reason: Ineligibility::AlreadyAssigned,
            });
        }
        Ok(adventurer)
    }

    fn ready_member(
        &self,
        id: AdventurerId,
        assigned: &mut BTreeSet<AdventurerId>,
    ) -> std::result::Result<&'a Adventurer, ValidationError> {
        let adventurer = self.member(id, assigned)?;
        adventurer
            .check_ready()
            .map_err(|reason| ValidationError::IneligibleAdventurer { id, reason })?;
        Ok(adventurer)
    }

    fn check_action(
        &self,
        action: &SubAction,
        staged: &Guild,
        assigned: &mut BTreeSet<AdventurerId>,
    ) -> Result<()> {
        match action {
            SubAction::Expedition { dungeon, team } => {
                let def = self
                    .ctx
                    .catalog
                    .dungeon(dungeon)
                    .ok_or_else(|| ValidationError::UnknownDungeon(dungeon.clone()))?;
                if team.is_empty() {
                    return Err(ValidationError::EmptyTeam.into());
                }
                if team.len() < def.min_team_size || team.len() > def.max_team_size {
                    return Err(ValidationError::TeamSize {
                        dungeon: dungeon.clone(),
                        size: team.len(),
                        min: def.min_team_size,
                        max: def.max_team_size,
                    }
                    .into());
                }
                let mut members = Vec::with_capacity(team.len());
                for &id in team {
                    members.push(self.ready_member(id, assigned)?);
                }
                for req in &def.stat_requirements {
                    let mut best = 0;
                    for member in &members {
                        best = best.max(effective_stat(member, req.stat, self.ctx.catalog)?);
                    }
                    if best < i32::from(req.minimum) {
                        return Err(ValidationError::StatThreshold {
                            dungeon: dungeon.clone(),
                            stat: req.stat,
                            minimum: req.minimum,
                        }
                        .into());
                    }
                }
            }
            SubAction::Train { adventurer, stat } => {
                let member = self.ready_member(*adventurer, assigned)?;
                if member.stats.get(*stat) >= member.stat_cap {
                    return Err(ValidationError::StatAtCap {
                        id: *adventurer,
                        stat: *stat,
                    }
                    .into());
                }
            }
            SubAction::Recruit => {
                if self.ctx.talent.candidates().is_empty() {
                    return Err(ValidationError::NoCandidates.into());
                }
            }
            // Facility availability and level are checked while pricing
            SubAction::UpgradeFacility { .. } => {}
            SubAction::Rest { adventurer } => {
                let member = self.member(*adventurer, assigned)?;
                if member.condition == Condition::Ready {
                    return Err(ValidationError::IneligibleAdventurer {
                        id: *adventurer,
                        reason: Ineligibility::NothingToRecover,
                    }
                    .into());
                }
            }
            SubAction::Equip { adventurer, item } => {
                self.member(*adventurer, assigned)?;
                if !staged.inventory.contains(item) {
                    return Err(ValidationError::ItemNotInInventory(item.clone()).into());
                }
            }
        }
        Ok(())
    }

    fn stage_action(&self, action: &SubAction, staged: &mut Guild) -> Result<()> {
        match action {
            SubAction::UpgradeFacility { facility } => {
                let next = staged.facility_level(*facility).saturating_add(1);
                staged.raise_facility(*facility, next);
            }
            SubAction::Equip { adventurer, item } => {
                let def = self
                    .ctx
                    .catalog
                    .equipment(item)
                    .ok_or_else(|| IntegrityViolation::UnknownEquipment(item.clone()))?;
                staged.take_item(item);
                let replaced = self
                    .run
                    .adventurer(*adventurer)
                    .and_then(|a| a.equipped.get(&def.slot));
                if let Some(old) = replaced {
                    staged.inventory.push(old.clone());
                }
            }
            _ => {}
        }
        Ok(())
    }
}

// ============================================================================
// Validated
// ============================================================================

/// A plan that passed validation, with its cost preview
pub struct ValidatedDay<'a> {
    run: &'a GameRun,
    ctx: DayContext<'a>,
    plan: DailyPlan,
    preview: PlanPreview,
}

impl<'a> ValidatedDay<'a> {
    /// The costs that will be charged
    pub fn preview(&self) -> &PlanPreview {
        &self.preview
    }

    /// Consume into the preview without executing
    pub fn into_preview(self) -> PlanPreview {
        self.preview
    }

    /// Resolve every sub-action in plan order
    ///
    /// Works on a copy of the run RNG and a staged copy of the guild; the
    /// run itself is untouched.
    pub fn execute(self) -> Result<ExecutedDay<'a>> {
        let run = self.run;
        let catalog = self.ctx.catalog;
        let modifiers = run.calendar.modifiers();
        let day = run.day();

        let mut rng = run.rng.clone();
        let mut staged = run.guild.clone();
        let mut next_id = run.next_adventurer_id;
        let mut lines = self.preview.upkeep.clone();
        let mut transaction = DayTransaction::new();
        let mut outcomes = Vec::with_capacity(self.plan.actions.len());

        for (action, cost) in self.plan.actions.iter().zip(&self.preview.costs) {
            lines.extend(cost.lines.iter().cloned());

            let resolution = {
                let rctx = ResolveContext {
                    catalog,
                    profile: &run.profile,
                    guild: &staged,
                    modifiers,
                    day,
                };
                match action {
                    SubAction::Expedition { dungeon, team } => {
                        let def = catalog
                            .dungeon(dungeon)
                            .ok_or_else(|| IntegrityViolation::UnknownDungeon(dungeon.clone()))?;
                        let mut members = Vec::with_capacity(team.len());
                        for &id in team {
                            members.push(
                                run.adventurer(id)
                                    .ok_or(IntegrityViolation::MissingAdventurer(id))?,
                            );
                        }
                        resolve_expedition(&rctx, def, &members, &mut rng)?
                    }
                    SubAction::Train { adventurer, stat } => {
                        let member = run
                            .adventurer(*adventurer)
                            .ok_or(IntegrityViolation::MissingAdventurer(*adventurer))?;
                        resolve_training(&rctx, member, *stat, &mut rng)
                    }
                    SubAction::Recruit => resolve_recruitment(
                        &rctx,
                        self.ctx.talent.candidates(),
                        AdventurerId(next_id),
                        &mut rng,
                    )?,
                    SubAction::UpgradeFacility { facility } => resolve_upgrade(&rctx, *facility),
                    SubAction::Rest { adventurer } => {
                        let member = run
                            .adventurer(*adventurer)
                            .ok_or(IntegrityViolation::MissingAdventurer(*adventurer))?;
                        resolve_rest(&rctx, member)
                    }
                    SubAction::Equip { adventurer, item } => {
                        let member = run
                            .adventurer(*adventurer)
                            .ok_or(IntegrityViolation::MissingAdventurer(*adventurer))?;
                        resolve_equip(&rctx, member, item)?
                    }
                }
            };

            if let ActionOutcome::Recruitment { hired: Some(_), .. } = resolution.outcome {
                next_id += 1;
            }
            for delta in &resolution.deltas {
                delta.stage(&mut staged);
            }
            log::debug!(
                "{} day {}: {} -> {}",
                run.id,
                day,
                action.kind(),
                resolution.outcome.tier()
            );

            lines.extend(resolution.lines);
            transaction.extend(resolution.deltas);
            outcomes.push(resolution.outcome);
        }

        Ok(ExecutedDay {
            run,
            lines,
            transaction,
            outcomes,
            rng,
            next_adventurer_id: next_id,
        })
    }
}

// ============================================================================
// Executed
// ============================================================================

/// A day whose sub-actions have all resolved but whose money has not moved
pub struct ExecutedDay<'a> {
    run: &'a GameRun,
    lines: Vec<LedgerLine>,
    transaction: DayTransaction,
    outcomes: Vec<ActionOutcome>,
    rng: GameRng,
    next_adventurer_id: u64,
}

impl<'a> ExecutedDay<'a> {
    /// What each sub-action resolved to
    pub fn outcomes(&self) -> &[ActionOutcome] {
        &self.outcomes
    }

    /// Net the ledger against the treasury
    ///
    /// Fails with `SettlementRollback` when outcome-dependent costs would
    /// leave the treasury negative; the whole day is then discarded.
    pub fn settle(self) -> Result<Settlement> {
        let run = self.run;
        let expenses = total_expenses(&self.lines);
        let income = total_income(&self.lines);
        let net_delta = to_i64(income) - to_i64(expenses);
        let before = run.guild.treasury;
        let after = i128::from(before) + i128::from(net_delta);

        if after < 0 {
            let shortfall = u64::try_from(-after).unwrap_or(u64::MAX);
            log::warn!(
                "{} day {} rolled back: net {} against treasury {}",
                run.id,
                run.day(),
                net_delta,
                before
            );
            return Err(Error::SettlementRollback { shortfall });
        }
        let resulting_treasury = u64::try_from(after).unwrap_or(u64::MAX);

        Ok(Settlement {
            expense: DailyExpense {
                run_id: run.id,
                day: run.day(),
                day_type: run.calendar.day_type(),
                lines: self.lines,
                total_expenses: expenses,
                total_income: income,
                net_delta,
                treasury_before: before,
                resulting_treasury,
                outcomes: self.outcomes,
            },
            transaction: self.transaction,
            rng: self.rng,
            next_adventurer_id: self.next_adventurer_id,
        })
    }
}

fn to_i64(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

/// Run a plan through every state up to settlement
pub fn execute_day(run: &GameRun, plan: DailyPlan, ctx: DayContext<'_>) -> Result<Settlement> {
    ProposedDay::new(run, ctx, plan)
        .validate()?
        .execute()?
        .settle()
}

/// Validate a plan and return its cost preview without resolving it
pub fn preview_day(run: &GameRun, plan: DailyPlan, ctx: DayContext<'_>) -> Result<PlanPreview> {
    Ok(ProposedDay::new(run, ctx, plan).validate()?.into_preview())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adventurer::{CorporateClass, Seniority, StatBlock, StatKind};
    use crate::catalog::{
        ActionKind, Candidate, Dungeon, EquipmentDef, EquipmentSlot, ExpenseCategory,
        ExpenseTemplate, FacilityDef, FacilityKind, LootEntry, Rarity, StatModifier,
        StatRequirement, StaticTalentPool, TemplateBasis,
    };
    use crate::run::{Difficulty, DifficultyProfile, RunStatus};
    use crate::transaction::PendingDelta;
    use crate::{DefId, RunId};

    fn template(
        category: ExpenseCategory,
        basis: TemplateBasis,
        base_cost: u64,
        time_cost: u32,
    ) -> ExpenseTemplate {
        ExpenseTemplate {
            id: DefId::new(format!("{:?}", basis)),
            name: format!("{:?}", category),
            category,
            basis,
            base_cost,
            per_adventurer: 0,
            per_facility_level: 0,
            time_cost,
            market_sensitive: false,
        }
    }

    fn dungeon(id: &str, difficulty: u32, requirements: Vec<StatRequirement>) -> Dungeon {
        Dungeon {
            id: DefId::new(id),
            name: id.to_string(),
            difficulty,
            min_team_size: 1,
            max_team_size: 3,
            stat_requirements: requirements,
            focus: vec![StatKind::Synergy],
            base_gold: 300,
            base_experience: 100,
            reputation: 10,
            loot: vec![LootEntry {
                item: Some(DefId::new("mba")),
                weight: 1,
            }],
            injury_chance: 1.0,
            injury_days: 2,
            medical_cost: 200,
        }
    }

    fn catalog() -> Catalog {
        use ActionKind::*;
        let mut catalog = Catalog::new();
        catalog.templates = vec![
            template(ExpenseCategory::GuildOverhead, TemplateBasis::Upkeep, 50, 0),
            template(
                ExpenseCategory::DungeonPreparation,
                TemplateBasis::Action(Expedition),
                30,
                100,
            ),
            template(
                ExpenseCategory::TrainingCosts,
                TemplateBasis::Action(Training),
                100,
                25,
            ),
            template(
                ExpenseCategory::RecruitmentFees,
                TemplateBasis::Action(Recruitment),
                40,
                50,
            ),
            template(
                ExpenseCategory::FacilityInvestment,
                TemplateBasis::Action(FacilityUpgrade),
                0,
                25,
            ),
            template(ExpenseCategory::GuildOverhead, TemplateBasis::Action(Rest), 0, 10),
            template(ExpenseCategory::GuildOverhead, TemplateBasis::Action(Equip), 0, 5),
        ];
        for d in [
            dungeon("standup", 40, Vec::new()),
            dungeon("hell", 5000, Vec::new()),
            dungeon(
                "boardroom",
                40,
                vec![StatRequirement {
                    stat: StatKind::Optics,
                    minimum: 80,
                }],
            ),
        ] {
            catalog.dungeons.insert(d.id.clone(), d);
        }
        catalog.equipment.insert(
            DefId::new("mba"),
            EquipmentDef {
                id: DefId::new("mba"),
                name: "MBA".to_string(),
                slot: EquipmentSlot::Certification,
                rarity: Rarity::Rare,
                modifiers: vec![StatModifier {
                    stat: StatKind::Optics,
                    amount: 10,
                }],
                sale_value: 60,
            },
        );
        catalog.facilities.insert(
            FacilityKind::TrainingRoom,
            FacilityDef {
                kind: FacilityKind::TrainingRoom,
                name: "Training Room".to_string(),
                max_level: 3,
                base_cost: 300,
                cost_multiplier_pct: 200,
                upkeep_per_level: 15,
            },
        );
        catalog
    }

    fn pool() -> StaticTalentPool {
        StaticTalentPool::new(vec![Candidate {
            id: DefId::new("jordan"),
            name: "Jordan".to_string(),
            class: CorporateClass::StakeholderManager,
            seniority: Seniority::Associate,
            stats: StatBlock::uniform(25),
            hire_cost: 150,
            salary: 0,
            weight: 1,
        }])
    }

    fn run(treasury: u64, roster: usize) -> GameRun {
        let profile = DifficultyProfile {
            starting_treasury: treasury,
            starting_roster_size: 0,
            day_limit: 30,
            target_treasury: 100_000,
            target_reputation: 500,
            cost_scaling_pct: 100,
            reward_scaling_pct: 100,
        };
        let mut run = GameRun::new(RunId(1), 7, Difficulty::Intern, profile);
        let candidates = pool();
        for _ in 0..roster {
            run.hire(&candidates.candidates[0]);
        }
        run
    }

    fn train(id: u64) -> SubAction {
        SubAction::Train {
            adventurer: AdventurerId(id),
            stat: StatKind::Synergy,
        }
    }

    fn validation(err: Error) -> ValidationError {
        match err {
            Error::Validation(v) => v,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_training_day_settlement() {
        let catalog = catalog();
        let pool = pool();
        let run = run(1000, 1);
        let ctx = DayContext::new(&catalog, &pool);

        let settlement = execute_day(&run, DailyPlan::partial(vec![train(1)]), ctx).unwrap();
        let expense = &settlement.expense;
        assert_eq!(expense.day, 0);
        assert_eq!(expense.total_expenses, 150);
        assert_eq!(expense.net_delta, -150);
        assert_eq!(expense.treasury_before, 1000);
        assert_eq!(expense.resulting_treasury, 850);
        assert_eq!(expense.outcomes.len(), 1);
        assert!(settlement
            .transaction
            .iter()
            .any(|d| matches!(d, PendingDelta::SetStat { .. })));
        assert_ne!(settlement.rng, run.rng);
    }

    #[test]
    fn test_preview_matches_settlement() {
        let catalog = catalog();
        let pool = pool();
        let run = run(5000, 2);
        let ctx = DayContext::new(&catalog, &pool);
        let plan = DailyPlan::partial(vec![
            train(1),
            SubAction::UpgradeFacility {
                facility: FacilityKind::TrainingRoom,
            },
            SubAction::UpgradeFacility {
                facility: FacilityKind::TrainingRoom,
            },
        ]);

        let preview = preview_day(&run, plan.clone(), ctx).unwrap();
        // upkeep 50 + training 100 + upgrades 300 and 600
        assert_eq!(preview.total_cost, 1050);
        assert_eq!(preview.time_used, 75);

        let settlement = execute_day(&run, plan, ctx).unwrap();
        assert_eq!(settlement.expense.total_expenses, preview.total_cost);
        assert!(settlement
            .transaction
            .iter()
            .any(|d| *d
                == PendingDelta::UpgradeFacility {
                    facility: FacilityKind::TrainingRoom,
                    to_level: 2,
                }));
    }

    #[test]
    fn test_idle_day_pays_upkeep_only() {
        let catalog = catalog();
        let pool = pool();
        let run = run(100, 0);
        let settlement =
            execute_day(&run, DailyPlan::idle(), DayContext::new(&catalog, &pool)).unwrap();
        assert_eq!(settlement.expense.resulting_treasury, 50);
        assert!(settlement.transaction.is_empty());
        assert!(settlement.expense.outcomes.is_empty());
    }

    #[test]
    fn test_over_time_budget() {
        let catalog = catalog();
        let pool = pool();
        let run = run(10_000, 5);
        let plan = DailyPlan::partial((1..=5).map(train).collect());
        let err = execute_day(&run, plan, DayContext::new(&catalog, &pool)).unwrap_err();
        assert_eq!(
            validation(err),
            ValidationError::OverTimeBudget {
                required: 125,
                available: DAY_TIME_UNITS,
            }
        );
    }

    #[test]
    fn test_insufficient_treasury() {
        let catalog = catalog();
        let pool = pool();
        let run = run(120, 1);
        let err = execute_day(
            &run,
            DailyPlan::partial(vec![train(1)]),
            DayContext::new(&catalog, &pool),
        )
        .unwrap_err();
        assert_eq!(
            validation(err),
            ValidationError::InsufficientTreasury {
                required: 150,
                available: 120,
            }
        );
    }

    #[test]
    fn test_expedition_without_eligible_members() {
        let catalog = catalog();
        let pool = pool();
        let ctx = DayContext::new(&catalog, &pool);
        let mut run = run(1000, 2);
        for adv in run.roster.values_mut() {
            adv.condition = Condition::Fatigued { until_day: 3 };
        }

        let plan = DailyPlan::expedition("standup", vec![AdventurerId(1), AdventurerId(2)]);
        let err = execute_day(&run, plan, ctx).unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::IneligibleAdventurer {
                reason: Ineligibility::Fatigued { until_day: 3 },
                ..
            }
        ));

        let err = execute_day(&run, DailyPlan::expedition("standup", Vec::new()), ctx).unwrap_err();
        assert_eq!(validation(err), ValidationError::EmptyTeam);
    }

    #[test]
    fn test_expedition_reference_checks() {
        let catalog = catalog();
        let pool = pool();
        let ctx = DayContext::new(&catalog, &pool);
        let run = run(1000, 1);

        let err = execute_day(&run, DailyPlan::expedition("nowhere", vec![AdventurerId(1)]), ctx)
            .unwrap_err();
        assert_eq!(
            validation(err),
            ValidationError::UnknownDungeon(DefId::new("nowhere"))
        );

        let err = execute_day(&run, DailyPlan::expedition("standup", vec![AdventurerId(9)]), ctx)
            .unwrap_err();
        assert_eq!(
            validation(err),
            ValidationError::UnknownAdventurer(AdventurerId(9))
        );

        let err = execute_day(
            &run,
            DailyPlan::expedition("boardroom", vec![AdventurerId(1)]),
            ctx,
        )
        .unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::StatThreshold { minimum: 80, .. }
        ));
    }

    #[test]
    fn test_malformed_and_double_booked_plans() {
        let catalog = catalog();
        let pool = pool();
        let ctx = DayContext::new(&catalog, &pool);
        let run = run(1000, 1);

        let mixed = DailyPlan::partial(vec![SubAction::Expedition {
            dungeon: DefId::new("standup"),
            team: vec![AdventurerId(1)],
        }]);
        assert!(matches!(
            validation(execute_day(&run, mixed, ctx).unwrap_err()),
            ValidationError::MalformedPlan(_)
        ));

        let twice = DailyPlan::partial(vec![
            train(1),
            SubAction::Train {
                adventurer: AdventurerId(1),
                stat: StatKind::Optics,
            },
        ]);
        assert_eq!(
            validation(execute_day(&run, twice, ctx).unwrap_err()),
            ValidationError::IneligibleAdventurer {
                id: AdventurerId(1),
                reason: Ineligibility::AlreadyAssigned,
            }
        );
    }

    #[test]
    fn test_equip_requires_inventory() {
        let catalog = catalog();
        let pool = pool();
        let ctx = DayContext::new(&catalog, &pool);
        let mut run = run(1000, 2);
        let equip = |id| SubAction::Equip {
            adventurer: AdventurerId(id),
            item: DefId::new("mba"),
        };

        let err = execute_day(&run, DailyPlan::partial(vec![equip(1)]), ctx).unwrap_err();
        assert_eq!(
            validation(err),
            ValidationError::ItemNotInInventory(DefId::new("mba"))
        );

        run.guild.inventory.push(DefId::new("mba"));
        assert!(execute_day(&run, DailyPlan::partial(vec![equip(1)]), ctx).is_ok());
        let err =
            execute_day(&run, DailyPlan::partial(vec![equip(1), equip(2)]), ctx).unwrap_err();
        assert_eq!(
            validation(err),
            ValidationError::ItemNotInInventory(DefId::new("mba"))
        );
    }

    #[test]
    fn test_rest_requires_something_to_recover() {
        let catalog = catalog();
        let pool = pool();
        let run = run(1000, 1);
        let plan = DailyPlan::partial(vec![SubAction::Rest {
            adventurer: AdventurerId(1),
        }]);
        let err = execute_day(&run, plan, DayContext::new(&catalog, &pool)).unwrap_err();
        assert!(matches!(
            validation(err),
            ValidationError::IneligibleAdventurer {
                reason: Ineligibility::NothingToRecover,
                ..
            }
        ));
    }

    #[test]
    fn test_concluded_run_is_integrity_violation() {
        let catalog = catalog();
        let pool = pool();
        let mut run = run(1000, 1);
        run.conclude(RunStatus::Won, "done");
        let err = execute_day(&run, DailyPlan::idle(), DayContext::new(&catalog, &pool))
            .unwrap_err();
        assert!(!err.is_recoverable());
        assert!(matches!(
            err,
            Error::Integrity(IntegrityViolation::RunConcluded { .. })
        ));
    }

    #[test]
    fn test_medical_bills_roll_back_the_day() {
        let catalog = catalog();
        let pool = pool();
        let ctx = DayContext::new(&catalog, &pool);
        // exactly upkeep 50 + expedition 30
        let mut run = run(80, 1);
        let plan = DailyPlan::expedition("hell", vec![AdventurerId(1)]);

        let mut rollbacks = 0;
        for seed in 0..64 {
            run.rng = GameRng::new(seed);
            match execute_day(&run, plan.clone(), ctx) {
                Err(Error::SettlementRollback { shortfall }) => {
                    assert_eq!(shortfall, 200);
                    rollbacks += 1;
                }
                Ok(settlement) => {
                    assert!(settlement.expense.total_income > 0);
                }
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }
        assert!(rollbacks > 0);
    }

    #[test]
    fn test_same_seed_same_settlement() {
        let catalog = catalog();
        let pool = pool();
        let ctx = DayContext::new(&catalog, &pool);
        let run = run(1000, 2);
        let plan = DailyPlan::expedition("standup", vec![AdventurerId(1), AdventurerId(2)]);

        let a = execute_day(&run, plan.clone(), ctx).unwrap();
        let b = execute_day(&run, plan, ctx).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_recruitment_assigns_next_id() {
        let catalog = catalog();
        let pool = pool();
        let ctx = DayContext::new(&catalog, &pool);
        let mut run = run(1000, 1);

        let mut hired = false;
        for seed in 0..32 {
            run.rng = GameRng::new(seed);
            let settlement =
                execute_day(&run, DailyPlan::partial(vec![SubAction::Recruit]), ctx).unwrap();
            if let Some(ActionOutcome::Recruitment { hired: Some(id), .. }) =
                settlement.expense.outcomes.first()
            {
                hired = true;
                assert_eq!(*id, AdventurerId(2));
                assert_eq!(settlement.next_adventurer_id, 3);
                assert_eq!(settlement.expense.total_expenses, 50 + 40 + 150);
            } else {
                assert_eq!(settlement.next_adventurer_id, 2);
            }
        }
        assert!(hired);
    }
}
