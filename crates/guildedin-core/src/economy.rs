//! Economy model: daily upkeep and per-action costs
//!
//! Both computations are pure functions of the state handed to them. The
//! executor calls them once during validation and reuses the result at
//! settlement, so a cost preview always matches what is charged.

use crate::adventurer::Adventurer;
use crate::calendar::DayModifiers;
use crate::catalog::{ActionKind, Catalog, ExpenseCategory, ExpenseTemplate, TemplateBasis};
use crate::error::{IntegrityViolation, Result, ValidationError};
use crate::guild::Guild;
use crate::ledger::{total_expenses, LedgerLine};
use crate::plan::SubAction;
use crate::run::DifficultyProfile;
use crate::AdventurerId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Apply a percentage to an amount, rounding down
pub fn scale_pct(amount: u64, pct: u32) -> u64 {
    let scaled = u128::from(amount) * u128::from(pct) / 100;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Read-only inputs shared by every cost computation for one day
#[derive(Debug, Clone, Copy)]
pub struct EconomyContext<'a> {
    pub catalog: &'a Catalog,
    pub profile: &'a DifficultyProfile,
    pub modifiers: DayModifiers,
}

impl<'a> EconomyContext<'a> {
    /// Create a context
    pub fn new(catalog: &'a Catalog, profile: &'a DifficultyProfile, modifiers: DayModifiers) -> Self {
        Self {
            catalog,
            profile,
            modifiers,
        }
    }

    fn template_cost(&self, template: &ExpenseTemplate, n: usize, level: u32) -> u64 {
        let mut cost = scale_pct(template.raw_cost(n, level), self.profile.cost_scaling_pct);
        if template.market_sensitive {
            cost = scale_pct(cost, self.modifiers.cost_pct);
            if template.basis == TemplateBasis::Action(ActionKind::Recruitment) {
                cost = scale_pct(cost, self.modifiers.recruitment_cost_pct);
            }
        }
        cost
    }
}

/// Cost of one sub-action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCost {
    pub kind: ActionKind,
    /// Time units consumed, out of `DAY_TIME_UNITS`
    pub time: u32,
    /// Treasury charged
    pub treasury: u64,
    /// Itemized expense lines summing to `treasury`
    pub lines: Vec<LedgerLine>,
}

/// Fixed recurring cost for the current day
///
/// Upkeep templates are charged against roster size and total facility
/// levels; salaries and per-level facility maintenance follow. Zero lines
/// are left out.
pub fn compute_daily_upkeep(
    ctx: &EconomyContext<'_>,
    guild: &Guild,
    roster: &IndexMap<AdventurerId, Adventurer>,
) -> std::result::Result<Vec<LedgerLine>, IntegrityViolation> {
    let mut lines = Vec::new();
    let levels = guild.total_facility_levels();

    for template in ctx.catalog.upkeep_templates() {
        let cost = ctx.template_cost(template, roster.len(), levels);
        if cost > 0 {
            lines.push(LedgerLine::expense(
                template.category,
                template.name.clone(),
                cost,
            ));
        }
    }

    let salaries: u64 = roster.values().map(|a| a.salary).sum();
    if salaries > 0 {
        lines.push(LedgerLine::expense(
            ExpenseCategory::AdventurerSalaries,
            format!("Salaries for {} adventurers", roster.len()),
            salaries,
        ));
    }

    let mut maintenance = 0u64;
    for (&kind, &level) in &guild.facilities {
        if level == 0 {
            continue;
        }
        let def = ctx.catalog.facility(kind).ok_or_else(|| {
            IntegrityViolation::CorruptState(format!("facility {} has no definition", kind))
        })?;
        maintenance = maintenance.saturating_add(def.upkeep(level));
    }
    if maintenance > 0 {
        lines.push(LedgerLine::expense(
            ExpenseCategory::FacilityMaintenance,
            "Facility maintenance",
            maintenance,
        ));
    }

    Ok(lines)
}

/// Total of an upkeep computation
pub fn upkeep_total(lines: &[LedgerLine]) -> u64 {
    total_expenses(lines)
}

/// Time and treasury cost of a single sub-action
///
/// `guild` is the state as staged by earlier sub-actions of the same day,
/// so a second upgrade of the same facility is priced at the next level.
pub fn compute_action_cost(
    ctx: &EconomyContext<'_>,
    guild: &Guild,
    roster_size: usize,
    action: &SubAction,
) -> Result<ActionCost> {
    let kind = action.kind();
    let template = ctx
        .catalog
        .action_template(kind)
        .ok_or(IntegrityViolation::MissingTemplate(kind))?;

    let n = match action {
        SubAction::Recruit => roster_size,
        other => other.participants().len(),
    };
    let level = kind
        .facility()
        .map(|f| u32::from(guild.facility_level(f)))
        .unwrap_or(0);

    let mut lines = Vec::new();
    let base = ctx.template_cost(template, n, level);
    if base > 0 {
        lines.push(LedgerLine::expense(
            template.category,
            template.name.clone(),
            base,
        ));
    }

    if let SubAction::UpgradeFacility { facility } = action {
        let def = ctx
            .catalog
            .facility(*facility)
            .ok_or(ValidationError::UnknownFacility(*facility))?;
        let current = guild.facility_level(*facility);
        if current >= def.max_level {
            return Err(ValidationError::FacilityMaxed(*facility).into());
        }
        lines.push(LedgerLine::expense(
            ExpenseCategory::FacilityInvestment,
            format!("Upgrade {} to level {}", def.name, current + 1),
            scale_pct(def.upgrade_cost(current), ctx.profile.cost_scaling_pct),
        ));
    }

    Ok(ActionCost {
        kind,
        time: template.time_cost,
        treasury: total_expenses(&lines),
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adventurer::{CorporateClass, Seniority, StatBlock};
    use crate::catalog::{FacilityDef, FacilityKind};
    use crate::error::Error;
    use crate::DefId;

    fn profile(cost_scaling_pct: u32) -> DifficultyProfile {
        DifficultyProfile {
            starting_treasury: 1000,
            starting_roster_size: 0,
            day_limit: 30,
            target_treasury: 5000,
            target_reputation: 50,
            cost_scaling_pct,
            reward_scaling_pct: 100,
        }
    }

    fn template(
        name: &str,
        category: ExpenseCategory,
        basis: TemplateBasis,
        base_cost: u64,
        per_adventurer: u64,
    ) -> ExpenseTemplate {
        ExpenseTemplate {
            id: DefId::new(name),
            name: name.to_string(),
            category,
            basis,
            base_cost,
            per_adventurer,
            per_facility_level: 0,
            time_cost: 25,
            market_sensitive: false,
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.templates.push(template(
            "Office rent",
            ExpenseCategory::GuildOverhead,
            TemplateBasis::Upkeep,
            50,
            0,
        ));
        catalog.templates.push(template(
            "Coaching",
            ExpenseCategory::TrainingCosts,
            TemplateBasis::Action(ActionKind::Training),
            100,
            0,
        ));
        let mut scouting = template(
            "Scouting",
            ExpenseCategory::RecruitmentFees,
            TemplateBasis::Action(ActionKind::Recruitment),
            40,
            10,
        );
        scouting.market_sensitive = true;
        catalog.templates.push(scouting);
        catalog.templates.push(template(
            "Permits",
            ExpenseCategory::FacilityInvestment,
            TemplateBasis::Action(ActionKind::FacilityUpgrade),
            0,
            0,
        ));
        catalog.facilities.insert(
            FacilityKind::TrainingRoom,
            FacilityDef {
                kind: FacilityKind::TrainingRoom,
                name: "Training Room".to_string(),
                max_level: 2,
                base_cost: 500,
                cost_multiplier_pct: 200,
                upkeep_per_level: 15,
            },
        );
        catalog
    }

    fn roster(salaries: &[u64]) -> IndexMap<AdventurerId, Adventurer> {
        salaries
            .iter()
            .enumerate()
            .map(|(i, &salary)| {
                let id = AdventurerId(i as u64 + 1);
                let adv = Adventurer::new(
                    id,
                    "a",
                    CorporateClass::EthicsOfficer,
                    Seniority::Senior,
                    StatBlock::default(),
                    salary,
                );
                (id, adv)
            })
            .collect()
    }

    #[test]
    fn test_upkeep_lines() {
        let catalog = catalog();
        let profile = profile(100);
        let ctx = EconomyContext::new(&catalog, &profile, DayModifiers::default());
        let mut guild = Guild::new(1000);
        guild.raise_facility(FacilityKind::TrainingRoom, 2);

        let lines = compute_daily_upkeep(&ctx, &guild, &roster(&[10, 20])).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(upkeep_total(&lines), 50 + 30 + 30);

        let empty = compute_daily_upkeep(&ctx, &Guild::new(0), &IndexMap::new()).unwrap();
        assert_eq!(upkeep_total(&empty), 50);
    }

    #[test]
    fn test_upkeep_is_deterministic() {
        let catalog = catalog();
        let profile = profile(150);
        let ctx = EconomyContext::new(&catalog, &profile, DayModifiers::default());
        let guild = Guild::new(0);
        let team = roster(&[5]);
        let a = compute_daily_upkeep(&ctx, &guild, &team).unwrap();
        let b = compute_daily_upkeep(&ctx, &guild, &team).unwrap();
        assert_eq!(a, b);
        assert_eq!(upkeep_total(&a), 75 + 5);
    }

    #[test]
    fn test_unknown_facility_level_is_integrity_error() {
        let catalog = catalog();
        let profile = profile(100);
        let ctx = EconomyContext::new(&catalog, &profile, DayModifiers::default());
        let mut guild = Guild::new(0);
        guild.raise_facility(FacilityKind::WellnessCenter, 1);
        assert!(matches!(
            compute_daily_upkeep(&ctx, &guild, &IndexMap::new()),
            Err(IntegrityViolation::CorruptState(_))
        ));
    }

    #[test]
    fn test_training_cost() {
        let catalog = catalog();
        let profile = profile(100);
        let ctx = EconomyContext::new(&catalog, &profile, DayModifiers::default());
        let action = SubAction::Train {
            adventurer: AdventurerId(1),
            stat: crate::adventurer::StatKind::Optics,
        };
        let cost = compute_action_cost(&ctx, &Guild::new(0), 1, &action).unwrap();
        assert_eq!(cost.treasury, 100);
        assert_eq!(cost.time, 25);
        assert_eq!(cost.lines.len(), 1);
    }

    #[test]
    fn test_recruitment_cost_is_market_sensitive() {
        let catalog = catalog();
        let profile = profile(100);
        let modifiers = DayModifiers {
            cost_pct: 110,
            recruitment_cost_pct: 80,
            ..DayModifiers::default()
        };
        let ctx = EconomyContext::new(&catalog, &profile, modifiers);
        let cost = compute_action_cost(&ctx, &Guild::new(0), 2, &SubAction::Recruit).unwrap();
        // (40 + 2 * 10) * 110% * 80%
        assert_eq!(cost.treasury, 52);
    }

    #[test]
    fn test_upgrade_cost_and_max_level() {
        let catalog = catalog();
        let profile = profile(100);
        let ctx = EconomyContext::new(&catalog, &profile, DayModifiers::default());
        let action = SubAction::UpgradeFacility {
            facility: FacilityKind::TrainingRoom,
        };
        let mut guild = Guild::new(0);
        assert_eq!(
            compute_action_cost(&ctx, &guild, 0, &action).unwrap().treasury,
            500
        );
        guild.raise_facility(FacilityKind::TrainingRoom, 1);
        assert_eq!(
            compute_action_cost(&ctx, &guild, 0, &action).unwrap().treasury,
            1000
        );
        guild.raise_facility(FacilityKind::TrainingRoom, 2);
        assert_eq!(
            compute_action_cost(&ctx, &guild, 0, &action),
            Err(Error::Validation(ValidationError::FacilityMaxed(
                FacilityKind::TrainingRoom
            )))
        );

        let unknown = SubAction::UpgradeFacility {
            facility: FacilityKind::StrategyCenter,
        };
        assert_eq!(
            compute_action_cost(&ctx, &guild, 0, &unknown),
            Err(Error::Validation(ValidationError::UnknownFacility(
                FacilityKind::StrategyCenter
            )))
        );
    }

    #[test]
    fn test_missing_template() {
        let catalog = catalog();
        let profile = profile(100);
        let ctx = EconomyContext::new(&catalog, &profile, DayModifiers::default());
        let rest = SubAction::Rest {
            adventurer: AdventurerId(1),
        };
        assert_eq!(
            compute_action_cost(&ctx, &Guild::new(0), 1, &rest),
            Err(Error::Integrity(IntegrityViolation::MissingTemplate(
                ActionKind::Rest
            )))
        );
    }
}
