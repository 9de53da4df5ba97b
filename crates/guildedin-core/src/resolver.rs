//! Outcome resolver: turns one validated sub-action into concrete deltas
//!
//! Resolvers read state and draw from the run RNG handed to them; they never
//! mutate a run. Each call returns a [`Resolution`] holding what happened,
//! the deltas to buffer and any outcome-dependent ledger lines (loot sales,
//! hire costs, medical bills).
//!
//! # Expedition model
//!
//! Team power is compared with dungeon difficulty through a logistic curve:
//!
//! ```text
//! p_success = 1 / (1 + e^(-6 * (power / difficulty - 1)))
//! p_partial = (1 - p_success) / 2
//! ```
//!
//! An even match therefore succeeds half the time, and a team at twice the
//! difficulty almost always does.

use crate::adventurer::{Adventurer, Condition, Seniority, StatKind, STAT_MAX, STAT_MIN};
use crate::calendar::DayModifiers;
use crate::catalog::{ActionKind, Candidate, Catalog, Dungeon, ExpenseCategory, FacilityKind};
use crate::economy::scale_pct;
use crate::error::{IntegrityViolation, Result, ValidationError};
use crate::guild::Guild;
use crate::ledger::LedgerLine;
use crate::rng::GameRng;
use crate::run::DifficultyProfile;
use crate::transaction::PendingDelta;
use crate::{AdventurerId, DefId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days of fatigue after an expedition
pub const EXPEDITION_FATIGUE_DAYS: u32 = 2;
/// Experience an adventurer earns per training session
pub const TRAINING_EXPERIENCE: u32 = 20;
/// Guild experience per training session
pub const TRAINING_GUILD_EXP: u32 = 5;

/// Read-only inputs for resolving one sub-action
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub catalog: &'a Catalog,
    pub profile: &'a DifficultyProfile,
    /// Guild state as staged by earlier sub-actions of the day
    pub guild: &'a Guild,
    pub modifiers: DayModifiers,
    /// The day being resolved
    pub day: u32,
}

/// Result tier of a sub-action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeTier {
    Success,
    PartialSuccess,
    Failure,
}

impl fmt::Display for OutcomeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeTier::Success => f.write_str("success"),
            OutcomeTier::PartialSuccess => f.write_str("partial"),
            OutcomeTier::Failure => f.write_str("failure"),
        }
    }
}

/// What a sub-action resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    Expedition {
        dungeon: DefId,
        team: Vec<AdventurerId>,
        tier: OutcomeTier,
        /// Success probability, in thousandths
        success_permille: u32,
        gold: u64,
        experience: u32,
        loot: Option<DefId>,
        /// True when the loot was sold for lack of storage
        loot_sold: bool,
        injured: Vec<AdventurerId>,
    },
    Training {
        adventurer: AdventurerId,
        stat: StatKind,
        before: u8,
        after: u8,
    },
    Recruitment {
        candidate: DefId,
        /// Success probability, in thousandths
        success_permille: u32,
        hired: Option<AdventurerId>,
        hire_cost: u64,
    },
    FacilityUpgrade {
        facility: FacilityKind,
        level: u8,
    },
    Rest {
        adventurer: AdventurerId,
        condition: Condition,
    },
    Equip {
        adventurer: AdventurerId,
        item: DefId,
        replaced: Option<DefId>,
    },
}

impl ActionOutcome {
    /// The kind of action this outcome came from
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionOutcome::Expedition { .. } => ActionKind::Expedition,
            ActionOutcome::Training { .. } => ActionKind::Training,
            ActionOutcome::Recruitment { .. } => ActionKind::Recruitment,
            ActionOutcome::FacilityUpgrade { .. } => ActionKind::FacilityUpgrade,
            ActionOutcome::Rest { .. } => ActionKind::Rest,
            ActionOutcome::Equip { .. } => ActionKind::Equip,
        }
    }

    /// Tier of the outcome; deterministic actions always succeed
    pub fn tier(&self) -> OutcomeTier {
        match self {
            ActionOutcome::Expedition { tier, .. } => *tier,
            ActionOutcome::Recruitment { hired: None, .. } => OutcomeTier::Failure,
            _ => OutcomeTier::Success,
        }
    }
}

/// Output of one resolver call
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: ActionOutcome,
    pub deltas: Vec<PendingDelta>,
    /// Outcome-dependent income and expense lines
    pub lines: Vec<LedgerLine>,
}

impl Resolution {
    fn new(outcome: ActionOutcome) -> Self {
        Self {
            outcome,
            deltas: Vec::new(),
            lines: Vec::new(),
        }
    }
}

// ============================================================================
// Stats and power
// ============================================================================

/// Stat value after class and equipment modifiers, clamped to bounds
pub fn effective_stat(
    adventurer: &Adventurer,
    stat: StatKind,
    catalog: &Catalog,
) -> std::result::Result<i32, IntegrityViolation> {
    let mut value = adventurer.class_adjusted(stat);
    for item in adventurer.equipped.values() {
        let def = catalog
            .equipment(item)
            .ok_or_else(|| IntegrityViolation::UnknownEquipment(item.clone()))?;
        value += def.modifier(stat);
    }
    Ok(value.clamp(i32::from(STAT_MIN), i32::from(STAT_MAX)))
}

/// One member's contribution to team power
///
/// Mean of the dungeon's focus stats (all stats when it has none), plus two
/// points per level.
pub fn member_power(
    adventurer: &Adventurer,
    dungeon: &Dungeon,
    catalog: &Catalog,
) -> std::result::Result<f64, IntegrityViolation> {
    let focus: &[StatKind] = if dungeon.focus.is_empty() {
        &StatKind::ALL
    } else {
        &dungeon.focus
    };
    let mut sum = 0i32;
    for &stat in focus {
        sum += effective_stat(adventurer, stat, catalog)?;
    }
    let mean = f64::from(sum) / focus.len() as f64;
    Ok(mean + 2.0 * f64::from(adventurer.level()))
}

/// Aggregate team power with facility and calendar bonuses
pub fn team_power(
    ctx: &ResolveContext<'_>,
    dungeon: &Dungeon,
    team: &[&Adventurer],
) -> std::result::Result<f64, IntegrityViolation> {
    let mut power = 0.0;
    for member in team {
        power += member_power(member, dungeon, ctx.catalog)?;
    }
    let strategy = f64::from(ctx.guild.facility_level(FacilityKind::StrategyCenter));
    power *= (100.0 + 5.0 * strategy) / 100.0;
    power *= f64::from(ctx.modifiers.expedition_power_pct) / 100.0;
    Ok(power)
}

/// Logistic success probability for a power against a difficulty
pub fn success_probability(power: f64, difficulty: u32) -> f64 {
    let ratio = power / f64::from(difficulty.max(1));
    1.0 / (1.0 + (-6.0 * (ratio - 1.0)).exp())
}

fn permille(p: f64) -> u32 {
    (p.clamp(0.0, 1.0) * 1000.0).round() as u32
}

// ============================================================================
// Expedition
// ============================================================================

/// Resolve an expedition for a validated team
pub fn resolve_expedition(
    ctx: &ResolveContext<'_>,
    dungeon: &Dungeon,
    team: &[&Adventurer],
    rng: &mut GameRng,
) -> Result<Resolution> {
    let power = team_power(ctx, dungeon, team)?;
    let p_success = success_probability(power, dungeon.difficulty);
    let p_partial = (1.0 - p_success) * 0.5;

    let roll = rng.next_f64();
    let tier = if roll < p_success {
        OutcomeTier::Success
    } else if roll < p_success + p_partial {
        OutcomeTier::PartialSuccess
    } else {
        OutcomeTier::Failure
    };

    let full_gold = scale_pct(
        scale_pct(dungeon.base_gold, ctx.profile.reward_scaling_pct),
        ctx.modifiers.reward_pct,
    );
    let (gold, experience) = match tier {
        OutcomeTier::Success => (full_gold, dungeon.base_experience),
        OutcomeTier::PartialSuccess => (full_gold / 2, dungeon.base_experience / 2),
        OutcomeTier::Failure => (0, 0),
    };

    let mut deltas = Vec::new();
    let mut lines = Vec::new();
    let mut loot = None;
    let mut loot_sold = false;
    let mut injured = Vec::new();
    let fatigue = Condition::Fatigued {
        until_day: ctx.day + EXPEDITION_FATIGUE_DAYS,
    };

    if gold > 0 {
        lines.push(LedgerLine::income(
            ExpenseCategory::DungeonRewards,
            format!("Rewards from {}", dungeon.name),
            gold,
        ));
    }

    if tier == OutcomeTier::Success {
        let weights: Vec<u32> = dungeon.loot.iter().map(|e| e.weight).collect();
        let drop = rng
            .weighted_index(&weights)
            .and_then(|i| dungeon.loot.get(i))
            .and_then(|e| e.item.clone());
        if let Some(item) = drop {
            let def = ctx
                .catalog
                .equipment(&item)
                .ok_or_else(|| IntegrityViolation::UnknownEquipment(item.clone()))?;
            if ctx.guild.has_storage_room() {
                deltas.push(PendingDelta::AddItem { item: item.clone() });
            } else {
                loot_sold = true;
                lines.push(LedgerLine::income(
                    ExpenseCategory::EquipmentSales,
                    format!("Sold surplus {}", def.name),
                    def.sale_value,
                ));
            }
            loot = Some(item);
        }
    }

    for member in team {
        match tier {
            OutcomeTier::Success | OutcomeTier::PartialSuccess => {
                deltas.push(PendingDelta::GainExperience {
                    adventurer: member.id,
                    amount: experience,
                });
                if tier == OutcomeTier::Success {
                    deltas.push(PendingDelta::CompleteDungeon {
                        adventurer: member.id,
                    });
                }
                deltas.push(PendingDelta::SetCondition {
                    adventurer: member.id,
                    condition: fatigue,
                });
            }
            OutcomeTier::Failure => {
                if rng.chance(dungeon.injury_chance) {
                    injured.push(member.id);
                    deltas.push(PendingDelta::SetCondition {
                        adventurer: member.id,
                        condition: Condition::Injured {
                            until_day: ctx.day + 1 + dungeon.injury_days,
                        },
                    });
                    lines.push(LedgerLine::expense(
                        ExpenseCategory::EmergencyExpenses,
                        format!("Medical care for {}", member.name),
                        scale_pct(dungeon.medical_cost, ctx.profile.cost_scaling_pct),
                    ));
                } else {
                    deltas.push(PendingDelta::SetCondition {
                        adventurer: member.id,
                        condition: fatigue,
                    });
                }
            }
        }
    }

    let reputation = i32::try_from(dungeon.reputation).unwrap_or(i32::MAX);
    match tier {
        OutcomeTier::Success => {
            deltas.push(PendingDelta::AdjustReputation(reputation));
            deltas.push(PendingDelta::GainGuildExp(dungeon.base_experience / 10));
        }
        OutcomeTier::PartialSuccess => {
            deltas.push(PendingDelta::AdjustReputation(reputation / 2));
            deltas.push(PendingDelta::GainGuildExp(dungeon.base_experience / 20));
        }
        OutcomeTier::Failure => {
            deltas.push(PendingDelta::AdjustReputation(-(reputation / 2)));
        }
    }

    log::debug!(
        "expedition to {} with {} members: power {:.1} vs {}, {} (p={:.3})",
        dungeon.id,
        team.len(),
        power,
        dungeon.difficulty,
        tier,
        p_success
    );

    Ok(Resolution {
        outcome: ActionOutcome::Expedition {
            dungeon: dungeon.id.clone(),
            team: team.iter().map(|m| m.id).collect(),
            tier,
            success_permille: permille(p_success),
            gold,
            experience,
            loot,
            loot_sold,
            injured,
        },
        deltas,
        lines,
    })
}

// ============================================================================
// Training
// ============================================================================

/// Stat points a training session adds
///
/// The base gain shrinks linearly with the remaining headroom below the
/// adventurer's cap, but is never less than one point while below the cap.
pub fn training_gain(base: u32, current: u8, cap: u8) -> u8 {
    if current >= cap {
        return 0;
    }
    let headroom = u32::from(cap - current);
    let span = u32::from(cap.saturating_sub(1)).max(1);
    let gain = (base * headroom).div_ceil(span).max(1);
    u8::try_from(gain.min(headroom)).unwrap_or(u8::MAX)
}

/// Resolve a training session
pub fn resolve_training(
    ctx: &ResolveContext<'_>,
    adventurer: &Adventurer,
    stat: StatKind,
    rng: &mut GameRng,
) -> Resolution {
    let level = u32::from(ctx.guild.facility_level(FacilityKind::TrainingRoom));
    let base = 3 + level + rng.range_u32(0, 1);
    let before = adventurer.stats.get(stat);
    let after = before.saturating_add(training_gain(base, before, adventurer.stat_cap));

    log::debug!(
        "{} trained {}: {} -> {} (cap {})",
        adventurer.id,
        stat,
        before,
        after,
        adventurer.stat_cap
    );

    let mut resolution = Resolution::new(ActionOutcome::Training {
        adventurer: adventurer.id,
        stat,
        before,
        after,
    });
    resolution.deltas = vec![
        PendingDelta::SetStat {
            adventurer: adventurer.id,
            stat,
            value: after,
        },
        PendingDelta::GainExperience {
            adventurer: adventurer.id,
            amount: TRAINING_EXPERIENCE,
        },
        PendingDelta::GainGuildExp(TRAINING_GUILD_EXP),
    ];
    resolution
}

// ============================================================================
// Recruitment
// ============================================================================

fn seniority_rank(seniority: Seniority) -> u32 {
    match seniority {
        Seniority::Intern => 0,
        Seniority::Associate => 1,
        Seniority::Senior => 2,
        Seniority::Principal => 3,
        Seniority::Executive => 4,
    }
}

/// Recruitment success chance in percent, clamped to `5..=95`
pub fn recruit_chance(reputation: u32, lounge_level: u8, bonus: i32) -> u32 {
    let reputation_bonus = i64::from((reputation / 10).min(25));
    let chance = 50 + reputation_bonus + 5 * i64::from(lounge_level) + i64::from(bonus);
    chance.clamp(5, 95) as u32
}

/// Resolve a recruitment attempt
///
/// A networking lounge tilts the draw toward senior candidates. On success
/// the candidate joins under `next_id` and the hire cost is charged.
pub fn resolve_recruitment(
    ctx: &ResolveContext<'_>,
    candidates: &[Candidate],
    next_id: AdventurerId,
    rng: &mut GameRng,
) -> Result<Resolution> {
    let lounge = ctx.guild.facility_level(FacilityKind::NetworkingLounge);
    let weights: Vec<u32> = candidates
        .iter()
        .map(|c| {
            let tilt = 100 + u32::from(lounge) * 10 * seniority_rank(c.seniority);
            c.weight.saturating_mul(tilt) / 100
        })
        .collect();
    let candidate = rng
        .weighted_index(&weights)
        .and_then(|i| candidates.get(i))
        .ok_or(ValidationError::NoCandidates)?;

    let chance = recruit_chance(
        ctx.guild.reputation,
        lounge,
        ctx.modifiers.recruit_chance_bonus,
    );
    let hired = rng.range_u32(1, 100) <= chance;
    let hire_cost = scale_pct(
        scale_pct(candidate.hire_cost, ctx.profile.cost_scaling_pct),
        ctx.modifiers.recruitment_cost_pct,
    );

    log::debug!(
        "recruitment of {}: chance {}%, {}",
        candidate.id,
        chance,
        if hired { "hired" } else { "declined" }
    );

    let mut resolution = Resolution::new(ActionOutcome::Recruitment {
        candidate: candidate.id.clone(),
        success_permille: chance * 10,
        hired: hired.then_some(next_id),
        hire_cost: if hired { hire_cost } else { 0 },
    });
    if hired {
        resolution.deltas.push(PendingDelta::Hire {
            id: next_id,
            candidate: candidate.clone(),
        });
        resolution.lines.push(LedgerLine::expense(
            ExpenseCategory::RecruitmentFees,
            format!("Signing {}", candidate.name),
            hire_cost,
        ));
    }
    Ok(resolution)
}

// ============================================================================
// Facilities, rest and equipment
// ============================================================================

/// Resolve a facility upgrade; the price is charged as the action cost
pub fn resolve_upgrade(ctx: &ResolveContext<'_>, facility: FacilityKind) -> Resolution {
    let level = ctx.guild.facility_level(facility).saturating_add(1);
    let mut resolution = Resolution::new(ActionOutcome::FacilityUpgrade { facility, level });
    resolution.deltas.push(PendingDelta::UpgradeFacility {
        facility,
        to_level: level,
    });
    resolution
}

/// Resolve a rest day
///
/// Fatigue clears at settlement. Injuries heal `1 + wellness level` days
/// sooner, but never before tomorrow.
pub fn resolve_rest(ctx: &ResolveContext<'_>, adventurer: &Adventurer) -> Resolution {
    let wellness = u32::from(ctx.guild.facility_level(FacilityKind::WellnessCenter));
    let condition = match adventurer.condition {
        Condition::Injured { until_day } => Condition::Injured {
            until_day: until_day
                .saturating_sub(1 + wellness)
                .max(ctx.day + 1),
        },
        Condition::Fatigued { .. } | Condition::Ready => Condition::Ready,
    };
    let mut resolution = Resolution::new(ActionOutcome::Rest {
        adventurer: adventurer.id,
        condition,
    });
    resolution.deltas.push(PendingDelta::SetCondition {
        adventurer: adventurer.id,
        condition,
    });
    resolution
}

/// Resolve equipping an item from the guild inventory
pub fn resolve_equip(
    ctx: &ResolveContext<'_>,
    adventurer: &Adventurer,
    item: &DefId,
) -> Result<Resolution> {
    let def = ctx
        .catalog
        .equipment(item)
        .ok_or_else(|| IntegrityViolation::UnknownEquipment(item.clone()))?;
    let replaced = adventurer.equipped.get(&def.slot).cloned();
    let mut resolution = Resolution::new(ActionOutcome::Equip {
        adventurer: adventurer.id,
        item: item.clone(),
        replaced: replaced.clone(),
    });
    resolution.deltas.push(PendingDelta::EquipItem {
        adventurer: adventurer.id,
        item: item.clone(),
        slot: def.slot,
        replaced,
    });
    Ok(resolution)
}
