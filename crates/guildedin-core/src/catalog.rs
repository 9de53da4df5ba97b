//! Read-only content catalog: dungeons, equipment, facilities, expense templates
//!
//! The catalog is loaded once and shared immutably between all runs
//! (typically behind an `Arc`). Nothing in the engine mutates it, so
//! concurrent reads need no synchronization.

use crate::adventurer::{CorporateClass, Seniority, StatBlock, StatKind};
use crate::error::IntegrityViolation;
use crate::DefId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Equipment
// ============================================================================

/// Equipment slot; an adventurer holds at most one item per slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Certification,
    SoftwareLicense,
    NetworkingTool,
    ProductivitySuite,
    LeadershipBadge,
    WellnessPerk,
}

/// Rarity tier of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// A flat bonus (or penalty) to one stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: StatKind,
    pub amount: i8,
}

/// Immutable item definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentDef {
    pub id: DefId,
    pub name: String,
    pub slot: EquipmentSlot,
    pub rarity: Rarity,
    pub modifiers: Vec<StatModifier>,
    /// Price paid when surplus loot is sold
    pub sale_value: u64,
}

impl EquipmentDef {
    /// Total modifier this item gives to a stat
    pub fn modifier(&self, stat: StatKind) -> i32 {
        self.modifiers
            .iter()
            .filter(|m| m.stat == stat)
            .map(|m| i32::from(m.amount))
            .sum()
    }
}

// ============================================================================
// Dungeons
// ============================================================================

/// Minimum value the best team member must reach in a stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRequirement {
    pub stat: StatKind,
    pub minimum: u8,
}

/// One row of a dungeon's weighted loot table
///
/// `item: None` is the "nothing dropped" row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item: Option<DefId>,
    pub weight: u32,
}

/// An expedition target. Fixed at definition time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dungeon {
    pub id: DefId,
    pub name: String,
    /// Rating compared against team power
    pub difficulty: u32,
    pub min_team_size: usize,
    pub max_team_size: usize,
    pub stat_requirements: Vec<StatRequirement>,
    /// Stats that count toward team power; empty means all stats
    pub focus: Vec<StatKind>,
    pub base_gold: u64,
    pub base_experience: u32,
    /// Reputation gained on a full success
    pub reputation: u32,
    pub loot: Vec<LootEntry>,
    /// Chance for each member of a failed team to be injured
    pub injury_chance: f64,
    /// Days an injury lasts
    pub injury_days: u32,
    /// Treatment cost per injured adventurer
    pub medical_cost: u64,
}

// ============================================================================
// Facilities
// ============================================================================

/// Upgradeable guild facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FacilityKind {
    /// Bigger training gains
    TrainingRoom,
    /// Better recruitment odds and candidates
    NetworkingLounge,
    /// Faster injury recovery
    WellnessCenter,
    /// Expedition power bonus
    StrategyCenter,
    /// Larger loot inventory
    EquipmentStorage,
}

impl FacilityKind {
    /// All facility kinds
    pub const ALL: [FacilityKind; 5] = [
        FacilityKind::TrainingRoom,
        FacilityKind::NetworkingLounge,
        FacilityKind::WellnessCenter,
        FacilityKind::StrategyCenter,
        FacilityKind::EquipmentStorage,
    ];
}

impl fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FacilityKind::TrainingRoom => "training_room",
            FacilityKind::NetworkingLounge => "networking_lounge",
            FacilityKind::WellnessCenter => "wellness_center",
            FacilityKind::StrategyCenter => "strategy_center",
            FacilityKind::EquipmentStorage => "equipment_storage",
        };
        f.write_str(name)
    }
}

/// Facility definition: upgrade pricing and upkeep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityDef {
    pub kind: FacilityKind,
    pub name: String,
    pub max_level: u8,
    /// Price of reaching level 1
    pub base_cost: u64,
    /// Price growth per level, in percent (200 doubles each level)
    pub cost_multiplier_pct: u32,
    /// Daily upkeep per level
    pub upkeep_per_level: u64,
}

impl FacilityDef {
    /// Price of upgrading from `current_level` to the next level
    pub fn upgrade_cost(&self, current_level: u8) -> u64 {
        let mut cost = self.base_cost;
        for _ in 0..current_level {
            cost = cost.saturating_mul(u64::from(self.cost_multiplier_pct)) / 100;
        }
        cost
    }

    /// Daily upkeep at a level
    pub fn upkeep(&self, level: u8) -> u64 {
        self.upkeep_per_level.saturating_mul(u64::from(level))
    }
}

// ============================================================================
// Expense templates
// ============================================================================

/// Kind of a plan sub-action, used to key expense templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Expedition,
    Training,
    Recruitment,
    FacilityUpgrade,
    Rest,
    Equip,
}

impl ActionKind {
    /// All action kinds
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Expedition,
        ActionKind::Training,
        ActionKind::Recruitment,
        ActionKind::FacilityUpgrade,
        ActionKind::Rest,
        ActionKind::Equip,
    ];

    /// Facility whose level scales this action's template cost
    pub fn facility(self) -> Option<FacilityKind> {
        match self {
            ActionKind::Expedition => Some(FacilityKind::StrategyCenter),
            ActionKind::Training => Some(FacilityKind::TrainingRoom),
            ActionKind::Recruitment => Some(FacilityKind::NetworkingLounge),
            ActionKind::Rest => Some(FacilityKind::WellnessCenter),
            ActionKind::FacilityUpgrade | ActionKind::Equip => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Expedition => "expedition",
            ActionKind::Training => "training",
            ActionKind::Recruitment => "recruitment",
            ActionKind::FacilityUpgrade => "facility_upgrade",
            ActionKind::Rest => "rest",
            ActionKind::Equip => "equip",
        };
        f.write_str(name)
    }
}

/// Ledger category for cost and income lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    AdventurerSalaries,
    FacilityMaintenance,
    GuildOverhead,
    TrainingCosts,
    RecruitmentFees,
    DungeonPreparation,
    FacilityInvestment,
    EmergencyExpenses,
    DungeonRewards,
    EquipmentSales,
}

impl ExpenseCategory {
    /// True for categories that record money coming in
    pub fn is_income(self) -> bool {
        matches!(
            self,
            ExpenseCategory::DungeonRewards | ExpenseCategory::EquipmentSales
        )
    }
}

/// When a template applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateBasis {
    /// Charged every day as part of upkeep
    Upkeep,
    /// Charged when a sub-action of this kind is executed
    Action(ActionKind),
}

/// Parameterized cost function
///
/// `base_cost + per_adventurer * n + per_facility_level * level`, where for
/// upkeep `n` is the roster size and `level` the sum of all facility levels,
/// and for actions `n` is the number of participants and `level` the level
/// of the facility tied to the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseTemplate {
    pub id: DefId,
    pub name: String,
    pub category: ExpenseCategory,
    pub basis: TemplateBasis,
    #[serde(default)]
    pub base_cost: u64,
    #[serde(default)]
    pub per_adventurer: u64,
    #[serde(default)]
    pub per_facility_level: u64,
    /// Share of the day consumed, out of `DAY_TIME_UNITS`
    #[serde(default)]
    pub time_cost: u32,
    /// Whether the day's market modifier applies
    #[serde(default)]
    pub market_sensitive: bool,
}

impl ExpenseTemplate {
    /// Unscaled cost for `n` adventurers at a facility level
    pub fn raw_cost(&self, n: usize, level: u32) -> u64 {
        self.base_cost
            .saturating_add(self.per_adventurer.saturating_mul(n as u64))
            .saturating_add(self.per_facility_level.saturating_mul(u64::from(level)))
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// All static content the engine reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub dungeons: IndexMap<DefId, Dungeon>,
    pub equipment: IndexMap<DefId, EquipmentDef>,
    pub facilities: IndexMap<FacilityKind, FacilityDef>,
    pub templates: Vec<ExpenseTemplate>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a dungeon
    pub fn dungeon(&self, id: &DefId) -> Option<&Dungeon> {
        self.dungeons.get(id)
    }

    /// Look up an equipment definition
    pub fn equipment(&self, id: &DefId) -> Option<&EquipmentDef> {
        self.equipment.get(id)
    }

    /// Look up a facility definition
    pub fn facility(&self, kind: FacilityKind) -> Option<&FacilityDef> {
        self.facilities.get(&kind)
    }

    /// The template charged for an action kind
    pub fn action_template(&self, kind: ActionKind) -> Option<&ExpenseTemplate> {
        self.templates
            .iter()
            .find(|t| t.basis == TemplateBasis::Action(kind))
    }

    /// Templates charged as daily upkeep
    pub fn upkeep_templates(&self) -> impl Iterator<Item = &ExpenseTemplate> {
        self.templates
            .iter()
            .filter(|t| t.basis == TemplateBasis::Upkeep)
    }

    /// Check cross references inside the catalog
    ///
    /// Every action kind needs a template and every loot row must point at
    /// a defined item.
    pub fn validate(&self) -> Result<(), IntegrityViolation> {
        for kind in ActionKind::ALL {
            if self.action_template(kind).is_none() {
                return Err(IntegrityViolation::MissingTemplate(kind));
            }
        }
        for dungeon in self.dungeons.values() {
            for entry in &dungeon.loot {
                if let Some(item) = &entry.item {
                    if !self.equipment.contains_key(item) {
                        return Err(IntegrityViolation::UnknownEquipment(item.clone()));
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Talent pool
// ============================================================================

/// A recruitable candidate supplied by the talent pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: DefId,
    pub name: String,
    pub class: CorporateClass,
    pub seniority: Seniority,
    pub stats: StatBlock,
    pub hire_cost: u64,
    pub salary: u64,
    /// Relative draw weight
    pub weight: u32,
}

/// Source of recruitment candidates
///
/// Supplies content and distribution only; the resolver decides outcomes.
pub trait TalentPool: Send + Sync {
    /// Candidates available for drawing
    fn candidates(&self) -> &[Candidate];
}

/// A talent pool backed by a fixed list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticTalentPool {
    pub candidates: Vec<Candidate>,
}

impl StaticTalentPool {
    /// Create a pool from a list of candidates
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }
}

impl TalentPool for StaticTalentPool {
    fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }
}
