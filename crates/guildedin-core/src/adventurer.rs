//! Roster members: corporate classes, competency stats and condition

use crate::catalog::EquipmentSlot;
use crate::{AdventurerId, DefId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lowest value any competency stat may hold
pub const STAT_MIN: u8 = 1;
/// Highest value any competency stat may hold
pub const STAT_MAX: u8 = 99;

/// Experience needed per level
pub const XP_PER_LEVEL: u32 = 250;

/// The six corporate competencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Networking power
    PersonalBrand,
    /// Workload capacity
    Bandwidth,
    /// Team performance
    Synergy,
    /// Learning agility
    GrowthMindset,
    /// Adapting to change
    Agility,
    /// Perception management
    Optics,
}

impl StatKind {
    /// All stats in canonical order
    pub const ALL: [StatKind; 6] = [
        StatKind::PersonalBrand,
        StatKind::Bandwidth,
        StatKind::Synergy,
        StatKind::GrowthMindset,
        StatKind::Agility,
        StatKind::Optics,
    ];

    fn index(self) -> usize {
        match self {
            StatKind::PersonalBrand => 0,
            StatKind::Bandwidth => 1,
            StatKind::Synergy => 2,
            StatKind::GrowthMindset => 3,
            StatKind::Agility => 4,
            StatKind::Optics => 5,
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatKind::PersonalBrand => "personal_brand",
            StatKind::Bandwidth => "bandwidth",
            StatKind::Synergy => "synergy",
            StatKind::GrowthMindset => "growth_mindset",
            StatKind::Agility => "agility",
            StatKind::Optics => "optics",
        };
        f.write_str(name)
    }
}

/// A full set of competency values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    values: [u8; 6],
}

impl StatBlock {
    /// Create a block with every stat at `value` (clamped to bounds)
    pub fn uniform(value: u8) -> Self {
        Self {
            values: [value.clamp(STAT_MIN, STAT_MAX); 6],
        }
    }

    /// Create a block from values in `StatKind::ALL` order
    pub fn from_array(values: [u8; 6]) -> Self {
        Self {
            values: values.map(|v| v.clamp(STAT_MIN, STAT_MAX)),
        }
    }

    /// Get a stat value
    pub fn get(&self, kind: StatKind) -> u8 {
        self.values[kind.index()]
    }

    /// Set a stat value, clamped to `[STAT_MIN, STAT_MAX]`
    pub fn set(&mut self, kind: StatKind, value: u8) {
        self.values[kind.index()] = value.clamp(STAT_MIN, STAT_MAX);
    }

    /// Sum of all stats
    pub fn total(&self) -> u32 {
        self.values.iter().map(|&v| u32::from(v)).sum()
    }
}

impl Default for StatBlock {
    fn default() -> Self {
        Self::uniform(10)
    }
}

/// Closed set of corporate classes
///
/// Each class carries a fixed row in the stat-modifier table. Adding a class
/// means adding a variant and a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorporateClass {
    HrManager,
    ConflictStrategist,
    EthicsOfficer,
    PrManager,
    SustainabilityOfficer,
    AssetManager,
    WellnessCoordinator,
    StakeholderManager,
    InnovationDirector,
    PerformanceCoach,
}

impl CorporateClass {
    /// All classes
    pub const ALL: [CorporateClass; 10] = [
        CorporateClass::HrManager,
        CorporateClass::ConflictStrategist,
        CorporateClass::EthicsOfficer,
        CorporateClass::PrManager,
        CorporateClass::SustainabilityOfficer,
        CorporateClass::AssetManager,
        CorporateClass::WellnessCoordinator,
        CorporateClass::StakeholderManager,
        CorporateClass::InnovationDirector,
        CorporateClass::PerformanceCoach,
    ];

    /// Stat modifiers in `StatKind::ALL` order
    ///
    /// brand, bandwidth, synergy, growth, agility, optics
    pub fn modifiers(self) -> [i8; 6] {
        match self {
            CorporateClass::HrManager => [4, 0, 3, 0, -1, 1],
            CorporateClass::ConflictStrategist => [0, 3, 4, -1, 2, -1],
            CorporateClass::EthicsOfficer => [1, 4, 2, 0, -2, 3],
            CorporateClass::PrManager => [5, -1, 1, 0, 1, 3],
            CorporateClass::SustainabilityOfficer => [0, 2, 1, 4, 0, 2],
            CorporateClass::AssetManager => [-1, 0, 0, 2, 5, 2],
            CorporateClass::WellnessCoordinator => [1, 3, 3, 2, 0, 0],
            CorporateClass::StakeholderManager => [3, 0, 0, 3, 0, 3],
            CorporateClass::InnovationDirector => [0, 0, -1, 5, 3, 1],
            CorporateClass::PerformanceCoach => [0, 3, 2, 1, 4, -1],
        }
    }

    /// Modifier for a single stat
    pub fn modifier(self, kind: StatKind) -> i8 {
        self.modifiers()[kind.index()]
    }
}

/// Seniority band; determines the training stat cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Seniority {
    Intern,
    Associate,
    Senior,
    Principal,
    Executive,
}

impl Seniority {
    /// Highest value training can push a stat to
    pub fn stat_cap(self) -> u8 {
        match self {
            Seniority::Intern => 60,
            Seniority::Associate => 70,
            Seniority::Senior => 80,
            Seniority::Principal => 90,
            Seniority::Executive => STAT_MAX,
        }
    }
}

/// Availability of an adventurer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Condition {
    /// Fit for any assignment
    #[default]
    Ready,
    /// Tired; recovers when the calendar reaches `until_day`
    Fatigued { until_day: u32 },
    /// Hurt; recovers when the calendar reaches `until_day`
    Injured { until_day: u32 },
}

/// Why an adventurer can't take an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ineligibility {
    /// Fatigued until the given day
    Fatigued { until_day: u32 },
    /// Injured until the given day
    Injured { until_day: u32 },
    /// Already assigned to another sub-action today
    AlreadyAssigned,
    /// Not in a condition that the action can improve
    NothingToRecover,
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligibility::Fatigued { until_day } => write!(f, "fatigued until day {}", until_day),
            Ineligibility::Injured { until_day } => write!(f, "injured until day {}", until_day),
            Ineligibility::AlreadyAssigned => f.write_str("already assigned today"),
            Ineligibility::NothingToRecover => f.write_str("already fully rested"),
        }
    }
}

/// A roster member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adventurer {
    /// Run-scoped identifier
    pub id: AdventurerId,
    /// Display name (supplied by the talent pool)
    pub name: String,
    /// Corporate class
    pub class: CorporateClass,
    /// Seniority band
    pub seniority: Seniority,
    /// Trained competency values (before class and equipment modifiers)
    pub stats: StatBlock,
    /// Training cap for every stat
    pub stat_cap: u8,
    /// Accumulated experience
    pub experience: u32,
    /// Daily salary
    pub salary: u64,
    /// Current availability
    pub condition: Condition,
    /// Equipped items, one per slot
    pub equipped: BTreeMap<EquipmentSlot, DefId>,
    /// Number of successful expeditions
    pub dungeons_completed: u32,
}

impl Adventurer {
    /// Create a fresh, ready adventurer
    pub fn new(
        id: AdventurerId,
        name: impl Into<String>,
        class: CorporateClass,
        seniority: Seniority,
        stats: StatBlock,
        salary: u64,
    ) -> Self {
        let stat_cap = seniority.stat_cap();
        let mut stats = stats;
        for kind in StatKind::ALL {
            stats.set(kind, stats.get(kind).min(stat_cap));
        }
        Self {
            id,
            name: name.into(),
            class,
            seniority,
            stats,
            stat_cap,
            experience: 0,
            salary,
            condition: Condition::Ready,
            equipped: BTreeMap::new(),
            dungeons_completed: 0,
        }
    }

    /// Level derived from experience
    pub fn level(&self) -> u32 {
        1 + self.experience / XP_PER_LEVEL
    }

    /// Check whether the adventurer can take an assignment today
    pub fn check_ready(&self) -> Result<(), Ineligibility> {
        match self.condition {
            Condition::Ready => Ok(()),
            Condition::Fatigued { until_day } => Err(Ineligibility::Fatigued { until_day }),
            Condition::Injured { until_day } => Err(Ineligibility::Injured { until_day }),
        }
    }

    /// Clear fatigue or injury whose recovery day has arrived
    pub fn recover(&mut self, day: u32) {
        match self.condition {
            Condition::Fatigued { until_day } | Condition::Injured { until_day }
                if until_day <= day =>
            {
                self.condition = Condition::Ready;
            }
            _ => {}
        }
    }

    /// Stat value with the class modifier applied, clamped to bounds
    pub fn class_adjusted(&self, kind: StatKind) -> i32 {
        let value = i32::from(self.stats.get(kind)) + i32::from(self.class.modifier(kind));
        value.clamp(i32::from(STAT_MIN), i32::from(STAT_MAX))
    }
}
