//! GuildedIn Core - daily loop and guild economy simulation engine
//!
//! This crate provides the pure engine behind a guild-management run:
//! - Identifiers and a run-scoped deterministic RNG
//! - The in-game calendar with date-derived events and market conditions
//! - Roster, guild and facility state
//! - The read-only content catalog and talent-pool seam
//! - The economy model (daily upkeep, per-action costs)
//! - The outcome resolver (expeditions, training, recruitment, ...)
//! - The daily plan executor, which buffers a day's deltas in a
//!   `DayTransaction` for the controller to commit
//!
//! Nothing here mutates a `GameRun` during a day; `guildedin-hub` owns runs
//! and applies settlements.
//!
//! ## Journal Feature
//!
//! Enable the `journal` feature to record accepted plans for replay:
//! ```toml
//! guildedin-core = { version = "0.1", features = ["journal"] }
//! ```

pub mod adventurer;
pub mod calendar;
pub mod catalog;
pub mod economy;
mod error;
pub mod executor;
mod guild;
mod identity;
mod ledger;
mod plan;
pub mod resolver;
mod rng;
mod run;
pub mod transaction;

#[cfg(feature = "journal")]
pub mod journal;

pub use adventurer::{
    Adventurer, Condition, CorporateClass, Ineligibility, Seniority, StatBlock, StatKind,
};
pub use calendar::{Calendar, DayModifiers, DayType, EventTag, MarketCondition, MarketSentiment};
pub use catalog::{
    ActionKind, Candidate, Catalog, Dungeon, EquipmentDef, EquipmentSlot, ExpenseCategory,
    ExpenseTemplate, FacilityDef, FacilityKind, StaticTalentPool, TalentPool, TemplateBasis,
};
pub use economy::{compute_action_cost, compute_daily_upkeep, ActionCost, EconomyContext};
pub use error::{Error, IntegrityViolation, Result, ValidationError};
pub use executor::{execute_day, preview_day, DayContext, PlanPreview, Settlement};
pub use guild::Guild;
pub use identity::{AdventurerId, DefId, RunId};
pub use ledger::{DailyExpense, LedgerLine};
pub use plan::{DailyPlan, PlanKind, SubAction, DAY_TIME_UNITS};
pub use resolver::{ActionOutcome, OutcomeTier};
pub use rng::GameRng;
pub use run::{adventurer_from, Difficulty, DifficultyProfile, GameRun, RunStatus};
pub use transaction::{DayTransaction, PendingDelta};

#[cfg(feature = "journal")]
pub use journal::{Journal, JournalEntry};
