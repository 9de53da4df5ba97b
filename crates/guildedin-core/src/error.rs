//! Error types for guildedin-core
//!
//! Three families:
//! - [`ValidationError`]: a plan was rejected before anything changed
//! - [`Error::SettlementRollback`]: a day resolved but would overdraw the treasury
//! - [`IntegrityViolation`]: state or content is inconsistent; never retried

use crate::adventurer::{Ineligibility, StatKind};
use crate::catalog::{ActionKind, FacilityKind};
use crate::run::RunStatus;
use crate::{AdventurerId, DefId, RunId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A plan rejected before any mutation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("malformed plan: {0}")]
    MalformedPlan(String),

    #[error("time budget exceeded: plan needs {required} of {available} units")]
    OverTimeBudget { required: u32, available: u32 },

    #[error("insufficient treasury: plan needs {required}, guild has {available}")]
    InsufficientTreasury { required: u64, available: u64 },

    #[error("adventurer not found: {0}")]
    UnknownAdventurer(AdventurerId),

    #[error("{id} is not eligible: {reason}")]
    IneligibleAdventurer {
        id: AdventurerId,
        reason: Ineligibility,
    },

    #[error("expedition has no eligible team members")]
    EmptyTeam,

    #[error("dungeon not found: {0}")]
    UnknownDungeon(DefId),

    #[error("team of {size} outside allowed size {min}..={max} for {dungeon}")]
    TeamSize {
        dungeon: DefId,
        size: usize,
        min: usize,
        max: usize,
    },

    #[error("team does not reach {stat} {minimum} required by {dungeon}")]
    StatThreshold {
        dungeon: DefId,
        stat: StatKind,
        minimum: u8,
    },

    #[error("{stat} of {id} is already at its cap")]
    StatAtCap { id: AdventurerId, stat: StatKind },

    #[error("facility not available: {0}")]
    UnknownFacility(FacilityKind),

    #[error("facility {0} is already at max level")]
    FacilityMaxed(FacilityKind),

    #[error("item not in guild inventory: {0}")]
    ItemNotInInventory(DefId),

    #[error("talent pool has no candidates")]
    NoCandidates,
}

/// Inconsistent state or content; a programming or data error
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrityViolation {
    #[error("no expense template for action {0}")]
    MissingTemplate(ActionKind),

    #[error("equipment not in catalog: {0}")]
    UnknownEquipment(DefId),

    #[error("dungeon not in catalog: {0}")]
    UnknownDungeon(DefId),

    #[error("adventurer {0} vanished during execution")]
    MissingAdventurer(AdventurerId),

    #[error("{run} has concluded with status {status:?}")]
    RunConcluded { run: RunId, status: RunStatus },

    #[error("corrupt state: {0}")]
    CorruptState(String),
}

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("plan rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("day rolled back: settlement would leave treasury {shortfall} short")]
    SettlementRollback { shortfall: u64 },

    #[error("integrity violation: {0}")]
    Integrity(#[from] IntegrityViolation),
}

impl Error {
    /// True for errors the player can recover from by submitting another plan
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Integrity(_))
    }

    /// The validation error, if this is one
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
