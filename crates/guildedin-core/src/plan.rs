//! Daily plans: what the player commits to for one in-game day

use crate::adventurer::StatKind;
use crate::catalog::{ActionKind, FacilityKind};
use crate::{AdventurerId, DefId};
use serde::{Deserialize, Serialize};

/// Time units in one day
pub const DAY_TIME_UNITS: u32 = 100;

/// Shape of a day's plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanKind {
    /// The whole day is spent on one expedition
    FullDayExpedition,
    /// Several smaller actions sharing the day's time budget
    PartialDayActions,
}

/// One action within a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubAction {
    /// Send a team into a dungeon
    Expedition {
        dungeon: DefId,
        team: Vec<AdventurerId>,
    },
    /// Train one stat of one adventurer
    Train {
        adventurer: AdventurerId,
        stat: StatKind,
    },
    /// Try to hire from the talent pool
    Recruit,
    /// Raise a facility by one level
    UpgradeFacility { facility: FacilityKind },
    /// Speed up an adventurer's recovery
    Rest { adventurer: AdventurerId },
    /// Move an item from the guild inventory onto an adventurer
    Equip {
        adventurer: AdventurerId,
        item: DefId,
    },
}

impl SubAction {
    /// The expense-template key for this action
    pub fn kind(&self) -> ActionKind {
        match self {
            SubAction::Expedition { .. } => ActionKind::Expedition,
            SubAction::Train { .. } => ActionKind::Training,
            SubAction::Recruit => ActionKind::Recruitment,
            SubAction::UpgradeFacility { .. } => ActionKind::FacilityUpgrade,
            SubAction::Rest { .. } => ActionKind::Rest,
            SubAction::Equip { .. } => ActionKind::Equip,
        }
    }

    /// Adventurers this action occupies for the day
    pub fn participants(&self) -> Vec<AdventurerId> {
        match self {
            SubAction::Expedition { team, .. } => team.clone(),
            SubAction::Train { adventurer, .. }
            | SubAction::Rest { adventurer }
            | SubAction::Equip { adventurer, .. } => vec![*adventurer],
            SubAction::Recruit | SubAction::UpgradeFacility { .. } => Vec::new(),
        }
    }
}

/// A day's chosen actions, executed in the order given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPlan {
    pub kind: PlanKind,
    pub actions: Vec<SubAction>,
}

impl DailyPlan {
    /// A full-day expedition plan
    pub fn expedition(dungeon: impl Into<DefId>, team: Vec<AdventurerId>) -> Self {
        Self {
            kind: PlanKind::FullDayExpedition,
            actions: vec![SubAction::Expedition {
                dungeon: dungeon.into(),
                team,
            }],
        }
    }

    /// A partial-day plan with the given actions
    pub fn partial(actions: Vec<SubAction>) -> Self {
        Self {
            kind: PlanKind::PartialDayActions,
            actions,
        }
    }

    /// A day with nothing planned; only upkeep is paid
    pub fn idle() -> Self {
        Self::partial(Vec::new())
    }

    /// Check the plan's shape
    ///
    /// A full-day plan holds exactly one expedition; a partial-day plan holds
    /// no expeditions.
    pub fn shape_error(&self) -> Option<String> {
        let expeditions = self
            .actions
            .iter()
            .filter(|a| a.kind() == ActionKind::Expedition)
            .count();
        match self.kind {
            PlanKind::FullDayExpedition if self.actions.len() != 1 || expeditions != 1 => Some(
                format!(
                    "full-day plan must hold exactly one expedition, got {} actions",
                    self.actions.len()
                ),
            ),
            PlanKind::PartialDayActions if expeditions > 0 => {
                Some("expeditions take the full day".to_string())
            }
            _ => None,
        }
    }
}
