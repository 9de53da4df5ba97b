//! One play-through: calendar, guild, roster, RNG and settlement history

use crate::adventurer::Adventurer;
use crate::calendar::Calendar;
use crate::catalog::{Candidate, TalentPool};
use crate::guild::Guild;
use crate::ledger::DailyExpense;
use crate::rng::GameRng;
use crate::{AdventurerId, RunId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty tier chosen at run start
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Intern,
    Associate,
    Senior,
    Executive,
}

impl Difficulty {
    /// All tiers, easiest first
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Intern,
        Difficulty::Associate,
        Difficulty::Senior,
        Difficulty::Executive,
    ];
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Intern => "intern",
            Difficulty::Associate => "associate",
            Difficulty::Senior => "senior",
            Difficulty::Executive => "executive",
        };
        f.write_str(name)
    }
}

/// Starting conditions and goals for a difficulty tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub starting_treasury: u64,
    pub starting_roster_size: usize,
    /// The run is lost once the calendar passes this day
    pub day_limit: u32,
    pub target_treasury: u64,
    pub target_reputation: u32,
    /// Applied to every template cost, in percent
    pub cost_scaling_pct: u32,
    /// Applied to expedition gold, in percent
    pub reward_scaling_pct: u32,
}

/// Lifecycle of a run
///
/// Only `Active -> Won` and `Active -> Lost` are possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Active,
    Won,
    Lost,
}

impl RunStatus {
    /// True once the run can accept no more plans
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Active)
    }
}

/// A complete play-through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRun {
    pub id: RunId,
    pub seed: u64,
    pub difficulty: Difficulty,
    pub profile: DifficultyProfile,
    pub status: RunStatus,
    /// Why the run ended, once it has
    pub end_reason: Option<String>,
    pub calendar: Calendar,
    pub guild: Guild,
    pub roster: IndexMap<AdventurerId, Adventurer>,
    /// The run's single random stream
    pub rng: GameRng,
    /// Append-only settlement history, one entry per completed day
    pub history: Vec<DailyExpense>,
    pub next_adventurer_id: u64,
    pub peak_treasury: u64,
    pub lowest_treasury: u64,
}

impl GameRun {
    /// A run at day 0 with the profile's treasury and an empty roster
    pub fn new(id: RunId, seed: u64, difficulty: Difficulty, profile: DifficultyProfile) -> Self {
        let treasury = profile.starting_treasury;
        Self {
            id,
            seed,
            difficulty,
            profile,
            status: RunStatus::Active,
            end_reason: None,
            calendar: Calendar::new(seed),
            guild: Guild::new(treasury),
            roster: IndexMap::new(),
            rng: GameRng::new(seed),
            history: Vec::new(),
            next_adventurer_id: 1,
            peak_treasury: treasury,
            lowest_treasury: treasury,
        }
    }

    /// A fresh run with its starting roster drawn from the talent pool
    ///
    /// Candidates are drawn by weight from the run's own RNG, so the
    /// starting roster is reproduced from the seed.
    pub fn start(
        id: RunId,
        seed: u64,
        difficulty: Difficulty,
        profile: DifficultyProfile,
        talent: &dyn TalentPool,
    ) -> Self {
        let mut run = Self::new(id, seed, difficulty, profile);
        let candidates = talent.candidates();
        let weights: Vec<u32> = candidates.iter().map(|c| c.weight).collect();
        for _ in 0..run.profile.starting_roster_size {
            let Some(index) = run.rng.weighted_index(&weights) else {
                break;
            };
            if let Some(candidate) = candidates.get(index) {
                run.hire(candidate);
            }
        }
        run
    }

    /// Add a candidate to the roster under the next free id
    pub fn hire(&mut self, candidate: &Candidate) -> AdventurerId {
        let id = AdventurerId(self.next_adventurer_id);
        self.next_adventurer_id += 1;
        self.roster.insert(id, adventurer_from(id, candidate));
        id
    }

    /// Current calendar day
    pub fn day(&self) -> u32 {
        self.calendar.day()
    }

    /// Current treasury
    pub fn treasury(&self) -> u64 {
        self.guild.treasury
    }

    /// Look up a roster member
    pub fn adventurer(&self, id: AdventurerId) -> Option<&Adventurer> {
        self.roster.get(&id)
    }

    /// Roster members fit for an assignment today
    pub fn ready_adventurers(&self) -> impl Iterator<Item = &Adventurer> {
        self.roster.values().filter(|a| a.check_ready().is_ok())
    }

    /// The most recent settlement
    pub fn last_expense(&self) -> Option<&DailyExpense> {
        self.history.last()
    }

    /// Move to a terminal status
    ///
    /// Returns false and changes nothing if the run has already ended or
    /// `status` is not terminal.
    pub fn conclude(&mut self, status: RunStatus, reason: impl Into<String>) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.end_reason = Some(reason.into());
        true
    }
}

/// Build a roster member from a talent-pool candidate
pub fn adventurer_from(id: AdventurerId, candidate: &Candidate) -> Adventurer {
    Adventurer::new(
        id,
        candidate.name.clone(),
        candidate.class,
        candidate.seniority,
        candidate.stats,
        candidate.salary,
    )
}
