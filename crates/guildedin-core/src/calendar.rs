//! In-game calendar with date-derived events and market conditions
//!
//! The day counter only moves forward, one day per settled plan. Every flag
//! for a day is a pure function of `(run seed, day number)`, drawn from a
//! dedicated RNG stream, so the calendar never consumes the run's main
//! random stream and never looks at wall-clock time.

use crate::rng::GameRng;
use serde::{Deserialize, Serialize};

/// Classification of a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DayType {
    #[default]
    Weekday,
    Weekend,
    Holiday,
    /// Something went wrong in the wider market
    Crisis,
    /// Something went right in the wider market
    Opportunity,
}

/// Event tags active on a day; read by the resolver as modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTag {
    MarketCrash,
    IndustryConference,
    HolidaySeason,
    PerformanceReviewSeason,
    TeamBuildingMonth,
}

impl EventTag {
    /// Modifiers contributed by this tag
    pub fn effects(self) -> DayModifiers {
        let neutral = DayModifiers::default();
        match self {
            EventTag::MarketCrash => DayModifiers {
                reward_pct: 80,
                recruitment_cost_pct: 90,
                ..neutral
            },
            EventTag::IndustryConference => DayModifiers {
                recruitment_cost_pct: 80,
                recruit_chance_bonus: 10,
                ..neutral
            },
            EventTag::HolidaySeason => DayModifiers {
                reward_pct: 120,
                expedition_power_pct: 95,
                ..neutral
            },
            EventTag::PerformanceReviewSeason => DayModifiers {
                expedition_power_pct: 105,
                recruit_chance_bonus: -5,
                ..neutral
            },
            EventTag::TeamBuildingMonth => DayModifiers {
                expedition_power_pct: 110,
                ..neutral
            },
        }
    }
}

/// Overall mood of the market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MarketSentiment {
    Bull,
    Bear,
    Volatile,
    #[default]
    Stable,
}

/// Market condition for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCondition {
    pub sentiment: MarketSentiment,
    /// Percentage applied to market-sensitive costs and to rewards
    pub economic_modifier_pct: u32,
}

impl Default for MarketCondition {
    fn default() -> Self {
        Self {
            sentiment: MarketSentiment::Stable,
            economic_modifier_pct: 100,
        }
    }
}

/// Folded modifiers for one day. Percentages are 100 when neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayModifiers {
    /// Applied to market-sensitive template costs
    pub cost_pct: u32,
    /// Applied to market-sensitive recruitment costs on top of `cost_pct`
    pub recruitment_cost_pct: u32,
    /// Applied to expedition gold
    pub reward_pct: u32,
    /// Added to recruitment success chance, in percentage points
    pub recruit_chance_bonus: i32,
    /// Applied to expedition team power
    pub expedition_power_pct: u32,
}

impl Default for DayModifiers {
    fn default() -> Self {
        Self {
            cost_pct: 100,
            recruitment_cost_pct: 100,
            reward_pct: 100,
            recruit_chance_bonus: 0,
            expedition_power_pct: 100,
        }
    }
}

impl DayModifiers {
    /// Compose two sets of modifiers
    pub fn combine(self, other: DayModifiers) -> DayModifiers {
        DayModifiers {
            cost_pct: self.cost_pct * other.cost_pct / 100,
            recruitment_cost_pct: self.recruitment_cost_pct * other.recruitment_cost_pct / 100,
            reward_pct: self.reward_pct * other.reward_pct / 100,
            recruit_chance_bonus: self.recruit_chance_bonus + other.recruit_chance_bonus,
            expedition_power_pct: self.expedition_power_pct * other.expedition_power_pct / 100,
        }
    }
}

/// Everything derived from a day number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DayFlags {
    pub day_type: DayType,
    pub events: Vec<EventTag>,
    pub market: MarketCondition,
}

impl DayFlags {
    /// Compute the flags for a day
    ///
    /// Day 0 is the start of the fiscal year: a quiet, stable weekday.
    pub fn for_day(seed: u64, day: u32) -> Self {
        if day == 0 {
            return Self::default();
        }

        let mut rng = GameRng::for_stream(seed, u64::from(day));
        let mut events = Vec::new();
        let mut day_type = if day % 7 >= 5 {
            DayType::Weekend
        } else {
            DayType::Weekday
        };

        if day % 30 == 29 {
            day_type = DayType::Holiday;
            events.push(EventTag::HolidaySeason);
        }

        let roll = rng.range_u32(1, 100);
        if roll <= 8 {
            day_type = DayType::Crisis;
            events.push(EventTag::MarketCrash);
        } else if roll >= 93 {
            day_type = DayType::Opportunity;
            events.push(EventTag::IndustryConference);
        }

        if day % 90 >= 80 {
            events.push(EventTag::PerformanceReviewSeason);
        }
        if (day / 30) % 12 == 6 {
            events.push(EventTag::TeamBuildingMonth);
        }

        let sentiment = match rng.weighted_index(&[50, 20, 20, 10]) {
            Some(1) => MarketSentiment::Bull,
            Some(2) => MarketSentiment::Bear,
            Some(3) => MarketSentiment::Volatile,
            _ => MarketSentiment::Stable,
        };
        let economic_modifier_pct = match sentiment {
            MarketSentiment::Stable => 100,
            MarketSentiment::Bull => 100 + rng.range_u32(5, 15),
            MarketSentiment::Bear => 100 - rng.range_u32(5, 15),
            MarketSentiment::Volatile => rng.range_u32(80, 120),
        };

        Self {
            day_type,
            events,
            market: MarketCondition {
                sentiment,
                economic_modifier_pct,
            },
        }
    }
}

/// Global day tracker for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    day: u32,
    seed: u64,
    flags: DayFlags,
}

impl Calendar {
    /// A calendar at day 0 for a run seed
    pub fn new(seed: u64) -> Self {
        Self {
            day: 0,
            seed,
            flags: DayFlags::for_day(seed, 0),
        }
    }

    /// Current day number
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Seed the flags are derived from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Today's classification
    pub fn day_type(&self) -> DayType {
        self.flags.day_type
    }

    /// Today's active events
    pub fn events(&self) -> &[EventTag] {
        &self.flags.events
    }

    /// Today's market condition
    pub fn market(&self) -> MarketCondition {
        self.flags.market
    }

    /// Move to the next day and recompute flags
    pub fn advance(&mut self) {
        self.day += 1;
        self.flags = DayFlags::for_day(self.seed, self.day);
    }

    /// Fold today's events and market into one set of modifiers
    pub fn modifiers(&self) -> DayModifiers {
        let market_pct = self.flags.market.economic_modifier_pct;
        let market = DayModifiers {
            cost_pct: market_pct,
            reward_pct: market_pct,
            ..DayModifiers::default()
        };
        self.flags
            .events
            .iter()
            .fold(market, |acc, tag| acc.combine(tag.effects()))
    }
}
