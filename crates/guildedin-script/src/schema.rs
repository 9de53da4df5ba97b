//! File shapes for content RON
//!
//! Each content file is a single struct with one list per definition kind.
//! The lists are keyed and checked by the loader.

use guildedin_core::{
    Candidate, Difficulty, DifficultyProfile, Dungeon, EquipmentDef, ExpenseTemplate, FacilityDef,
};
use serde::Deserialize;

/// `catalog.ron`
///
/// Every list is optional so content can be split across several files.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub dungeons: Vec<Dungeon>,
    #[serde(default)]
    pub equipment: Vec<EquipmentDef>,
    #[serde(default)]
    pub facilities: Vec<FacilityDef>,
    #[serde(default)]
    pub templates: Vec<ExpenseTemplate>,
}

/// `talent.ron`
#[derive(Debug, Default, Deserialize)]
pub struct TalentFile {
    pub candidates: Vec<Candidate>,
}

/// One tier of `difficulty.ron`
#[derive(Debug, Deserialize)]
pub struct TierDef {
    pub difficulty: Difficulty,
    pub profile: DifficultyProfile,
}

/// `difficulty.ron`
#[derive(Debug, Default, Deserialize)]
pub struct DifficultyFile {
    pub tiers: Vec<TierDef>,
}
