//! GuildedIn Script - RON content loader
//!
//! Loads game content from RON files:
//! - Catalog: dungeons, equipment, facilities and expense templates
//! - Talent pool: recruitment candidates
//! - Difficulty table: starting conditions and goals per tier
//!
//! [`Loader::standard`] returns the content embedded in the crate.

mod error;
mod loader;
mod schema;

pub use error::{Error, Result};
pub use loader::{Content, Loader};
pub use schema::{CatalogFile, DifficultyFile, TalentFile, TierDef};
