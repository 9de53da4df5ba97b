//! GuildedIn Hub - game run controller
//!
//! This crate owns game runs and is the only place they are mutated. The
//! engine in `guildedin-core` computes a day's outcome against a borrowed
//! run; the hub commits it.
//!
//! ## Architecture
//!
//! ```text
//! Controller (owns the run registry)
//!  │
//!  ├── Arc<Catalog> + Arc<dyn TalentPool>   read-only, shared by every run
//!  │
//!  └── RunId -> Mutex<RunSlot>
//!       └── GameRun + Journal
//! ```
//!
//! ## Key Components
//!
//! - [`Controller`]: Run registry, day submission and terminal evaluation
//! - [`commit()`]: Applies a settled day's `DayTransaction` to its run
//! - [`GameRunSnapshot`]: Detached copy of a run with a bincode round trip
//! - [`ControllerConfig`] / [`DifficultyTable`]: Runtime settings and balance
//!
//! ## Design Principles
//!
//! 1. **One writer per run** - each run is behind its own lock
//! 2. **guildedin-core is standalone** - it does NOT know about guildedin-hub
//! 3. **Commit is all or nothing** - every delta is checked before any is applied

pub mod commit;
mod config;
mod controller;
mod error;
mod snapshot;

pub use commit::{apply, check, commit, CommitResult};
pub use config::{default_profile, max_workers, ControllerConfig, DifficultyTable};
pub use controller::{evaluate_terminal, Controller};
pub use error::{Error, Result};
pub use snapshot::GameRunSnapshot;
