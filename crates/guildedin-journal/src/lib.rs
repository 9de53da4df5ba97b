//! GuildedIn Journal - Replay, ledger auditing and export
//!
//! This crate builds on the journal that `guildedin-hub` records for each
//! run to provide:
//!
//! - **Replayer**: Rebuild a run from its seed and accepted plans, and check
//!   the result against a recorded history
//! - **Auditor**: Query and analyze a run's daily settlements
//! - **Exporter**: Export a run's ledger and plans to various formats
//!
//! # Example
//!
//! ```rust,ignore
//! use guildedin_hub::Controller;
//! use guildedin_journal::{replay, Auditor, ExportFormat, Exporter};
//!
//! let snapshot = controller.run_status(run_id)?;
//!
//! // Audit the run
//! let report = Auditor::new(snapshot.history()).generate_report();
//! println!("{}", report);
//!
//! // Check that a fresh controller reproduces it
//! let journal = snapshot.journal.as_ref().unwrap();
//! let replayed = replay(&other_controller, journal, snapshot.history())?;
//! assert!(replayed.is_consistent());
//!
//! // Export for external analysis
//! let csv = Exporter::new(&snapshot).export(ExportFormat::Csv)?;
//! ```

mod auditor;
mod error;
mod exporter;
mod replayer;

pub use auditor::{AuditQuery, AuditReport, Auditor, TierCounts};
pub use error::{Error, Result};
pub use exporter::{ExportFormat, Exporter};
pub use replayer::{replay, Divergence, ReplayReport, ReplayState, Replayer};

// Re-export core journal types for convenience
pub use guildedin_core::{Journal, JournalEntry};
