//! Export run ledgers and journals to various formats

use crate::{Auditor, Error, Result};
use chrono::{DateTime, Utc};
use guildedin_core::{DailyExpense, Difficulty, JournalEntry, RunId, RunStatus};
use guildedin_hub::GameRunSnapshot;
use serde::Serialize;
use std::io::Write;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// RON format (Rust Object Notation)
    Ron,
    /// JSON format (requires serde_json feature)
    Json,
    /// CSV format (ledger lines only)
    Csv,
    /// Human-readable text format
    Text,
}

/// Exporter for a run's settlement history and journal
pub struct Exporter<'a> {
    snapshot: &'a GameRunSnapshot,
    exported_at: Option<DateTime<Utc>>,
}

impl<'a> Exporter<'a> {
    /// Create a new exporter
    pub fn new(snapshot: &'a GameRunSnapshot) -> Self {
        Self {
            snapshot,
            exported_at: None,
        }
    }

    /// Stamp exports with a fixed time instead of the current one
    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.exported_at = Some(at);
        self
    }

    /// Export to a string in the specified format
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Ron => self.to_ron(),
            ExportFormat::Json => self.to_json(),
            ExportFormat::Csv => Ok(self.to_csv()),
            ExportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Export to a writer
    pub fn export_to<W: Write>(&self, writer: &mut W, format: ExportFormat) -> Result<()> {
        let content = self.export(format)?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Export to RON format
    pub fn to_ron(&self) -> Result<String> {
        let export = self.data();
        ron::ser::to_string_pretty(&export, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Export to JSON format
    #[cfg(feature = "serde_json")]
    pub fn to_json(&self) -> Result<String> {
        let export = self.data();
        serde_json::to_string_pretty(&export).map_err(|e| Error::Serialization(e.to_string()))
    }

    #[cfg(not(feature = "serde_json"))]
    pub fn to_json(&self) -> Result<String> {
        Err(Error::Export(
            "JSON export requires the 'serde_json' feature".to_string(),
        ))
    }

    /// Export to CSV format, one row per ledger line
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str("day,day_type,category,description,amount\n");

        for expense in self.snapshot.history() {
            for line in &expense.lines {
                output.push_str(&format!(
                    "{},{:?},{:?},{},{}\n",
                    expense.day,
                    expense.day_type,
                    line.category,
                    csv_field(&line.description),
                    line.amount
                ));
            }
        }

        output
    }

    /// Export to human-readable text format
    pub fn to_text(&self) -> String {
        let run = &self.snapshot.run;
        let mut output = String::new();

        output.push_str("=== Run Export ===\n\n");
        output.push_str(&format!("Run: {}\n", run.id));
        output.push_str(&format!("Exported at: {}\n", self.timestamp().to_rfc3339()));
        output.push_str(&format!("Seed: {}\n", run.seed));
        output.push_str(&format!("Difficulty: {}\n", run.difficulty));
        output.push_str(&format!("Status: {:?}\n", run.status));
        if let Some(reason) = &run.end_reason {
            output.push_str(&format!("Ended: {}\n", reason));
        }
        output.push_str(&format!("Day: {}\n", self.snapshot.day()));
        output.push_str(&format!("Treasury: {}\n", self.snapshot.treasury()));
        output.push_str(&format!("Roster: {}\n", run.roster.len()));

        output.push_str("\n=== Days ===\n");

        for expense in self.snapshot.history() {
            output.push_str(&format!(
                "\n--- Day {} ({:?}) {} -> {} ({:+}) ---\n",
                expense.day,
                expense.day_type,
                expense.treasury_before,
                expense.resulting_treasury,
                expense.net_delta
            ));
            for line in &expense.lines {
                output.push_str(&format!(
                    "  {:>8} {:?}: {}\n",
                    line.amount, line.category, line.description
                ));
            }
            for outcome in &expense.outcomes {
                output.push_str(&format!("  * {} {}\n", outcome.kind(), outcome.tier()));
            }
        }

        output.push('\n');
        output.push_str(&Auditor::new(self.snapshot.history()).generate_report().to_string());
        output
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.exported_at.unwrap_or_else(Utc::now)
    }

    fn data(&self) -> ExportData<'a> {
        let run = &self.snapshot.run;
        ExportData {
            exported_at: self.timestamp(),
            run_id: run.id,
            seed: run.seed,
            difficulty: run.difficulty,
            status: run.status,
            end_reason: run.end_reason.as_deref(),
            day: self.snapshot.day(),
            treasury: self.snapshot.treasury(),
            history: self.snapshot.history(),
            plans: self
                .snapshot
                .journal
                .as_ref()
                .map(|j| j.entries())
                .unwrap_or_default(),
        }
    }
}

/// Quote a CSV field when it holds a separator, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Serializable export data
#[derive(Debug, Serialize)]
struct ExportData<'a> {
    exported_at: DateTime<Utc>,
    run_id: RunId,
    seed: u64,
    difficulty: Difficulty,
    status: RunStatus,
    end_reason: Option<&'a str>,
    day: u32,
    treasury: u64,
    history: &'a [DailyExpense],
    plans: &'a [JournalEntry],
}
