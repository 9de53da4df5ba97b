//! Ledger auditing and analytics over a run's settlement history

use guildedin_core::{ActionKind, DailyExpense, DayType, ExpenseCategory, OutcomeTier};
use std::collections::BTreeMap;
use std::fmt;

/// Auditor for querying and analyzing settlement history
pub struct Auditor<'a> {
    history: &'a [DailyExpense],
}

impl<'a> Auditor<'a> {
    /// Create a new auditor over a history, oldest day first
    pub fn new(history: &'a [DailyExpense]) -> Self {
        Self { history }
    }

    /// Generate a comprehensive audit report
    pub fn generate_report(&self) -> AuditReport {
        let (peak_treasury, lowest_treasury) = self.treasury_extremes();
        AuditReport {
            days: self.history.len(),
            total_expenses: self.history.iter().map(|e| e.total_expenses).sum(),
            total_income: self.history.iter().map(|e| e.total_income).sum(),
            net: self.history.iter().map(|e| e.net_delta).sum(),
            category_totals: self.category_totals(),
            tiers: self.tier_counts(),
            action_counts: self.action_counts(),
            best_day: self.best_day().map(|e| (e.day, e.net_delta)),
            worst_day: self.worst_day().map(|e| (e.day, e.net_delta)),
            peak_treasury,
            lowest_treasury,
        }
    }

    /// Query days matching specific criteria
    pub fn query(&self, query: &AuditQuery) -> Vec<&'a DailyExpense> {
        self.history
            .iter()
            .filter(|expense| query.matches(expense))
            .collect()
    }

    /// Signed totals per ledger category across every day
    pub fn category_totals(&self) -> BTreeMap<ExpenseCategory, i64> {
        let mut totals = BTreeMap::new();
        for line in self.history.iter().flat_map(|e| &e.lines) {
            *totals.entry(line.category).or_insert(0) += line.amount;
        }
        totals
    }

    /// How often each outcome tier occurred
    pub fn tier_counts(&self) -> TierCounts {
        let mut counts = TierCounts::default();
        for outcome in self.history.iter().flat_map(|e| &e.outcomes) {
            match outcome.tier() {
                OutcomeTier::Success => counts.success += 1,
                OutcomeTier::PartialSuccess => counts.partial += 1,
                OutcomeTier::Failure => counts.failure += 1,
            }
        }
        counts
    }

    /// How often each kind of sub-action was resolved
    pub fn action_counts(&self) -> BTreeMap<ActionKind, u64> {
        let mut counts = BTreeMap::new();
        for outcome in self.history.iter().flat_map(|e| &e.outcomes) {
            *counts.entry(outcome.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// The day with the highest net change (earliest on ties)
    pub fn best_day(&self) -> Option<&'a DailyExpense> {
        self.history
            .iter()
            .rev()
            .max_by_key(|e| e.net_delta)
    }

    /// The day with the lowest net change (earliest on ties)
    pub fn worst_day(&self) -> Option<&'a DailyExpense> {
        self.history.iter().min_by_key(|e| e.net_delta)
    }

    /// Treasury at the end of each day
    pub fn treasury_curve(&self) -> Vec<(u32, u64)> {
        self.history
            .iter()
            .map(|e| (e.day, e.resulting_treasury))
            .collect()
    }

    /// Highest and lowest treasury seen, including the opening balance
    pub fn treasury_extremes(&self) -> (Option<u64>, Option<u64>) {
        let opening = self.history.first().map(|e| e.treasury_before);
        let balances = opening
            .into_iter()
            .chain(self.history.iter().map(|e| e.resulting_treasury));
        let mut peak = None;
        let mut lowest = None;
        for balance in balances {
            peak = Some(peak.map_or(balance, |p: u64| p.max(balance)));
            lowest = Some(lowest.map_or(balance, |l: u64| l.min(balance)));
        }
        (peak, lowest)
    }
}

/// Criteria for [`Auditor::query`]; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Inclusive day range
    pub days: Option<(u32, u32)>,
    pub day_type: Option<DayType>,
    /// Only days with at least one line in this category
    pub category: Option<ExpenseCategory>,
    /// Only days that resolved this kind of sub-action
    pub action: Option<ActionKind>,
    pub min_net: Option<i64>,
    pub max_net: Option<i64>,
}

impl AuditQuery {
    /// Days in an inclusive range
    pub fn days(start: u32, end: u32) -> Self {
        Self {
            days: Some((start, end)),
            ..Default::default()
        }
    }

    fn matches(&self, expense: &DailyExpense) -> bool {
        if let Some((start, end)) = self.days {
            if expense.day < start || expense.day > end {
                return false;
            }
        }
        if let Some(day_type) = self.day_type {
            if expense.day_type != day_type {
                return false;
            }
        }
        if let Some(category) = self.category {
            if !expense.lines.iter().any(|l| l.category == category) {
                return false;
            }
        }
        if let Some(action) = self.action {
            if !expense.outcomes.iter().any(|o| o.kind() == action) {
                return false;
            }
        }
        if self.min_net.is_some_and(|min| expense.net_delta < min) {
            return false;
        }
        if self.max_net.is_some_and(|max| expense.net_delta > max) {
            return false;
        }
        true
    }
}

/// Outcome tier tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub success: u64,
    pub partial: u64,
    pub failure: u64,
}

impl TierCounts {
    /// Total outcomes counted
    pub fn total(&self) -> u64 {
        self.success + self.partial + self.failure
    }
}

/// Audit report summarizing a run's finances
#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    pub days: usize,
    pub total_expenses: u64,
    pub total_income: u64,
    pub net: i64,
    pub category_totals: BTreeMap<ExpenseCategory, i64>,
    pub tiers: TierCounts,
    pub action_counts: BTreeMap<ActionKind, u64>,
    /// `(day, net)` of the best day
    pub best_day: Option<(u32, i64)>,
    /// `(day, net)` of the worst day
    pub worst_day: Option<(u32, i64)>,
    pub peak_treasury: Option<u64>,
    pub lowest_treasury: Option<u64>,
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Ledger Audit ===")?;
        writeln!(f, "Days settled: {}", self.days)?;
        writeln!(f, "Total expenses: {}", self.total_expenses)?;
        writeln!(f, "Total income: {}", self.total_income)?;
        writeln!(f, "Net: {}", self.net)?;
        if let (Some(peak), Some(lowest)) = (self.peak_treasury, self.lowest_treasury) {
            writeln!(f, "Treasury range: {} - {}", lowest, peak)?;
        }
        if let Some((day, net)) = self.best_day {
            writeln!(f, "Best day: {} ({:+})", day, net)?;
        }
        if let Some((day, net)) = self.worst_day {
            writeln!(f, "Worst day: {} ({:+})", day, net)?;
        }

        writeln!(f, "\nBy category:")?;
        for (category, total) in &self.category_totals {
            writeln!(f, "  {:?}: {}", category, total)?;
        }

        writeln!(f, "\nOutcomes:")?;
        writeln!(
            f,
            "  success {} / partial {} / failure {}",
            self.tiers.success, self.tiers.partial, self.tiers.failure
        )?;
        for (action, count) in &self.action_counts {
            writeln!(f, "  {}: {}", action, count)?;
        }

        Ok(())
    }
}
