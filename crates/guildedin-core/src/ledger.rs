//! Settlement records: itemized ledger lines and the daily expense record

use crate::calendar::DayType;
use crate::catalog::ExpenseCategory;
use crate::resolver::ActionOutcome;
use crate::RunId;
use serde::{Deserialize, Serialize};

/// One itemized cost or income line
///
/// `amount` is positive for income and negative for expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: i64,
}

impl LedgerLine {
    /// A cost line
    pub fn expense(category: ExpenseCategory, description: impl Into<String>, amount: u64) -> Self {
        Self {
            category,
            description: description.into(),
            amount: -to_signed(amount),
        }
    }

    /// An income line
    pub fn income(category: ExpenseCategory, description: impl Into<String>, amount: u64) -> Self {
        Self {
            category,
            description: description.into(),
            amount: to_signed(amount),
        }
    }

    /// True when this line brings money in
    pub fn is_income(&self) -> bool {
        self.amount > 0
    }
}

fn to_signed(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

/// Sum of expense lines as a positive number
pub fn total_expenses(lines: &[LedgerLine]) -> u64 {
    lines
        .iter()
        .filter(|l| l.amount < 0)
        .map(|l| l.amount.unsigned_abs())
        .sum()
}

/// Sum of income lines
pub fn total_income(lines: &[LedgerLine]) -> u64 {
    lines
        .iter()
        .filter(|l| l.amount > 0)
        .map(|l| l.amount.unsigned_abs())
        .sum()
}

/// Settlement record for a completed day
///
/// Immutable once written; one per `(run_id, day)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyExpense {
    pub run_id: RunId,
    /// The day that was settled (the calendar shows `day + 1` afterwards)
    pub day: u32,
    pub day_type: DayType,
    pub lines: Vec<LedgerLine>,
    pub total_expenses: u64,
    pub total_income: u64,
    /// `total_income - total_expenses`
    pub net_delta: i64,
    pub treasury_before: u64,
    pub resulting_treasury: u64,
    /// What each sub-action resolved to, in execution order
    pub outcomes: Vec<ActionOutcome>,
}

impl DailyExpense {
    /// Sum of lines in one category (signed)
    pub fn category_total(&self, category: ExpenseCategory) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.category == category)
            .map(|l| l.amount)
            .sum()
    }
}
