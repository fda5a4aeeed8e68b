use serde::{Deserialize, Serialize};

use super::{Amount, CategoryId, CategoryLookup, DateRange, MonetaryRecord, aggregate_by_category};

/// Default percentage of a budget at which a warning is raised.
pub const DEFAULT_ALERT_PERCENT: u8 = 80;

/// A monthly spending limit for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub category_id: CategoryId,
    pub amount: Amount,
}

impl Budget {
    pub fn new(category_id: impl Into<CategoryId>, amount: Amount) -> Self {
        Self {
            category_id: category_id.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLevel {
    OnTrack,
    Warning,
    Exceeded,
}

impl BudgetLevel {
    pub fn from_percent(percent: f64, alert_percent: u8) -> Self {
        if percent > 100.0 {
            BudgetLevel::Exceeded
        } else if percent >= f64::from(alert_percent) {
            BudgetLevel::Warning
        } else {
            BudgetLevel::OnTrack
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetLevel::OnTrack => "on track",
            BudgetLevel::Warning => "warning",
            BudgetLevel::Exceeded => "exceeded",
        }
    }
}

impl std::fmt::Display for BudgetLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spending against one budget over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub category_id: CategoryId,
    pub category_name: String,
    pub budgeted: Amount,
    pub spent: Amount,
    /// Signed cents; negative once overspent.
    pub remaining: i64,
    pub percent: f64,
    pub level: BudgetLevel,
}

impl BudgetProgress {
    pub fn needs_attention(&self) -> bool {
        self.level != BudgetLevel::OnTrack
    }
}

/// Compare each budget with the expenses recorded in `period`, sorted by
/// category name.
pub fn budget_progress<L>(
    budgets: &[Budget],
    records: &[MonetaryRecord],
    period: DateRange,
    lookup: &L,
    alert_percent: u8,
) -> Vec<BudgetProgress>
where
    L: CategoryLookup + ?Sized,
{
    let aggregates = aggregate_by_category(records, period);

    let mut progress: Vec<BudgetProgress> = budgets
        .iter()
        .map(|budget| {
            let spent = aggregates
                .get(&budget.category_id)
                .map(|a| a.expense_total)
                .unwrap_or(Amount::ZERO);
            let percent = spent.percent_of(budget.amount);
            BudgetProgress {
                category_id: budget.category_id.clone(),
                category_name: lookup.display_name(&budget.category_id).to_string(),
                budgeted: budget.amount,
                spent,
                remaining: budget.amount.signed_diff(spent),
                percent,
                level: BudgetLevel::from_percent(percent, alert_percent),
            }
        })
        .collect();

    progress.sort_by(|a, b| a.category_name.cmp(&b.category_name));
    progress
}

/// Sum of budgeted and spent amounts across all entries.
pub fn budget_totals(progress: &[BudgetProgress]) -> (Amount, Amount) {
    (
        progress.iter().map(|p| p.budgeted).sum(),
        progress.iter().map(|p| p.spent).sum(),
    )
}
