use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, CategoryId, CategoryLookup, DateRange, MonetaryRecord, aggregate_by_category,
    sum_period,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub period: DateRange,
    /// Declared monthly income when set, otherwise recorded income.
    pub income: Amount,
    pub expenses: Amount,
    /// Signed cents.
    pub savings: i64,
    pub income_is_declared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category_id: CategoryId,
    pub category_name: String,
    pub total: Amount,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthTotals {
    pub year: i32,
    pub month: u32,
    pub income: Amount,
    pub expense: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthReport {
    pub summary: MonthlySummary,
    pub expense_breakdown: Vec<CategoryShare>,
    pub top_expenses: Vec<MonetaryRecord>,
}

pub fn monthly_summary(
    records: &[MonetaryRecord],
    period: DateRange,
    declared_income: Amount,
) -> MonthlySummary {
    let totals = sum_period(records.iter().filter(|r| period.contains(&r.timestamp)));
    let income_is_declared = !declared_income.is_zero();
    let income = if income_is_declared {
        declared_income
    } else {
        totals.income_total
    };

    MonthlySummary {
        period,
        income,
        expenses: totals.expense_total,
        savings: income.signed_diff(totals.expense_total),
        income_is_declared,
    }
}

/// Expense totals per category in `period`, largest first.
pub fn expense_breakdown<L>(
    records: &[MonetaryRecord],
    period: DateRange,
    lookup: &L,
) -> Vec<CategoryShare>
where
    L: CategoryLookup + ?Sized,
{
    let aggregates = aggregate_by_category(records, period);
    let total: Amount = aggregates.values().map(|a| a.expense_total).sum();

    let mut shares: Vec<CategoryShare> = aggregates
        .into_values()
        .filter(|a| !a.expense_total.is_zero())
        .map(|a| CategoryShare {
            category_name: lookup.display_name(&a.category_id).to_string(),
            percentage: a.expense_total.percent_of(total),
            total: a.expense_total,
            category_id: a.category_id,
        })
        .collect();

    shares.sort_by(|a, b| b.total.cmp(&a.total).then(a.category_name.cmp(&b.category_name)));
    shares
}

/// The `limit` largest expenses in `period`.
pub fn top_expenses(
    records: &[MonetaryRecord],
    period: DateRange,
    limit: usize,
) -> Vec<MonetaryRecord> {
    let mut expenses: Vec<MonetaryRecord> = records
        .iter()
        .filter(|r| r.is_expense() && period.contains(&r.timestamp))
        .cloned()
        .collect();
    expenses.sort_by(|a, b| b.amount.cmp(&a.amount));
    expenses.truncate(limit);
    expenses
}

/// Income and expense per calendar month for the `months` months ending with
/// the one containing `today`, oldest first.
pub fn monthly_history(
    records: &[MonetaryRecord],
    today: NaiveDate,
    months: u32,
) -> Vec<MonthTotals> {
    let mut month_starts = Vec::new();
    let mut cursor = DateRange::month_of(today).start;
    for _ in 0..months {
        month_starts.push(cursor);
        match cursor.pred_opt() {
            Some(last_of_previous) => cursor = DateRange::month_of(last_of_previous).start,
            None => break,
        }
    }
    month_starts.reverse();

    month_starts
        .into_iter()
        .map(|start| {
            let period = DateRange::month_of(start);
            let totals = sum_period(records.iter().filter(|r| period.contains(&r.timestamp)));
            MonthTotals {
                year: start.year(),
                month: start.month(),
                income: totals.income_total,
                expense: totals.expense_total,
            }
        })
        .collect()
}
