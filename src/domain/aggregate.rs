//! Collapsing dated, categorized records into per-category period totals.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Amount, CategoryId, CategoryLookup, MonetaryRecord, RecordId, RecordKind, days_in_month,
};

/// An inclusive range of calendar dates. A range whose start is after its end
/// contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = date
            .with_day(days_in_month(date.year(), date.month()))
            .unwrap_or(date);
        Self { start, end }
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Membership by calendar date; the time of day never excludes a record.
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        self.contains_date(timestamp.date_naive())
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Income and expense totals for one category over a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAggregate {
    pub category_id: CategoryId,
    pub income_total: Amount,
    pub expense_total: Amount,
}

impl CategoryAggregate {
    fn empty(category_id: CategoryId) -> Self {
        Self {
            category_id,
            income_total: Amount::ZERO,
            expense_total: Amount::ZERO,
        }
    }

    fn add(&mut self, kind: RecordKind, amount: Amount) {
        match kind {
            RecordKind::Income => self.income_total += amount,
            RecordKind::Expense => self.expense_total += amount,
        }
    }
}

/// Ungrouped income and expense totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub income_total: Amount,
    pub expense_total: Amount,
}

impl PeriodTotals {
    /// Income minus expenses, in signed cents.
    pub fn net(&self) -> i64 {
        self.income_total.signed_diff(self.expense_total)
    }
}

/// Group the records dated inside `range` by category and sum each kind.
/// Categories with nothing in range are absent from the result.
pub fn aggregate_by_category(
    records: &[MonetaryRecord],
    range: DateRange,
) -> BTreeMap<CategoryId, CategoryAggregate> {
    let mut aggregates: BTreeMap<CategoryId, CategoryAggregate> = BTreeMap::new();

    for record in records.iter().filter(|r| range.contains(&r.timestamp)) {
        aggregates
            .entry(record.category_id.clone())
            .or_insert_with(|| CategoryAggregate::empty(record.category_id.clone()))
            .add(record.kind, record.amount);
    }

    aggregates
}

/// Sum already-filtered records by kind.
pub fn sum_period<'a, I>(records: I) -> PeriodTotals
where
    I: IntoIterator<Item = &'a MonetaryRecord>,
{
    records
        .into_iter()
        .fold(PeriodTotals::default(), |mut totals, record| {
            match record.kind {
                RecordKind::Income => totals.income_total += record.amount,
                RecordKind::Expense => totals.expense_total += record.amount,
            }
            totals
        })
}

/// 23:59:59.999 UTC on `date`; the conventional timestamp of archive summaries.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_default()
        .and_utc()
}

/// Replacement plan for archiving a range: the caller removes `consumed_ids`
/// and inserts `records`. Nothing is mutated here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveSummary {
    pub records: Vec<MonetaryRecord>,
    pub consumed_ids: BTreeSet<RecordId>,
}

impl ArchiveSummary {
    /// Nothing fell inside the range. Not an error: there is nothing to archive.
    pub fn is_empty(&self) -> bool {
        self.consumed_ids.is_empty()
    }

    pub fn income_total(&self) -> Amount {
        sum_period(&self.records).income_total
    }

    pub fn expense_total(&self) -> Amount {
        sum_period(&self.records).expense_total
    }
}

/// Collapse every record dated inside `range` into one summary record per
/// category and kind with a non-zero total.
pub fn summarize_for_archive<L>(
    records: &[MonetaryRecord],
    range: DateRange,
    lookup: &L,
    timestamp: DateTime<Utc>,
) -> ArchiveSummary
where
    L: CategoryLookup + ?Sized,
{
    let consumed_ids: BTreeSet<RecordId> = records
        .iter()
        .filter(|r| range.contains(&r.timestamp))
        .map(|r| r.id)
        .collect();

    if consumed_ids.is_empty() {
        return ArchiveSummary::default();
    }

    let mut summaries = Vec::new();
    for aggregate in aggregate_by_category(records, range).into_values() {
        let name = lookup.display_name(&aggregate.category_id);

        for (kind, total, title) in [
            (RecordKind::Income, aggregate.income_total, "Income"),
            (RecordKind::Expense, aggregate.expense_total, "Expense"),
        ] {
            if total.is_zero() {
                continue;
            }
            summaries.push(MonetaryRecord::new(
                kind,
                total,
                aggregate.category_id.clone(),
                timestamp,
                format!("{} summary for \"{}\" from {}", title, name, range),
            ));
        }
    }

    ArchiveSummary {
        records: summaries,
        consumed_ids,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn january() -> DateRange {
        DateRange::new(date("2024-01-01"), date("2024-01-31"))
    }

    fn cents(c: u64) -> Amount {
        Amount::from_cents(c)
    }

    fn scenario() -> Vec<MonetaryRecord> {
        vec![
            MonetaryRecord::expense(cents(100), "catFood", at("2024-01-05T10:00:00Z")),
            MonetaryRecord::expense(cents(50), "catFood", at("2024-01-20T18:30:00Z")),
            MonetaryRecord::income(cents(2000), "catSalary", at("2024-01-01T00:00:00Z")),
        ]
    }

    #[test]
    fn test_month_of() {
        let feb = DateRange::month_of(date("2024-02-14"));
        assert_eq!(feb, DateRange::new(date("2024-02-01"), date("2024-02-29")));
        let dec = DateRange::month_of(date("2023-12-31"));
        assert_eq!(dec.end, date("2023-12-31"));
    }

    #[test]
    fn test_range_boundaries_use_calendar_date() {
        let range = january();
        assert!(range.contains(&at("2024-01-31T23:59:59Z")));
        assert!(range.contains(&at("2024-01-01T00:00:00Z")));
        assert!(!range.contains(&at("2024-02-01T00:00:00Z")));
        assert!(!range.contains(&at("2023-12-31T23:59:59Z")));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let range = DateRange::new(date("2024-02-01"), date("2024-01-01"));
        assert!(range.is_empty());
        assert!(aggregate_by_category(&scenario(), range).is_empty());
    }

    #[test]
    fn test_aggregate_scenario() {
        let aggregates = aggregate_by_category(&scenario(), january());

        assert_eq!(aggregates.len(), 2);
        assert_eq!(
            aggregates["catFood"],
            CategoryAggregate {
                category_id: "catFood".into(),
                income_total: Amount::ZERO,
                expense_total: cents(150),
            }
        );
        assert_eq!(aggregates["catSalary"].income_total, cents(2000));
        assert_eq!(aggregates["catSalary"].expense_total, Amount::ZERO);
    }

    #[test]
    fn test_aggregation_sum_law() {
        let mut records = scenario();
        records.push(MonetaryRecord::expense(cents(999), "catFood", at("2024-02-01T00:00:00Z")));
        records.push(MonetaryRecord::income(cents(40), "catGift", at("2024-01-31T22:00:00Z")));
        records.push(MonetaryRecord::expense(cents(0), "catGift", at("2024-01-15T12:00:00Z")));

        let range = january();
        let aggregates = aggregate_by_category(&records, range);
        let aggregated: Amount = aggregates
            .values()
            .map(|a| a.income_total + a.expense_total)
            .sum();
        let direct: Amount = records
            .iter()
            .filter(|r| range.contains(&r.timestamp))
            .map(|r| r.amount)
            .sum();

        assert_eq!(aggregated, direct);
        assert_eq!(direct, cents(2190));
    }

    #[test]
    fn test_archive_scenario() {
        let records = scenario();
        let names: HashMap<CategoryId, String> = HashMap::from([
            ("catFood".to_string(), "Food".to_string()),
            ("catSalary".to_string(), "Salary".to_string()),
        ]);
        let stamp = end_of_day(date("2024-01-31"));

        let summary = summarize_for_archive(&records, january(), &names, stamp);

        assert_eq!(summary.records.len(), 2);
        let expected_ids: BTreeSet<RecordId> = records.iter().map(|r| r.id).collect();
        assert_eq!(summary.consumed_ids, expected_ids);

        let food = summary
            .records
            .iter()
            .find(|r| r.category_id == "catFood")
            .unwrap();
        assert_eq!(food.kind, RecordKind::Expense);
        assert_eq!(food.amount, cents(150));
        assert_eq!(food.timestamp, stamp);
        assert_eq!(
            food.label,
            "Expense summary for \"Food\" from 2024-01-01 to 2024-01-31"
        );

        let salary = summary
            .records
            .iter()
            .find(|r| r.category_id == "catSalary")
            .unwrap();
        assert_eq!(salary.kind, RecordKind::Income);
        assert_eq!(salary.amount, cents(2000));

        // summaries never reuse the ids they replace
        assert!(summary.records.iter().all(|r| !expected_ids.contains(&r.id)));
    }

    #[test]
    fn test_archive_totals_match_aggregate() {
        let mut records = scenario();
        records.push(MonetaryRecord::income(cents(30), "catFood", at("2024-01-07T07:00:00Z")));
        records.push(MonetaryRecord::expense(cents(70), "catOld", at("2023-12-20T07:00:00Z")));
        let names: HashMap<CategoryId, String> = HashMap::new();

        let summary = summarize_for_archive(&records, january(), &names, end_of_day(date("2024-01-31")));
        let aggregates = aggregate_by_category(&records, january());

        for aggregate in aggregates.values() {
            let of_category = summary
                .records
                .iter()
                .filter(|r| r.category_id == aggregate.category_id);
            let totals = sum_period(of_category);
            assert_eq!(totals.income_total, aggregate.income_total);
            assert_eq!(totals.expense_total, aggregate.expense_total);
        }
        assert_eq!(summary.records.len(), 3);
        assert_eq!(summary.consumed_ids.len(), 4);
        assert!(summary.records.iter().all(|r| r.label.contains("Uncategorized")));
    }

    #[test]
    fn test_archive_empty_range_is_noop() {
        let names: HashMap<CategoryId, String> = HashMap::new();
        let range = DateRange::new(date("2025-01-01"), date("2025-01-31"));
        let summary = summarize_for_archive(&scenario(), range, &names, end_of_day(range.end));

        assert!(summary.is_empty());
        assert!(summary.records.is_empty());
        assert!(summary.consumed_ids.is_empty());
    }

    #[test]
    fn test_zero_amount_records_are_consumed_without_summary() {
        let records = vec![MonetaryRecord::expense(Amount::ZERO, "catFood", at("2024-01-03T00:00:00Z"))];
        let names: HashMap<CategoryId, String> = HashMap::new();
        let summary = summarize_for_archive(&records, january(), &names, end_of_day(date("2024-01-31")));

        assert!(!summary.is_empty());
        assert!(summary.records.is_empty());
        assert_eq!(summary.consumed_ids.len(), 1);
    }

    #[test]
    fn test_sum_period() {
        let totals = sum_period(&scenario());
        assert_eq!(totals.income_total, cents(2000));
        assert_eq!(totals.expense_total, cents(150));
        assert_eq!(totals.net(), 1850);
        assert_eq!(
            sum_period(std::iter::empty::<&MonetaryRecord>()),
            PeriodTotals::default()
        );
    }

    #[test]
    fn test_end_of_day() {
        assert_eq!(
            end_of_day(date("2024-01-31")).to_rfc3339(),
            "2024-01-31T23:59:59.999+00:00"
        );
    }
}
