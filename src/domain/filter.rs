use chrono::NaiveDate;

use super::{Amount, CategoryId, MonetaryRecord, RecurringObligation};

/// Criteria for narrowing a list of records. Every field is optional and an
/// empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    /// Case-insensitive substring of the label.
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Inclusive calendar dates.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Inclusive amount bounds.
    pub min_amount: Option<Amount>,
    pub max_amount: Option<Amount>,
}

impl RecordFilter {
    pub fn matches(&self, record: &MonetaryRecord) -> bool {
        let date = record.calendar_date();
        self.matches_text(&record.label, &record.category_id)
            && self.from.is_none_or(|from| date >= from)
            && self.to.is_none_or(|to| date <= to)
            && self.min_amount.is_none_or(|min| record.amount >= min)
            && self.max_amount.is_none_or(|max| record.amount <= max)
    }

    /// Obligations have no single date, so only search and category apply.
    pub fn matches_obligation(&self, obligation: &RecurringObligation) -> bool {
        self.matches_text(&obligation.label, &obligation.category_id)
    }

    fn matches_text(&self, label: &str, category_id: &str) -> bool {
        let search_ok = match self.search.as_deref() {
            Some(term) if !term.is_empty() => label.to_lowercase().contains(&term.to_lowercase()),
            _ => true,
        };
        search_ok && self.category_id.as_deref().is_none_or(|c| c == category_id)
    }

    pub fn apply<'a>(
        &'a self,
        records: &'a [MonetaryRecord],
    ) -> impl Iterator<Item = &'a MonetaryRecord> + 'a {
        records.iter().filter(move |r| self.matches(r))
    }
}
