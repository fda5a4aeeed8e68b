// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use hisab::application::FinanceService;
use hisab::domain::{Amount, FixedClock, MonetaryRecord, RecordKind, SystemClock};
use hisab::storage::{MemoryStore, SqliteStore};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(FinanceService<SqliteStore, SystemClock>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = FinanceService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// In-memory service whose clock is frozen at midday on `date`
pub fn service_on(date: &str) -> FinanceService<MemoryStore, FixedClock> {
    FinanceService::new(MemoryStore::new(), FixedClock::on(day(date)))
}

pub fn day(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    day(date_str).and_hms_opt(0, 0, 0).unwrap().and_utc()
}

pub fn cents(value: u64) -> Amount {
    Amount::from_cents(value)
}

/// Record an expense at midnight on `date`
pub async fn expense<C: hisab::domain::Clock>(
    service: &FinanceService<MemoryStore, C>,
    value: u64,
    category: &str,
    date: &str,
) -> Result<MonetaryRecord> {
    Ok(service
        .add_record(
            RecordKind::Expense,
            cents(value),
            category.to_string(),
            Some(parse_date(date)),
            String::new(),
        )
        .await?)
}

/// Record an income at midnight on `date`
pub async fn income<C: hisab::domain::Clock>(
    service: &FinanceService<MemoryStore, C>,
    value: u64,
    category: &str,
    date: &str,
) -> Result<MonetaryRecord> {
    Ok(service
        .add_record(
            RecordKind::Income,
            cents(value),
            category.to_string(),
            Some(parse_date(date)),
            String::new(),
        )
        .await?)
}
