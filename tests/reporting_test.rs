mod common;

use anyhow::Result;
use common::{cents, day, expense, income, service_on};
use hisab::domain::{RecordFilter, RecordKind};

#[tokio::test]
async fn test_month_report() -> Result<()> {
    let service = service_on("2024-03-15");
    income(&service, 500_000, "cat-7", "2024-03-01").await?;
    for (value, category, date) in [
        (120_000, "cat-3", "2024-03-01"),
        (30_000, "cat-1", "2024-03-04"),
        (10_000, "cat-1", "2024-03-09"),
        (2_500, "cat-2", "2024-03-11"),
        (2_000, "cat-2", "2024-03-12"),
        (1_500, "cat-5", "2024-03-13"),
        (900, "cat-5", "2024-03-14"),
        (40_000, "cat-4", "2024-02-20"),
    ] {
        expense(&service, value, category, date).await?;
    }

    let report = service.month_report(day("2024-03-15")).await?;

    assert_eq!(report.summary.income, cents(500_000));
    assert_eq!(report.summary.expenses, cents(166_900));
    assert_eq!(report.summary.savings, 333_100);
    assert!(!report.summary.income_is_declared);

    let shares: Vec<&str> = report
        .expense_breakdown
        .iter()
        .map(|s| s.category_name.as_str())
        .collect();
    assert_eq!(
        shares,
        ["Housing & Bills", "Food & Drink", "Transport", "Entertainment"]
    );
    let total_share: f64 = report.expense_breakdown.iter().map(|s| s.percentage).sum();
    assert!((total_share - 100.0).abs() < 1e-6);

    let top: Vec<_> = report.top_expenses.iter().map(|r| r.amount).collect();
    assert_eq!(
        top,
        [cents(120_000), cents(30_000), cents(10_000), cents(2_500), cents(2_000)]
    );

    Ok(())
}

#[tokio::test]
async fn test_declared_income_drives_savings() -> Result<()> {
    let service = service_on("2024-03-15");
    income(&service, 500_000, "cat-7", "2024-03-01").await?;
    expense(&service, 150_000, "cat-3", "2024-03-01").await?;

    service.update_setting("monthly_income", "1000").await?;
    let report = service.month_report(day("2024-03-20")).await?;

    assert!(report.summary.income_is_declared);
    assert_eq!(report.summary.income, cents(100_000));
    assert_eq!(report.summary.savings, -50_000);

    Ok(())
}

#[tokio::test]
async fn test_history_covers_last_twelve_months() -> Result<()> {
    let service = service_on("2024-03-15");
    income(&service, 300_000, "cat-7", "2023-04-30").await?;
    expense(&service, 1_000, "cat-1", "2023-03-31").await?;
    expense(&service, 2_000, "cat-1", "2024-03-01").await?;

    let history = service.history(12).await?;

    assert_eq!(history.len(), 12);
    assert_eq!((history[0].year, history[0].month), (2023, 4));
    assert_eq!((history[11].year, history[11].month), (2024, 3));
    assert_eq!(history[0].income, cents(300_000));
    assert_eq!(history[11].expense, cents(2_000));
    // March 2023 falls outside the window.
    let expenses: u64 = history.iter().map(|m| m.expense.cents()).sum();
    assert_eq!(expenses, 2_000);

    Ok(())
}

#[tokio::test]
async fn test_filtered_totals() -> Result<()> {
    let service = service_on("2024-03-15");
    income(&service, 500_000, "cat-7", "2024-03-01").await?;
    expense(&service, 4_000, "cat-1", "2024-03-02").await?;
    expense(&service, 6_000, "cat-1", "2024-03-20").await?;
    expense(&service, 9_000, "cat-2", "2024-03-05").await?;

    let food = RecordFilter {
        category_id: Some("cat-1".to_string()),
        ..Default::default()
    };
    let totals = service.filtered_totals(&food).await?;
    assert_eq!(totals.expense_total, cents(10_000));
    assert_eq!(totals.income_total, cents(0));

    let early_march = RecordFilter {
        from: Some(day("2024-03-01")),
        to: Some(day("2024-03-05")),
        ..Default::default()
    };
    let totals = service.filtered_totals(&early_march).await?;
    assert_eq!(totals.income_total, cents(500_000));
    assert_eq!(totals.expense_total, cents(13_000));
    assert_eq!(totals.net(), 487_000);

    let listed = service.list_records(&early_march).await?;
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].kind, RecordKind::Expense);
    assert_eq!(listed[2].kind, RecordKind::Income);

    Ok(())
}
