mod common;

use anyhow::Result;
use common::{cents, day, service_on, test_service};
use hisab::application::{AppError, FinanceService, ObligationUpdate};
use hisab::domain::{Frequency, RecordKind, RecurringObligation};
use uuid::Uuid;

#[tokio::test]
async fn test_create_settles_next_due_date() -> Result<()> {
    let service = service_on("2024-03-15");

    // Anchored on the 31st: Feb clamps to the 29th and the day sticks.
    let rent = service
        .create_obligation(
            RecordKind::Expense,
            cents(90_000),
            "cat-3".to_string(),
            "Rent".to_string(),
            Frequency::Monthly,
            day("2024-01-31"),
        )
        .await?;

    assert_eq!(rent.anchor_date, day("2024-01-31"));
    assert_eq!(rent.next_due_date, day("2024-03-29"));
    assert!(service.due_obligations().await?.is_empty());

    let upcoming = service.upcoming_obligations().await?;
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, rent.id);

    Ok(())
}

#[tokio::test]
async fn test_weekly_obligation_due_today() -> Result<()> {
    let service = service_on("2024-03-15");

    let allowance = service
        .create_obligation(
            RecordKind::Expense,
            cents(5_000),
            "cat-1".to_string(),
            "Groceries".to_string(),
            Frequency::Weekly,
            day("2024-03-01"),
        )
        .await?;

    assert_eq!(allowance.next_due_date, day("2024-03-15"));
    assert_eq!(service.due_obligations().await?.len(), 1);

    let fired = service.fire_obligation(allowance.id).await?;
    assert_eq!(fired.obligation.next_due_date, day("2024-03-22"));
    assert!(service.due_obligations().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_fire_records_occurrence_and_advances() -> Result<()> {
    let service = service_on("2024-03-15");
    let rent = service
        .create_obligation(
            RecordKind::Expense,
            cents(90_000),
            "cat-3".to_string(),
            "Rent".to_string(),
            Frequency::Monthly,
            day("2024-01-31"),
        )
        .await?;

    let fired = service.fire_obligation(rent.id).await?;

    assert_eq!(fired.record.kind, RecordKind::Expense);
    assert_eq!(fired.record.amount, cents(90_000));
    assert_eq!(fired.record.category_id, "cat-3");
    assert_eq!(fired.record.label, "(recurring) Rent");
    assert_eq!(fired.record.calendar_date(), day("2024-03-15"));
    assert_eq!(fired.obligation.next_due_date, day("2024-04-29"));

    let records = service.repository().records().await?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, fired.record.id);

    let stored = service.list_obligations().await?;
    assert_eq!(stored[0].next_due_date, day("2024-04-29"));

    Ok(())
}

#[tokio::test]
async fn test_fire_overdue_obligation_catches_up_once() -> Result<()> {
    let service = service_on("2024-03-15");

    // Last settled in early January, so the January 31st occurrence is overdue.
    let stale = RecurringObligation::new(
        RecordKind::Income,
        cents(1_200_000),
        "cat-7",
        "Salary",
        Frequency::Monthly,
        day("2024-01-31"),
        day("2024-01-10"),
    );
    assert_eq!(stale.next_due_date, day("2024-01-31"));
    service
        .repository()
        .replace_obligations(std::slice::from_ref(&stale))
        .await?;
    assert_eq!(service.due_obligations().await?.len(), 1);

    let fired = service.fire_obligation(stale.id).await?;

    assert_eq!(fired.obligation.next_due_date, day("2024-03-29"));
    assert_eq!(service.repository().records().await?.len(), 1);
    assert!(service.due_obligations().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_edit_reschedules() -> Result<()> {
    let service = service_on("2024-03-15");
    let insurance = service
        .create_obligation(
            RecordKind::Expense,
            cents(30_000),
            "cat-6".to_string(),
            "Insurance".to_string(),
            Frequency::Monthly,
            day("2024-03-01"),
        )
        .await?;
    assert_eq!(insurance.next_due_date, day("2024-04-01"));

    let update = ObligationUpdate {
        amount: Some(cents(250_000)),
        frequency: Some(Frequency::Yearly),
        anchor_date: Some(day("2020-02-29")),
        ..Default::default()
    };
    let edited = service.edit_obligation(insurance.id, update).await?;

    // Feb 29th becomes Feb 28th on the first non-leap year and stays there.
    assert_eq!(edited.next_due_date, day("2025-02-28"));
    assert_eq!(edited.amount, cents(250_000));
    assert_eq!(edited.label, "Insurance");

    Ok(())
}

#[tokio::test]
async fn test_label_edit_after_fire_keeps_due_date() -> Result<()> {
    let service = service_on("2024-03-15");
    let rent = service
        .create_obligation(
            RecordKind::Expense,
            cents(90_000),
            "cat-3".to_string(),
            "Rent".to_string(),
            Frequency::Monthly,
            day("2024-03-15"),
        )
        .await?;
    assert_eq!(rent.next_due_date, day("2024-03-15"));

    let fired = service.fire_obligation(rent.id).await?;
    assert_eq!(fired.obligation.next_due_date, day("2024-04-15"));
    assert_eq!(fired.obligation.anchor_date, day("2024-03-15"));

    let relabeled = service
        .edit_obligation(
            rent.id,
            ObligationUpdate {
                label: Some("Flat rent".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(relabeled.label, "Flat rent");
    assert_eq!(relabeled.next_due_date, day("2024-04-15"));

    let repriced = service
        .edit_obligation(
            rent.id,
            ObligationUpdate {
                amount: Some(cents(95_000)),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(repriced.next_due_date, day("2024-04-15"));
    assert!(service.due_obligations().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_upcoming_window_setting() -> Result<()> {
    let service = service_on("2024-03-15");
    service
        .create_obligation(
            RecordKind::Expense,
            cents(90_000),
            "cat-3".to_string(),
            "Rent".to_string(),
            Frequency::Monthly,
            day("2024-01-31"),
        )
        .await?;

    service.update_setting("upcoming_window_days", "7").await?;
    assert!(service.upcoming_obligations().await?.is_empty());

    service.update_setting("upcoming_window_days", "14").await?;
    assert_eq!(service.upcoming_obligations().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_invalid_obligations_rejected() -> Result<()> {
    let service = service_on("2024-03-15");

    let zero = service
        .create_obligation(
            RecordKind::Expense,
            cents(0),
            "cat-3".to_string(),
            "Nothing".to_string(),
            Frequency::Daily,
            day("2024-03-01"),
        )
        .await;
    assert!(matches!(zero, Err(AppError::InvalidAmount(_))));

    let missing = service.fire_obligation(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::ObligationNotFound(_))));
    assert!(service.repository().records().await?.is_empty());

    let unknown: Result<Frequency, _> = "fortnightly".parse();
    assert!(unknown.is_err());

    Ok(())
}

#[tokio::test]
async fn test_obligations_persist_in_database() -> Result<()> {
    let (service, temp) = test_service().await?;
    let today = service.today();

    let created = service
        .create_obligation(
            RecordKind::Expense,
            cents(1_999),
            "cat-5".to_string(),
            "Streaming".to_string(),
            Frequency::Monthly,
            day("2020-01-31"),
        )
        .await?;
    assert!(created.next_due_date >= today);

    let db_path = temp.path().join("test.db");
    let reopened = FinanceService::connect(db_path.to_str().unwrap()).await?;
    let obligations = reopened.list_obligations().await?;
    assert_eq!(obligations, vec![created]);

    Ok(())
}

#[tokio::test]
async fn test_schedule_ahead_lists_every_occurrence() -> Result<()> {
    let service = service_on("2024-03-15");
    service
        .create_obligation(
            RecordKind::Expense,
            cents(5_000),
            "cat-1".to_string(),
            "Groceries".to_string(),
            Frequency::Weekly,
            day("2024-03-01"),
        )
        .await?;
    service
        .create_obligation(
            RecordKind::Expense,
            cents(90_000),
            "cat-3".to_string(),
            "Rent".to_string(),
            Frequency::Monthly,
            day("2024-01-31"),
        )
        .await?;

    let schedule = service.schedule_ahead(14).await?;
    let dates: Vec<_> = schedule.iter().map(|o| o.date).collect();
    assert_eq!(
        dates,
        [day("2024-03-15"), day("2024-03-22"), day("2024-03-29"), day("2024-03-29")]
    );

    Ok(())
}

#[tokio::test]
async fn test_find_obligations_by_label() -> Result<()> {
    let service = service_on("2024-03-15");
    for label in ["Netflix", "Gym", "Spotify premium"] {
        service
            .create_obligation(
                RecordKind::Expense,
                cents(1_000),
                "cat-5".to_string(),
                label.to_string(),
                Frequency::Monthly,
                day("2024-03-20"),
            )
            .await?;
    }

    let filter = hisab::domain::RecordFilter {
        search: Some("SPOT".to_string()),
        ..Default::default()
    };
    let found = service.find_obligations(&filter).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].label, "Spotify premium");

    Ok(())
}
