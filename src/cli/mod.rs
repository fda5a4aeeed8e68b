use std::fs::File;
use std::io::{BufReader, BufWriter};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{AppError, ArchiveOutcome, FinanceService, ObligationUpdate};
use crate::config::{DATABASE_ENV, DEFAULT_DATABASE};
use crate::domain::{
    Amount, CategoryId, CategoryLookup, Clock, DateRange, Frequency, RecordFilter, RecordKind,
    format_signed_cents,
};
use crate::io::{Exporter, ImportOptions, Importer};
use crate::storage::KeyValueStore;
use crate::telemetry;

/// Hisab - personal income, expense and recurring obligation tracker
#[derive(Parser)]
#[command(name = "hisab")]
#[command(about = "Track income and expenses, recurring obligations, budgets, debts and goals")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = DATABASE_ENV, default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Income and expense records
    #[command(subcommand)]
    Record(RecordCommands),

    /// Category management
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Recurring obligations (rent, salary, subscriptions)
    #[command(subcommand)]
    Recurring(RecurringCommands),

    /// Monthly budgets per category
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Replace all records in a date range with per-category summaries
    Archive {
        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Last day of the range, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Show what would be archived without changing anything
        #[arg(long)]
        preview: bool,
    },

    /// Reports and history
    #[command(subcommand)]
    Report(ReportCommands),

    /// Debt tracking
    #[command(subcommand)]
    Debt(DebtCommands),

    /// Savings goals
    #[command(subcommand)]
    Goal(GoalCommands),

    /// User settings
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Export all data as a JSON snapshot
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import a JSON snapshot
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,

        /// Add new records and obligations instead of replacing everything
        #[arg(long)]
        merge: bool,
    },
}

/// Filter flags shared by `record list` and `record totals`.
#[derive(clap::Args)]
pub struct FilterArgs {
    /// Case-insensitive text to look for in labels
    #[arg(short, long)]
    search: Option<String>,

    /// Category id or name
    #[arg(short, long)]
    category: Option<String>,

    /// From date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// To date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Minimum amount
    #[arg(long)]
    min: Option<String>,

    /// Maximum amount
    #[arg(long)]
    max: Option<String>,
}

#[derive(Subcommand)]
pub enum RecordCommands {
    /// Record an income or an expense
    Add {
        /// income or expense
        kind: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Category id or name
        #[arg(short, long)]
        category: String,

        /// Free text label
        #[arg(short, long, default_value = "")]
        label: String,

        /// Date of the record (YYYY-MM-DD or RFC 3339, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List records, newest first
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum number of records to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Income, expense and net of the matching records
    Totals {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Delete a record
    Delete {
        /// Record ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a category
    Add { name: String },

    /// List categories
    List,

    /// Delete a category
    Delete {
        /// Category id or name
        category: String,
    },
}

#[derive(Subcommand)]
pub enum RecurringCommands {
    /// Create a recurring obligation
    Add {
        /// income or expense
        kind: String,

        /// Amount per occurrence
        amount: String,

        /// daily, weekly, monthly or yearly
        #[arg(short, long)]
        frequency: String,

        /// First occurrence (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Category id or name
        #[arg(short, long)]
        category: String,

        /// Free text label
        #[arg(short, long, default_value = "")]
        label: String,
    },

    /// Change an obligation; its next due date is recomputed
    Edit {
        /// Obligation ID
        id: String,

        #[arg(long)]
        amount: Option<String>,

        #[arg(short, long)]
        frequency: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        label: Option<String>,
    },

    /// List obligations, soonest due first
    List {
        /// Case-insensitive text to look for in labels
        #[arg(short, long)]
        search: Option<String>,

        /// Category id or name
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Every occurrence in the coming days, by date
    Calendar {
        /// Number of days ahead
        #[arg(short, long, default_value = "30")]
        days: u32,
    },

    /// Record one occurrence now and advance the schedule
    Fire {
        /// Obligation ID
        id: String,
    },

    /// Show obligations due now and coming up soon
    Due,

    /// Delete an obligation
    Delete {
        /// Obligation ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set the monthly budget of a category (0 removes it)
    Set {
        /// Category id or name
        category: String,

        /// Monthly amount
        amount: String,
    },

    /// Show this month's spending against each budget
    Status,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Summary, breakdown and top expenses for a month
    Month {
        /// Any day in the month (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Income and expenses per month
    History {
        /// Number of months to show
        #[arg(short, long, default_value = "12")]
        months: u32,
    },
}

#[derive(Subcommand)]
pub enum DebtCommands {
    /// Track a new debt
    Add {
        name: String,

        /// Total owed
        total: String,

        /// Monthly payment
        #[arg(short, long)]
        payment: String,

        /// Date of the next payment (YYYY-MM-DD)
        #[arg(long)]
        next: String,
    },

    /// Pay towards a debt
    Pay {
        /// Debt ID
        id: String,

        /// Amount paid (defaults to the monthly payment)
        #[arg(long)]
        amount: Option<String>,

        /// Also record the payment as an expense
        #[arg(long)]
        record: bool,
    },

    /// List debts
    List,
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a savings goal
    Add {
        name: String,

        /// Target amount
        target: String,
    },

    /// Add money to a goal
    Fund {
        /// Goal ID
        id: String,

        amount: String,

        /// Also record the contribution as an expense
        #[arg(long)]
        record: bool,
    },

    /// List goals
    List,
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show current settings
    Show,

    /// Change a setting
    Set { key: String, value: String },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        telemetry::init_tracing(self.verbose);

        if let Commands::Init = self.command {
            FinanceService::init(&self.database).await?;
            println!("Database initialized: {}", self.database);
            return Ok(());
        }

        let service = FinanceService::connect(&self.database)
            .await
            .with_context(|| {
                format!(
                    "Cannot open database '{}'. Run 'hisab init' first.",
                    self.database
                )
            })?;

        match self.command {
            Commands::Init => {}
            Commands::Record(cmd) => run_record_command(&service, cmd).await?,
            Commands::Category(cmd) => run_category_command(&service, cmd).await?,
            Commands::Recurring(cmd) => run_recurring_command(&service, cmd).await?,
            Commands::Budget(cmd) => run_budget_command(&service, cmd).await?,
            Commands::Archive { from, to, preview } => {
                let range = DateRange::new(parse_day(&from)?, parse_day(&to)?);
                run_archive_command(&service, range, preview).await?;
            }
            Commands::Report(cmd) => run_report_command(&service, cmd).await?,
            Commands::Debt(cmd) => run_debt_command(&service, cmd).await?,
            Commands::Goal(cmd) => run_goal_command(&service, cmd).await?,
            Commands::Settings(cmd) => run_settings_command(&service, cmd).await?,
            Commands::Export { output } => run_export_command(&service, output.as_deref()).await?,
            Commands::Import {
                input,
                dry_run,
                merge,
            } => {
                let options = ImportOptions { dry_run, merge };
                run_import_command(&service, input.as_deref(), options).await?;
            }
        }

        Ok(())
    }
}

async fn run_record_command<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    cmd: RecordCommands,
) -> Result<()> {
    match cmd {
        RecordCommands::Add {
            kind,
            amount,
            category,
            label,
            date,
        } => {
            let kind: RecordKind = kind.parse()?;
            let amount = parse_amount(&amount)?;
            let category_id = resolve_category(service, &category).await?;
            let timestamp = date.as_deref().map(parse_timestamp).transpose()?;

            let record = service
                .add_record(kind, amount, category_id, timestamp, label)
                .await?;
            println!(
                "Recorded {}: {} on {} ({})",
                record.kind,
                record.amount,
                record.calendar_date(),
                record.id
            );
        }

        RecordCommands::List { filter, limit } => {
            let filter = build_filter(service, filter).await?;
            let records = service.list_records(&filter).await?;
            let categories = service.list_categories().await?;

            if records.is_empty() {
                println!("No records found.");
                return Ok(());
            }

            println!(
                "{:<36} {:<10} {:<8} {:>12} {:<18} LABEL",
                "ID", "DATE", "KIND", "AMOUNT", "CATEGORY"
            );
            println!("{}", "-".repeat(100));
            for record in records.iter().take(limit.unwrap_or(usize::MAX)) {
                println!(
                    "{:<36} {:<10} {:<8} {:>12} {:<18} {}",
                    record.id,
                    record.calendar_date(),
                    record.kind,
                    record.amount.to_string(),
                    truncate(categories.display_name(&record.category_id), 18),
                    record.label
                );
            }
        }

        RecordCommands::Totals { filter } => {
            let filter = build_filter(service, filter).await?;
            let totals = service.filtered_totals(&filter).await?;
            println!("Income:   {:>12}", totals.income_total.to_string());
            println!("Expenses: {:>12}", totals.expense_total.to_string());
            println!("Net:      {:>12}", format_signed_cents(totals.net()));
        }

        RecordCommands::Delete { id } => {
            let removed = service.delete_record(parse_id(&id)?).await?;
            println!(
                "Deleted {} of {} on {}",
                removed.kind,
                removed.amount,
                removed.calendar_date()
            );
        }
    }

    Ok(())
}

async fn run_category_command<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    cmd: CategoryCommands,
) -> Result<()> {
    match cmd {
        CategoryCommands::Add { name } => {
            let category = service.add_category(name).await?;
            println!("Added category: {} ({})", category.name, category.id);
        }

        CategoryCommands::List => {
            let categories = service.list_categories().await?;
            println!("{:<40} NAME", "ID");
            println!("{}", "-".repeat(60));
            for category in categories {
                println!("{:<40} {}", category.id, category.name);
            }
        }

        CategoryCommands::Delete { category } => {
            let id = resolve_category(service, &category).await?;
            let removed = service.delete_category(&id).await?;
            println!("Deleted category: {}", removed.name);
        }
    }

    Ok(())
}

async fn run_recurring_command<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    cmd: RecurringCommands,
) -> Result<()> {
    match cmd {
        RecurringCommands::Add {
            kind,
            amount,
            frequency,
            start,
            category,
            label,
        } => {
            let kind: RecordKind = kind.parse()?;
            let frequency: Frequency = frequency.parse()?;
            let amount = parse_amount(&amount)?;
            let anchor = parse_day(&start)?;
            let category_id = resolve_category(service, &category).await?;

            let obligation = service
                .create_obligation(kind, amount, category_id, label, frequency, anchor)
                .await?;
            println!(
                "Created {} {} of {} ({}), next due {}",
                obligation.frequency,
                obligation.kind,
                obligation.amount,
                obligation.id,
                obligation.next_due_date
            );
        }

        RecurringCommands::Edit {
            id,
            amount,
            frequency,
            start,
            category,
            label,
        } => {
            let category_id = match category {
                Some(category) => Some(resolve_category(service, &category).await?),
                None => None,
            };
            let update = ObligationUpdate {
                kind: None,
                amount: amount.as_deref().map(parse_amount).transpose()?,
                category_id,
                label,
                frequency: frequency
                    .as_deref()
                    .map(str::parse::<Frequency>)
                    .transpose()?,
                anchor_date: start.as_deref().map(parse_day).transpose()?,
            };

            let obligation = service.edit_obligation(parse_id(&id)?, update).await?;
            println!(
                "Updated {} ({}), next due {}",
                display_label(&obligation.label),
                obligation.id,
                obligation.next_due_date
            );
        }

        RecurringCommands::List { search, category } => {
            let category_id = match category {
                Some(category) => Some(resolve_category(service, &category).await?),
                None => None,
            };
            let filter = RecordFilter {
                search,
                category_id,
                ..Default::default()
            };
            let obligations = service.find_obligations(&filter).await?;
            if obligations.is_empty() {
                println!("No recurring obligations.");
                return Ok(());
            }
            print_obligations(service, &obligations).await?;
        }

        RecurringCommands::Calendar { days } => {
            let schedule = service.schedule_ahead(days).await?;
            if schedule.is_empty() {
                println!("Nothing scheduled in the next {} days.", days);
                return Ok(());
            }
            println!("{:<10} {:<8} {:>12} LABEL", "DATE", "KIND", "AMOUNT");
            println!("{}", "-".repeat(50));
            for entry in schedule {
                println!(
                    "{:<10} {:<8} {:>12} {}",
                    entry.date,
                    entry.obligation.kind,
                    entry.obligation.amount.to_string(),
                    display_label(&entry.obligation.label)
                );
            }
        }

        RecurringCommands::Fire { id } => {
            let fired = service.fire_obligation(parse_id(&id)?).await?;
            println!(
                "Recorded {} of {} ({})",
                fired.record.kind, fired.record.amount, fired.record.id
            );
            println!("Next due: {}", fired.obligation.next_due_date);
        }

        RecurringCommands::Due => {
            let due = service.due_obligations().await?;
            let upcoming = service.upcoming_obligations().await?;

            if due.is_empty() && upcoming.is_empty() {
                println!("Nothing due.");
                return Ok(());
            }
            if !due.is_empty() {
                println!("Due now:");
                print_obligations(service, &due).await?;
            }
            if !upcoming.is_empty() {
                let window = service.settings().await?.upcoming_window_days;
                println!();
                println!("Upcoming (next {} days):", window);
                print_obligations(service, &upcoming).await?;
            }
        }

        RecurringCommands::Delete { id } => {
            let removed = service.delete_obligation(parse_id(&id)?).await?;
            println!("Deleted recurring obligation: {}", display_label(&removed.label));
        }
    }

    Ok(())
}

async fn print_obligations<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    obligations: &[crate::domain::RecurringObligation],
) -> Result<()> {
    let categories = service.list_categories().await?;
    println!(
        "{:<36} {:<10} {:<8} {:<8} {:>12} {:<18} LABEL",
        "ID", "NEXT DUE", "EVERY", "KIND", "AMOUNT", "CATEGORY"
    );
    println!("{}", "-".repeat(110));
    for o in obligations {
        println!(
            "{:<36} {:<10} {:<8} {:<8} {:>12} {:<18} {}",
            o.id,
            o.next_due_date,
            o.frequency,
            o.kind,
            o.amount.to_string(),
            truncate(categories.display_name(&o.category_id), 18),
            o.label
        );
    }
    Ok(())
}

async fn run_budget_command<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    cmd: BudgetCommands,
) -> Result<()> {
    match cmd {
        BudgetCommands::Set { category, amount } => {
            let category_id = resolve_category(service, &category).await?;
            let amount = parse_amount(&amount)?;
            service.set_budget(category_id, amount).await?;
            if amount.is_zero() {
                println!("Removed budget for {}", category);
            } else {
                println!("Budget for {} set to {} per month", category, amount);
            }
        }

        BudgetCommands::Status => {
            let overview = service.budget_overview().await?;
            if overview.entries.is_empty() {
                println!("No budgets found.");
                return Ok(());
            }

            println!("Budgets for {}", overview.period);
            println!(
                "{:<20} {:>12} {:>12} {:>12} {:>7} STATUS",
                "CATEGORY", "BUDGET", "SPENT", "REMAINING", "USED"
            );
            println!("{}", "-".repeat(80));
            for entry in &overview.entries {
                println!(
                    "{:<20} {:>12} {:>12} {:>12} {:>6.0}% {}",
                    truncate(&entry.category_name, 20),
                    entry.budgeted.to_string(),
                    entry.spent.to_string(),
                    format_signed_cents(entry.remaining),
                    entry.percent,
                    entry.level
                );
            }
            println!("{}", "-".repeat(80));
            println!(
                "{:<20} {:>12} {:>12} {:>12}",
                "TOTAL",
                overview.total_budgeted.to_string(),
                overview.total_spent.to_string(),
                format_signed_cents(overview.total_budgeted.signed_diff(overview.total_spent))
            );
        }
    }

    Ok(())
}

async fn run_archive_command<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    range: DateRange,
    preview: bool,
) -> Result<()> {
    if preview {
        let summary = service.preview_archive(range).await?;
        if summary.is_empty() {
            println!("No records between {}.", range);
            return Ok(());
        }
        println!(
            "{} records would be replaced by {} summaries:",
            summary.consumed_ids.len(),
            summary.records.len()
        );
        for record in &summary.records {
            println!("  {:>12}  {}", record.amount.to_string(), record.label);
        }
        return Ok(());
    }

    match service.archive(range).await? {
        ArchiveOutcome::NothingToArchive => {
            println!("No records between {}. Nothing archived.", range);
        }
        ArchiveOutcome::Archived {
            archived_count,
            summaries,
        } => {
            println!(
                "Archived {} records into {} summaries.",
                archived_count,
                summaries.len()
            );
        }
    }

    Ok(())
}

async fn run_report_command<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    cmd: ReportCommands,
) -> Result<()> {
    match cmd {
        ReportCommands::Month { date } => {
            let day = match date {
                Some(date) => parse_day(&date)?,
                None => service.today(),
            };
            let report = service.month_report(day).await?;
            let summary = &report.summary;

            println!("Report for {}", summary.period);
            println!();
            let income_note = if summary.income_is_declared {
                " (declared)"
            } else {
                ""
            };
            println!("Income:   {:>12}{}", summary.income.to_string(), income_note);
            println!("Expenses: {:>12}", summary.expenses.to_string());
            println!("Savings:  {:>12}", format_signed_cents(summary.savings));

            if !report.expense_breakdown.is_empty() {
                println!();
                println!("{:<20} {:>12} {:>7}", "CATEGORY", "SPENT", "SHARE");
                println!("{}", "-".repeat(42));
                for share in &report.expense_breakdown {
                    println!(
                        "{:<20} {:>12} {:>6.1}%",
                        truncate(&share.category_name, 20),
                        share.total.to_string(),
                        share.percentage
                    );
                }
            }

            if !report.top_expenses.is_empty() {
                println!();
                println!("Top expenses:");
                for record in &report.top_expenses {
                    println!(
                        "  {}  {:>12}  {}",
                        record.calendar_date(),
                        record.amount.to_string(),
                        display_label(&record.label)
                    );
                }
            }
        }

        ReportCommands::History { months } => {
            let history = service.history(months).await?;
            println!("{:<8} {:>12} {:>12} {:>12}", "MONTH", "INCOME", "EXPENSES", "NET");
            println!("{}", "-".repeat(47));
            for month in history {
                println!(
                    "{:04}-{:02} {:>12} {:>12} {:>12}",
                    month.year,
                    month.month,
                    month.income.to_string(),
                    month.expense.to_string(),
                    format_signed_cents(month.income.signed_diff(month.expense))
                );
            }
        }
    }

    Ok(())
}

async fn run_debt_command<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    cmd: DebtCommands,
) -> Result<()> {
    match cmd {
        DebtCommands::Add {
            name,
            total,
            payment,
            next,
        } => {
            let debt = service
                .add_debt(
                    name,
                    parse_amount(&total)?,
                    parse_amount(&payment)?,
                    parse_day(&next)?,
                )
                .await?;
            println!(
                "Tracking debt: {} ({}), {} owed, {} per month",
                debt.name, debt.id, debt.total_amount, debt.monthly_payment
            );
        }

        DebtCommands::Pay { id, amount, record } => {
            let amount = amount.as_deref().map(parse_amount).transpose()?;
            let payment = service.pay_debt(parse_id(&id)?, amount, record).await?;
            let debt = &payment.debt;

            if debt.is_paid_off() {
                println!("{} is paid off.", debt.name);
            } else {
                println!(
                    "{}: {} remaining, next payment {}",
                    debt.name, debt.remaining_amount, debt.next_payment_date
                );
            }
            if let Some(record) = payment.record {
                println!("Recorded expense ({})", record.id);
            }
        }

        DebtCommands::List => {
            let debts = service.list_debts().await?;
            if debts.is_empty() {
                println!("No debts.");
                return Ok(());
            }
            println!(
                "{:<36} {:<20} {:>12} {:>12} {:>6} NEXT PAYMENT",
                "ID", "NAME", "REMAINING", "MONTHLY", "PAID"
            );
            println!("{}", "-".repeat(105));
            for debt in debts {
                println!(
                    "{:<36} {:<20} {:>12} {:>12} {:>5.0}% {}",
                    debt.id,
                    truncate(&debt.name, 20),
                    debt.remaining_amount.to_string(),
                    debt.monthly_payment.to_string(),
                    debt.paid_percent(),
                    debt.next_payment_date
                );
            }
        }
    }

    Ok(())
}

async fn run_goal_command<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    cmd: GoalCommands,
) -> Result<()> {
    match cmd {
        GoalCommands::Add { name, target } => {
            let goal = service.add_goal(name, parse_amount(&target)?).await?;
            println!(
                "Created goal: {} ({}), target {}",
                goal.name, goal.id, goal.target_amount
            );
        }

        GoalCommands::Fund { id, amount, record } => {
            let contribution = service
                .fund_goal(parse_id(&id)?, parse_amount(&amount)?, record)
                .await?;
            let goal = &contribution.goal;

            println!(
                "{}: {} of {} ({:.0}%)",
                goal.name,
                goal.current_amount,
                goal.target_amount,
                goal.progress_percent()
            );
            if goal.is_reached() {
                println!("Goal reached!");
            }
            if let Some(record) = contribution.record {
                println!("Recorded expense ({})", record.id);
            }
        }

        GoalCommands::List => {
            let goals = service.list_goals().await?;
            if goals.is_empty() {
                println!("No goals.");
                return Ok(());
            }
            println!(
                "{:<36} {:<20} {:>12} {:>12} {:>6}",
                "ID", "NAME", "SAVED", "TARGET", "DONE"
            );
            println!("{}", "-".repeat(90));
            for goal in goals {
                println!(
                    "{:<36} {:<20} {:>12} {:>12} {:>5.0}%",
                    goal.id,
                    truncate(&goal.name, 20),
                    goal.current_amount.to_string(),
                    goal.target_amount.to_string(),
                    goal.progress_percent()
                );
            }
        }
    }

    Ok(())
}

async fn run_settings_command<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    cmd: SettingsCommands,
) -> Result<()> {
    let settings = match cmd {
        SettingsCommands::Show => service.settings().await?,
        SettingsCommands::Set { key, value } => service.update_setting(&key, &value).await?,
    };

    println!("monthly_income                {}", settings.monthly_income);
    println!("currency                      {}", settings.currency);
    println!("budget_alert_percent          {}", settings.budget_alert_percent);
    println!("upcoming_window_days          {}", settings.upcoming_window_days);
    println!(
        "min_expenses_for_suggestions  {}",
        settings.min_expenses_for_suggestions
    );
    Ok(())
}

async fn run_export_command<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    output: Option<&str>,
) -> Result<()> {
    let exporter = Exporter::new(service);

    let snapshot = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            exporter.export_json(BufWriter::new(file)).await?
        }
        None => exporter.export_json(std::io::stdout().lock()).await?,
    };

    if let Some(path) = output {
        eprintln!("Exported {} items to {}", snapshot.item_count(), path);
    }
    Ok(())
}

async fn run_import_command<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    input: Option<&str>,
    options: ImportOptions,
) -> Result<()> {
    let importer = Importer::new(service);

    let result = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            importer.import_json(BufReader::new(file), options).await?
        }
        None => importer.import_json(std::io::stdin().lock(), options).await?,
    };

    let verb = if options.dry_run {
        "Would import"
    } else {
        "Imported"
    };
    println!("{} {} items ({} skipped)", verb, result.imported, result.skipped);
    Ok(())
}

async fn build_filter<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    args: FilterArgs,
) -> Result<RecordFilter> {
    let category_id = match args.category {
        Some(category) => Some(resolve_category(service, &category).await?),
        None => None,
    };

    Ok(RecordFilter {
        search: args.search,
        category_id,
        from: args.from.as_deref().map(parse_day).transpose()?,
        to: args.to.as_deref().map(parse_day).transpose()?,
        min_amount: args.min.as_deref().map(parse_amount).transpose()?,
        max_amount: args.max.as_deref().map(parse_amount).transpose()?,
    })
}

/// Accept a category id or a case-insensitive name.
async fn resolve_category<S: KeyValueStore, C: Clock>(
    service: &FinanceService<S, C>,
    input: &str,
) -> Result<CategoryId> {
    let categories = service.list_categories().await?;
    categories
        .iter()
        .find(|c| c.id == input)
        .or_else(|| {
            categories
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(input))
        })
        .map(|c| c.id.clone())
        .ok_or_else(|| AppError::CategoryNotFound(input.to_string()).into())
}

fn parse_amount(s: &str) -> Result<Amount> {
    s.parse::<Amount>()
        .with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", s))
}

fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", s))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let day = parse_day(s)?;
    Ok(day.and_time(chrono::NaiveTime::MIN).and_utc())
}

fn parse_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).with_context(|| format!("Invalid ID '{}' (expected UUID)", s))
}

fn display_label(label: &str) -> &str {
    if label.is_empty() { "(no label)" } else { label }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
