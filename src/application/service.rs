use chrono::{DateTime, Days, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::domain::{
    Amount, ArchiveSummary, Budget, BudgetProgress, Category, CategoryId, CategoryLookup, Clock,
    DEBT_PAYMENTS_CATEGORY, DateRange, Debt, DebtId, Frequency, Goal, GoalId, MonetaryRecord,
    ObligationId, PeriodTotals, RecordFilter, RecordId, RecordKind, RecurringObligation,
    SAVINGS_CATEGORY, SystemClock, budget_progress, budget_totals, end_of_day, occurrences,
    sum_period, summarize_for_archive,
};
use crate::storage::{KeyValueStore, Repository, SqliteStore};

use super::reporting::{
    MonthReport, MonthTotals, expense_breakdown, monthly_history, monthly_summary, top_expenses,
};
use super::{AppError, BudgetSuggestion, SuggestionService, ensure_enough_expenses};

/// Number of records listed in a month report's top expenses.
const TOP_EXPENSES: usize = 5;

/// Application service providing the operations a client (CLI, UI) needs.
/// Holds no state besides its store and clock: every call loads what it
/// needs, runs the pure domain logic and writes the result back.
pub struct FinanceService<S, C = SystemClock> {
    repo: Repository<S>,
    clock: C,
}

/// Result of firing a recurring obligation
pub struct FiredObligation {
    pub record: MonetaryRecord,
    pub obligation: RecurringObligation,
}

/// Result of an archive request
#[derive(Debug)]
pub enum ArchiveOutcome {
    /// No record fell inside the range; nothing was changed.
    NothingToArchive,
    Archived {
        archived_count: usize,
        summaries: Vec<MonetaryRecord>,
    },
}

/// One future occurrence of an obligation
#[derive(Debug, Clone)]
pub struct ScheduledOccurrence {
    pub date: NaiveDate,
    pub obligation: RecurringObligation,
}

/// Fields of an obligation that can be edited. `None` keeps the current value.
#[derive(Debug, Default)]
pub struct ObligationUpdate {
    pub kind: Option<RecordKind>,
    pub amount: Option<Amount>,
    pub category_id: Option<CategoryId>,
    pub label: Option<String>,
    pub frequency: Option<Frequency>,
    pub anchor_date: Option<NaiveDate>,
}

/// Budget progress for the current month
pub struct BudgetOverview {
    pub period: DateRange,
    pub entries: Vec<BudgetProgress>,
    pub total_budgeted: Amount,
    pub total_spent: Amount,
}

/// Result of paying towards a debt
pub struct DebtPayment {
    pub debt: Debt,
    pub record: Option<MonetaryRecord>,
}

/// Result of funding a goal
pub struct GoalContribution {
    pub goal: Goal,
    pub record: Option<MonetaryRecord>,
}

impl FinanceService<SqliteStore, SystemClock> {
    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = SqliteStore::init(&db_url).await?;
        info!(database = database_path, "initialized database");
        Ok(Self::new(store, SystemClock))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = SqliteStore::connect(&db_url).await?;
        Ok(Self::new(store, SystemClock))
    }
}

impl<S: KeyValueStore, C: Clock> FinanceService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            repo: Repository::new(store),
            clock,
        }
    }

    pub fn repository(&self) -> &Repository<S> {
        &self.repo
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn require_positive(amount: Amount) -> Result<(), AppError> {
        if amount.is_zero() {
            return Err(AppError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }
        Ok(())
    }

    // ========================
    // Record operations
    // ========================

    /// Record an income or expense. `timestamp` defaults to now.
    pub async fn add_record(
        &self,
        kind: RecordKind,
        amount: Amount,
        category_id: CategoryId,
        timestamp: Option<DateTime<Utc>>,
        label: String,
    ) -> Result<MonetaryRecord, AppError> {
        Self::require_positive(amount)?;

        let record = MonetaryRecord::new(
            kind,
            amount,
            category_id,
            timestamp.unwrap_or_else(|| self.clock.now()),
            label,
        );

        let mut records = self.repo.records().await?;
        records.push(record.clone());
        self.repo.replace_records(&records).await?;

        info!(id = %record.id, kind = %record.kind, amount = %record.amount, "recorded");
        Ok(record)
    }

    /// Records matching `filter`, newest first.
    pub async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<MonetaryRecord>, AppError> {
        let records = self.repo.records().await?;
        let mut matched: Vec<MonetaryRecord> = filter.apply(&records).cloned().collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!(count = matched.len(), "listed records");
        Ok(matched)
    }

    /// Income and expense totals of the records matching `filter`.
    pub async fn filtered_totals(&self, filter: &RecordFilter) -> Result<PeriodTotals, AppError> {
        let records = self.repo.records().await?;
        Ok(sum_period(filter.apply(&records)))
    }

    pub async fn delete_record(&self, id: RecordId) -> Result<MonetaryRecord, AppError> {
        let mut records = self.repo.records().await?;
        let position = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;
        let removed = records.remove(position);
        self.repo.replace_records(&records).await?;

        info!(id = %id, "deleted record");
        Ok(removed)
    }

    // ========================
    // Category operations
    // ========================

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.repo.categories().await?)
    }

    pub async fn add_category(&self, name: String) -> Result<Category, AppError> {
        let mut categories = self.repo.categories().await?;
        let name = name.trim().to_string();
        if categories
            .iter()
            .any(|c| c.name.to_lowercase() == name.to_lowercase())
        {
            return Err(AppError::CategoryAlreadyExists(name));
        }

        let category = Category::new(format!("cat-{}", uuid::Uuid::new_v4().simple()), name);
        categories.push(category.clone());
        self.repo.replace_categories(&categories).await?;

        info!(id = %category.id, name = %category.name, "added category");
        Ok(category)
    }

    /// Remove a category. Records that reference it show as uncategorized.
    pub async fn delete_category(&self, id: &str) -> Result<Category, AppError> {
        let mut categories = self.repo.categories().await?;
        let position = categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AppError::CategoryNotFound(id.to_string()))?;
        let removed = categories.remove(position);
        self.repo.replace_categories(&categories).await?;

        info!(id = %removed.id, "deleted category");
        Ok(removed)
    }

    // ========================
    // Recurring obligations
    // ========================

    pub async fn create_obligation(
        &self,
        kind: RecordKind,
        amount: Amount,
        category_id: CategoryId,
        label: String,
        frequency: Frequency,
        anchor_date: NaiveDate,
    ) -> Result<RecurringObligation, AppError> {
        Self::require_positive(amount)?;

        let obligation = RecurringObligation::new(
            kind,
            amount,
            category_id,
            label,
            frequency,
            anchor_date,
            self.today(),
        );

        let mut obligations = self.repo.obligations().await?;
        obligations.push(obligation.clone());
        self.repo.replace_obligations(&obligations).await?;

        info!(
            id = %obligation.id,
            frequency = %obligation.frequency,
            next_due = %obligation.next_due_date,
            "created recurring obligation"
        );
        Ok(obligation)
    }

    pub async fn edit_obligation(
        &self,
        id: ObligationId,
        update: ObligationUpdate,
    ) -> Result<RecurringObligation, AppError> {
        let today = self.today();
        let mut obligations = self.repo.obligations().await?;
        let obligation = obligations
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| AppError::ObligationNotFound(id.to_string()))?;

        if let Some(amount) = update.amount {
            Self::require_positive(amount)?;
            obligation.amount = amount;
        }
        if let Some(kind) = update.kind {
            obligation.kind = kind;
        }
        if let Some(category_id) = update.category_id {
            obligation.category_id = category_id;
        }
        if let Some(label) = update.label {
            obligation.label = label;
        }
        // Only a schedule change moves the due date; a fired occurrence stays paid.
        if update.frequency.is_some() || update.anchor_date.is_some() {
            let frequency = update.frequency.unwrap_or(obligation.frequency);
            let anchor_date = update.anchor_date.unwrap_or(obligation.anchor_date);
            obligation.reschedule(frequency, anchor_date, today);
        }

        let updated = obligation.clone();
        self.repo.replace_obligations(&obligations).await?;

        info!(id = %id, next_due = %updated.next_due_date, "edited recurring obligation");
        Ok(updated)
    }

    pub async fn delete_obligation(&self, id: ObligationId) -> Result<RecurringObligation, AppError> {
        let mut obligations = self.repo.obligations().await?;
        let position = obligations
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| AppError::ObligationNotFound(id.to_string()))?;
        let removed = obligations.remove(position);
        self.repo.replace_obligations(&obligations).await?;

        info!(id = %id, "deleted recurring obligation");
        Ok(removed)
    }

    /// All obligations, soonest due first.
    pub async fn list_obligations(&self) -> Result<Vec<RecurringObligation>, AppError> {
        let mut obligations = self.repo.obligations().await?;
        obligations.sort_by_key(|o| o.next_due_date);
        Ok(obligations)
    }

    /// Obligations whose label or category match `filter`.
    pub async fn find_obligations(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<RecurringObligation>, AppError> {
        Ok(self
            .list_obligations()
            .await?
            .into_iter()
            .filter(|o| filter.matches_obligation(o))
            .collect())
    }

    /// Every occurrence falling within `days` days from today, by date.
    pub async fn schedule_ahead(&self, days: u32) -> Result<Vec<ScheduledOccurrence>, AppError> {
        let today = self.today();
        let horizon = today
            .checked_add_days(Days::new(days.into()))
            .unwrap_or(NaiveDate::MAX);

        let mut schedule: Vec<ScheduledOccurrence> = Vec::new();
        for obligation in self.repo.obligations().await? {
            schedule.extend(
                occurrences(obligation.next_due_date, obligation.frequency)
                    .take_while(|date| *date <= horizon)
                    .map(|date| ScheduledOccurrence {
                        date,
                        obligation: obligation.clone(),
                    }),
            );
        }
        schedule.sort_by_key(|o| o.date);
        debug!(days, occurrences = schedule.len(), "computed schedule");
        Ok(schedule)
    }

    /// Obligations due today or earlier.
    pub async fn due_obligations(&self) -> Result<Vec<RecurringObligation>, AppError> {
        let today = self.today();
        Ok(self
            .list_obligations()
            .await?
            .into_iter()
            .filter(|o| o.is_due(today))
            .collect())
    }

    /// Obligations falling due within the configured window after today.
    pub async fn upcoming_obligations(&self) -> Result<Vec<RecurringObligation>, AppError> {
        let today = self.today();
        let window = self.repo.settings().await?.upcoming_window_days;
        Ok(self
            .list_obligations()
            .await?
            .into_iter()
            .filter(|o| o.is_upcoming(today, window))
            .collect())
    }

    /// Materialize one occurrence of an obligation as a record and advance its
    /// schedule past today.
    pub async fn fire_obligation(&self, id: ObligationId) -> Result<FiredObligation, AppError> {
        let mut obligations = self.repo.obligations().await?;
        let obligation = obligations
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| AppError::ObligationNotFound(id.to_string()))?;

        let was_due = obligation.next_due_date;
        let record = obligation.fire(self.clock.now());
        let obligation = obligation.clone();

        let mut records = self.repo.records().await?;
        records.push(record.clone());
        self.repo.replace_records(&records).await?;
        self.repo.replace_obligations(&obligations).await?;

        info!(
            id = %id,
            record = %record.id,
            was_due = %was_due,
            next_due = %obligation.next_due_date,
            "fired recurring obligation"
        );
        Ok(FiredObligation { record, obligation })
    }

    // ========================
    // Archiving
    // ========================

    fn require_ordered(range: DateRange) -> Result<(), AppError> {
        if range.is_empty() {
            return Err(AppError::InvalidRange {
                start: range.start.to_string(),
                end: range.end.to_string(),
            });
        }
        Ok(())
    }

    /// What archiving `range` would do, without changing anything.
    pub async fn preview_archive(&self, range: DateRange) -> Result<ArchiveSummary, AppError> {
        Self::require_ordered(range)?;
        let records = self.repo.records().await?;
        let categories = self.repo.categories().await?;
        Ok(summarize_for_archive(
            &records,
            range,
            &categories,
            end_of_day(range.end),
        ))
    }

    /// Replace every record in `range` with per-category summaries.
    pub async fn archive(&self, range: DateRange) -> Result<ArchiveOutcome, AppError> {
        Self::require_ordered(range)?;
        let records = self.repo.records().await?;
        let categories = self.repo.categories().await?;
        let summary = summarize_for_archive(&records, range, &categories, end_of_day(range.end));

        if summary.is_empty() {
            info!(%range, "nothing to archive");
            return Ok(ArchiveOutcome::NothingToArchive);
        }

        let archived_count = summary.consumed_ids.len();
        let mut kept: Vec<MonetaryRecord> = records
            .into_iter()
            .filter(|r| !summary.consumed_ids.contains(&r.id))
            .collect();
        kept.extend(summary.records.iter().cloned());
        self.repo.replace_records(&kept).await?;

        info!(
            %range,
            archived = archived_count,
            summaries = summary.records.len(),
            "archived records"
        );
        Ok(ArchiveOutcome::Archived {
            archived_count,
            summaries: summary.records,
        })
    }

    // ========================
    // Budgets
    // ========================

    /// Set the monthly budget of a category. A zero amount removes it.
    pub async fn set_budget(&self, category_id: CategoryId, amount: Amount) -> Result<(), AppError> {
        let mut budgets = self.repo.budgets().await?;
        budgets.retain(|b| b.category_id != category_id);
        if !amount.is_zero() {
            budgets.push(Budget::new(category_id.clone(), amount));
        }
        self.repo.replace_budgets(&budgets).await?;

        info!(category = %category_id, amount = %amount, "set budget");
        Ok(())
    }

    pub async fn list_budgets(&self) -> Result<Vec<Budget>, AppError> {
        Ok(self.repo.budgets().await?)
    }

    /// Progress of every budget over the current calendar month.
    pub async fn budget_overview(&self) -> Result<BudgetOverview, AppError> {
        let period = DateRange::month_of(self.today());
        let settings = self.repo.settings().await?;
        let budgets = self.repo.budgets().await?;
        let records = self.repo.records().await?;
        let categories = self.repo.categories().await?;

        let entries = budget_progress(
            &budgets,
            &records,
            period,
            &categories,
            settings.budget_alert_percent,
        );
        let (total_budgeted, total_spent) = budget_totals(&entries);

        for entry in entries.iter().filter(|e| e.needs_attention()) {
            warn!(
                category = %entry.category_name,
                percent = entry.percent.round(),
                level = %entry.level,
                "budget threshold reached"
            );
        }

        Ok(BudgetOverview {
            period,
            entries,
            total_budgeted,
            total_spent,
        })
    }

    /// Budgets at or above the alert threshold this month.
    pub async fn budget_alerts(&self) -> Result<Vec<BudgetProgress>, AppError> {
        Ok(self
            .budget_overview()
            .await?
            .entries
            .into_iter()
            .filter(BudgetProgress::needs_attention)
            .collect())
    }

    // ========================
    // Reports
    // ========================

    /// Summary, expense breakdown and top expenses for the month containing `day`.
    pub async fn month_report(&self, day: NaiveDate) -> Result<MonthReport, AppError> {
        let period = DateRange::month_of(day);
        let records = self.repo.records().await?;
        let categories = self.repo.categories().await?;
        let settings = self.repo.settings().await?;

        Ok(MonthReport {
            summary: monthly_summary(&records, period, settings.monthly_income),
            expense_breakdown: expense_breakdown(&records, period, &categories),
            top_expenses: top_expenses(&records, period, TOP_EXPENSES),
        })
    }

    /// Income and expenses of the last `months` months, oldest first.
    pub async fn history(&self, months: u32) -> Result<Vec<MonthTotals>, AppError> {
        let records = self.repo.records().await?;
        Ok(monthly_history(&records, self.today(), months))
    }

    // ========================
    // Debts
    // ========================

    pub async fn add_debt(
        &self,
        name: String,
        total_amount: Amount,
        monthly_payment: Amount,
        next_payment_date: NaiveDate,
    ) -> Result<Debt, AppError> {
        Self::require_positive(total_amount)?;

        let debt = Debt::new(name, total_amount, monthly_payment, next_payment_date);
        let mut debts = self.repo.debts().await?;
        debts.push(debt.clone());
        self.repo.replace_debts(&debts).await?;

        info!(id = %debt.id, name = %debt.name, "added debt");
        Ok(debt)
    }

    pub async fn list_debts(&self) -> Result<Vec<Debt>, AppError> {
        let mut debts = self.repo.debts().await?;
        debts.sort_by_key(|d| d.next_payment_date);
        Ok(debts)
    }

    /// Pay towards a debt (default: its monthly payment), optionally booking
    /// the payment as an expense in the debt payments category.
    pub async fn pay_debt(
        &self,
        id: DebtId,
        amount: Option<Amount>,
        book_expense: bool,
    ) -> Result<DebtPayment, AppError> {
        let mut debts = self.repo.debts().await?;
        let debt = debts
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::DebtNotFound(id.to_string()))?;

        let amount = amount.unwrap_or(debt.monthly_payment);
        Self::require_positive(amount)?;

        let record = if book_expense {
            let categories = self.repo.categories().await?;
            if categories.category_name(DEBT_PAYMENTS_CATEGORY).is_none() {
                return Err(AppError::CategoryNotFound(DEBT_PAYMENTS_CATEGORY.to_string()));
            }
            Some(MonetaryRecord::new(
                RecordKind::Expense,
                amount,
                DEBT_PAYMENTS_CATEGORY,
                self.clock.now(),
                format!("Debt payment: {}", debt.name),
            ))
        } else {
            None
        };

        debt.record_payment(amount);
        let debt = debt.clone();
        self.repo.replace_debts(&debts).await?;

        if let Some(record) = &record {
            let mut records = self.repo.records().await?;
            records.push(record.clone());
            self.repo.replace_records(&records).await?;
        }

        info!(
            id = %id,
            amount = %amount,
            remaining = %debt.remaining_amount,
            next_payment = %debt.next_payment_date,
            "paid debt"
        );
        Ok(DebtPayment { debt, record })
    }

    // ========================
    // Goals
    // ========================

    pub async fn add_goal(&self, name: String, target_amount: Amount) -> Result<Goal, AppError> {
        Self::require_positive(target_amount)?;

        let goal = Goal::new(name, target_amount);
        let mut goals = self.repo.goals().await?;
        goals.push(goal.clone());
        self.repo.replace_goals(&goals).await?;

        info!(id = %goal.id, name = %goal.name, "added goal");
        Ok(goal)
    }

    pub async fn list_goals(&self) -> Result<Vec<Goal>, AppError> {
        Ok(self.repo.goals().await?)
    }

    /// Add funds to a goal, optionally booking them as a savings expense.
    pub async fn fund_goal(
        &self,
        id: GoalId,
        amount: Amount,
        book_expense: bool,
    ) -> Result<GoalContribution, AppError> {
        Self::require_positive(amount)?;

        let mut goals = self.repo.goals().await?;
        let goal = goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| AppError::GoalNotFound(id.to_string()))?;

        let record = if book_expense {
            let categories = self.repo.categories().await?;
            if categories.category_name(SAVINGS_CATEGORY).is_none() {
                return Err(AppError::CategoryNotFound(SAVINGS_CATEGORY.to_string()));
            }
            Some(MonetaryRecord::new(
                RecordKind::Expense,
                amount,
                SAVINGS_CATEGORY,
                self.clock.now(),
                format!("Contribution to goal: {}", goal.name),
            ))
        } else {
            None
        };

        goal.contribute(amount);
        let goal = goal.clone();
        self.repo.replace_goals(&goals).await?;

        if let Some(record) = &record {
            let mut records = self.repo.records().await?;
            records.push(record.clone());
            self.repo.replace_records(&records).await?;
        }

        info!(id = %id, amount = %amount, "funded goal");
        Ok(GoalContribution { goal, record })
    }

    // ========================
    // Settings
    // ========================

    pub async fn settings(&self) -> Result<Settings, AppError> {
        Ok(self.repo.settings().await?)
    }

    pub async fn update_setting(&self, key: &str, value: &str) -> Result<Settings, AppError> {
        let mut settings = self.repo.settings().await?;
        settings.set(key, value)?;
        self.repo.save_settings(&settings).await?;

        info!(key, value, "updated setting");
        Ok(settings)
    }

    // ========================
    // Suggestions
    // ========================

    /// Ask the suggestion service for monthly budgets. Its errors are passed
    /// through unchanged.
    pub async fn suggest_budgets<A: SuggestionService>(
        &self,
        suggestions: &A,
    ) -> Result<Vec<BudgetSuggestion>, AppError> {
        let records = self.repo.records().await?;
        let settings = self.repo.settings().await?;
        ensure_enough_expenses(&records, settings.min_expenses_for_suggestions)?;

        let expenses: Vec<MonetaryRecord> =
            records.into_iter().filter(MonetaryRecord::is_expense).collect();
        let categories = self.repo.categories().await?;
        Ok(suggestions.suggest_budgets(&expenses, &categories).await?)
    }
}
