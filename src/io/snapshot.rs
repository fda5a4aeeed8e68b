use std::collections::HashSet;
use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::FinanceService;
use crate::config::Settings;
use crate::domain::{Budget, Category, Clock, Debt, Goal, MonetaryRecord, RecurringObligation};
use crate::storage::KeyValueStore;

/// Bumped whenever the snapshot layout changes incompatibly.
pub const SNAPSHOT_FORMAT: u32 = 1;

/// Every stored collection, as written by `export` and read by `import`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub format: u32,
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub records: Vec<MonetaryRecord>,
    pub categories: Vec<Category>,
    pub obligations: Vec<RecurringObligation>,
    pub budgets: Vec<Budget>,
    pub debts: Vec<Debt>,
    pub goals: Vec<Goal>,
    pub settings: Settings,
}

impl Snapshot {
    pub fn item_count(&self) -> usize {
        self.records.len()
            + self.categories.len()
            + self.obligations.len()
            + self.budgets.len()
            + self.debts.len()
            + self.goals.len()
    }
}

/// Options for import operations
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Parse and count, write nothing.
    pub dry_run: bool,
    /// Keep existing data and only add records and obligations whose ids are
    /// new. Without it the snapshot replaces everything.
    pub merge: bool,
}

/// Result of an import operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
}

pub struct Exporter<'a, S, C> {
    service: &'a FinanceService<S, C>,
}

impl<'a, S: KeyValueStore, C: Clock> Exporter<'a, S, C> {
    pub fn new(service: &'a FinanceService<S, C>) -> Self {
        Self { service }
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        let repo = self.service.repository();
        Ok(Snapshot {
            format: SNAPSHOT_FORMAT,
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: self.service.now(),
            records: repo.records().await?,
            categories: repo.categories().await?,
            obligations: repo.obligations().await?,
            budgets: repo.budgets().await?,
            debts: repo.debts().await?,
            goals: repo.goals().await?,
            settings: repo.settings().await?,
        })
    }

    /// Write the full data set as pretty-printed JSON.
    pub async fn export_json<W: Write>(&self, mut writer: W) -> Result<Snapshot> {
        let snapshot = self.snapshot().await?;

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        info!(items = snapshot.item_count(), "exported snapshot");
        Ok(snapshot)
    }
}

pub struct Importer<'a, S, C> {
    service: &'a FinanceService<S, C>,
}

impl<'a, S: KeyValueStore, C: Clock> Importer<'a, S, C> {
    pub fn new(service: &'a FinanceService<S, C>) -> Self {
        Self { service }
    }

    pub async fn import_json<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let snapshot: Snapshot =
            serde_json::from_reader(reader).context("Failed to parse snapshot JSON")?;
        if snapshot.format > SNAPSHOT_FORMAT {
            bail!(
                "Snapshot format {} is newer than supported format {}",
                snapshot.format,
                SNAPSHOT_FORMAT
            );
        }

        if options.merge {
            self.merge(snapshot, options.dry_run).await
        } else {
            self.replace(snapshot, options.dry_run).await
        }
    }

    async fn replace(&self, snapshot: Snapshot, dry_run: bool) -> Result<ImportResult> {
        let imported = snapshot.item_count();
        if dry_run {
            return Ok(ImportResult {
                imported,
                skipped: 0,
            });
        }

        let repo = self.service.repository();
        repo.clear().await?;
        repo.replace_records(&snapshot.records).await?;
        repo.replace_categories(&snapshot.categories).await?;
        repo.replace_obligations(&snapshot.obligations).await?;
        repo.replace_budgets(&snapshot.budgets).await?;
        repo.replace_debts(&snapshot.debts).await?;
        repo.replace_goals(&snapshot.goals).await?;
        repo.save_settings(&snapshot.settings).await?;

        info!(imported, "replaced data from snapshot");
        Ok(ImportResult {
            imported,
            skipped: 0,
        })
    }

    async fn merge(&self, snapshot: Snapshot, dry_run: bool) -> Result<ImportResult> {
        let repo = self.service.repository();
        let mut records = repo.records().await?;
        let mut obligations = repo.obligations().await?;

        let known_records: HashSet<_> = records.iter().map(|r| r.id).collect();
        let known_obligations: HashSet<_> = obligations.iter().map(|o| o.id).collect();
        let total = snapshot.records.len() + snapshot.obligations.len();

        let new_records: Vec<MonetaryRecord> = snapshot
            .records
            .into_iter()
            .filter(|r| !known_records.contains(&r.id))
            .collect();
        let new_obligations: Vec<RecurringObligation> = snapshot
            .obligations
            .into_iter()
            .filter(|o| !known_obligations.contains(&o.id))
            .collect();

        let imported = new_records.len() + new_obligations.len();
        let result = ImportResult {
            imported,
            skipped: total - imported,
        };
        if dry_run {
            return Ok(result);
        }

        records.extend(new_records);
        obligations.extend(new_obligations);
        repo.replace_records(&records).await?;
        repo.replace_obligations(&obligations).await?;

        info!(imported, skipped = result.skipped, "merged snapshot");
        Ok(result)
    }
}
