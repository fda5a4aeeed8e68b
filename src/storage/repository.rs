use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::Settings;
use crate::domain::{
    Budget, Category, Debt, Goal, MonetaryRecord, RecurringObligation, default_categories,
};

use super::KeyValueStore;

pub const RECORDS_KEY: &str = "hisab_transactions";
pub const CATEGORIES_KEY: &str = "hisab_categories";
pub const OBLIGATIONS_KEY: &str = "hisab_recurring";
pub const BUDGETS_KEY: &str = "hisab_budgets";
pub const DEBTS_KEY: &str = "hisab_debts";
pub const GOALS_KEY: &str = "hisab_goals";
pub const SETTINGS_KEY: &str = "hisab_settings";

/// Typed get-all / replace-all access to each collection. Collections are
/// stored as JSON documents, one per key.
pub struct Repository<S> {
    store: S,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key).await? {
            Some(json) => {
                let value = serde_json::from_str(&json)
                    .with_context(|| format!("Corrupt data under key '{}'", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize '{}'", key))?;
        self.store.set(key, &json).await
    }

    // ========================
    // Records
    // ========================

    pub async fn records(&self) -> Result<Vec<MonetaryRecord>> {
        Ok(self.load(RECORDS_KEY).await?.unwrap_or_default())
    }

    pub async fn replace_records(&self, records: &[MonetaryRecord]) -> Result<()> {
        self.save(RECORDS_KEY, records).await
    }

    // ========================
    // Categories
    // ========================

    /// Stored categories, or the default set when none were ever saved.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self
            .load(CATEGORIES_KEY)
            .await?
            .unwrap_or_else(default_categories))
    }

    pub async fn replace_categories(&self, categories: &[Category]) -> Result<()> {
        self.save(CATEGORIES_KEY, categories).await
    }

    // ========================
    // Recurring obligations
    // ========================

    pub async fn obligations(&self) -> Result<Vec<RecurringObligation>> {
        Ok(self.load(OBLIGATIONS_KEY).await?.unwrap_or_default())
    }

    pub async fn replace_obligations(&self, obligations: &[RecurringObligation]) -> Result<()> {
        self.save(OBLIGATIONS_KEY, obligations).await
    }

    // ========================
    // Budgets, debts, goals
    // ========================

    pub async fn budgets(&self) -> Result<Vec<Budget>> {
        Ok(self.load(BUDGETS_KEY).await?.unwrap_or_default())
    }

    pub async fn replace_budgets(&self, budgets: &[Budget]) -> Result<()> {
        self.save(BUDGETS_KEY, budgets).await
    }

    pub async fn debts(&self) -> Result<Vec<Debt>> {
        Ok(self.load(DEBTS_KEY).await?.unwrap_or_default())
    }

    pub async fn replace_debts(&self, debts: &[Debt]) -> Result<()> {
        self.save(DEBTS_KEY, debts).await
    }

    pub async fn goals(&self) -> Result<Vec<Goal>> {
        Ok(self.load(GOALS_KEY).await?.unwrap_or_default())
    }

    pub async fn replace_goals(&self, goals: &[Goal]) -> Result<()> {
        self.save(GOALS_KEY, goals).await
    }

    // ========================
    // Settings
    // ========================

    pub async fn settings(&self) -> Result<Settings> {
        Ok(self.load(SETTINGS_KEY).await?.unwrap_or_default())
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.save(SETTINGS_KEY, settings).await
    }

    /// Drop every stored collection.
    pub async fn clear(&self) -> Result<()> {
        for key in [
            RECORDS_KEY,
            CATEGORIES_KEY,
            OBLIGATIONS_KEY,
            BUDGETS_KEY,
            DEBTS_KEY,
            GOALS_KEY,
            SETTINGS_KEY,
        ] {
            self.store.remove(key).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::Amount;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_missing_keys_yield_defaults() -> Result<()> {
        let repo = Repository::new(MemoryStore::new());

        assert!(repo.records().await?.is_empty());
        assert_eq!(repo.categories().await?, default_categories());
        assert_eq!(repo.settings().await?, Settings::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_all_round_trip() -> Result<()> {
        let repo = Repository::new(MemoryStore::new());
        let records = vec![
            MonetaryRecord::expense(Amount::from_cents(1_250), "cat-1", Utc::now())
                .with_label("Coffee"),
        ];

        repo.replace_records(&records).await?;
        assert_eq!(repo.records().await?, records);

        repo.replace_records(&[]).await?;
        assert!(repo.records().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_value_is_reported() -> Result<()> {
        let store = MemoryStore::new();
        store
            .set(OBLIGATIONS_KEY, r#"[{"frequency": "fortnightly"}]"#)
            .await?;
        let repo = Repository::new(store);

        let err = repo.obligations().await.unwrap_err();
        assert!(err.to_string().contains(OBLIGATIONS_KEY));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear() -> Result<()> {
        let repo = Repository::new(MemoryStore::new());
        repo.replace_budgets(&[Budget::new("cat-1", Amount::from_cents(100))])
            .await?;
        repo.clear().await?;
        assert!(repo.store().keys().await?.is_empty());
        Ok(())
    }
}
