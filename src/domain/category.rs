use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub type CategoryId = String;

/// Display name used whenever a category id does not resolve.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Id of the category debt payments are booked against.
pub const DEBT_PAYMENTS_CATEGORY: &str = "cat-9";

/// Id of the category goal contributions are booked against.
pub const SAVINGS_CATEGORY: &str = "cat-10";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Categories seeded on first use.
pub fn default_categories() -> Vec<Category> {
    [
        ("cat-1", "Food & Drink"),
        ("cat-2", "Transport"),
        ("cat-3", "Housing & Bills"),
        ("cat-4", "Shopping"),
        ("cat-5", "Entertainment"),
        ("cat-6", "Health"),
        ("cat-7", "Salary"),
        (DEBT_PAYMENTS_CATEGORY, "Debt Payments"),
        (SAVINGS_CATEGORY, "Savings & Investments"),
        ("cat-8", "Other"),
    ]
    .into_iter()
    .map(|(id, name)| Category::new(id, name))
    .collect()
}

/// Resolves category ids to display names. A missing id is never an error.
pub trait CategoryLookup {
    fn category_name(&self, id: &str) -> Option<&str>;

    fn display_name(&self, id: &str) -> &str {
        self.category_name(id).unwrap_or(UNCATEGORIZED)
    }
}

impl CategoryLookup for HashMap<CategoryId, String> {
    fn category_name(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

impl CategoryLookup for [Category] {
    fn category_name(&self, id: &str) -> Option<&str> {
        self.iter().find(|c| c.id == id).map(|c| c.name.as_str())
    }
}

impl CategoryLookup for Vec<Category> {
    fn category_name(&self, id: &str) -> Option<&str> {
        self.as_slice().category_name(id)
    }
}
