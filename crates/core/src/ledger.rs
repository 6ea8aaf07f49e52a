//! The Ledger: the shopper's saved-items list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// A product saved to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerItem {
    pub id: ProductId,
    pub handle: String,
    pub name: String,
    /// Price shown when the item was saved, in major currency units.
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Result of [`Ledger::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

impl Toggled {
    /// Whether the item is saved after the toggle.
    #[must_use]
    pub const fn is_saved(self) -> bool {
        matches!(self, Self::Added)
    }
}

/// Saved items, in the order they were saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    items: Vec<LedgerItem>,
}

impl Ledger {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Save the item if absent, otherwise remove it.
    pub fn toggle(&mut self, item: LedgerItem) -> Toggled {
        if self.contains(&item.id) {
            self.items.retain(|saved| saved.id != item.id);
            Toggled::Removed
        } else {
            self.items.push(item);
            Toggled::Added
        }
    }

    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|saved| &saved.id != id);
        self.items.len() != before
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|saved| &saved.id == id)
    }

    #[must_use]
    pub fn items(&self) -> &[LedgerItem] {
        &self.items
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
