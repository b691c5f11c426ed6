use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::account::AccountId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

/// Category reference carried on a product row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub account_id: AccountId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Normal,
    Overstocked,
}

impl StockStatus {
    pub const ALL: [StockStatus; 4] = [
        StockStatus::Normal,
        StockStatus::LowStock,
        StockStatus::OutOfStock,
        StockStatus::Overstocked,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::OutOfStock => "Out of Stock",
            Self::LowStock => "Low Stock",
            Self::Normal => "Normal",
            Self::Overstocked => "Overstocked",
        }
    }

    /// Classifies a quantity against its reorder thresholds. A maximum of zero
    /// means the product has no upper bound.
    pub fn classify(quantity: i64, minimum_stock: i64, maximum_stock: i64) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity <= minimum_stock {
            Self::LowStock
        } else if maximum_stock > 0 && quantity > maximum_stock {
            Self::Overstocked
        } else {
            Self::Normal
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub account_id: AccountId,
    pub name: String,
    pub sku: String,
    pub category: Option<CategoryRef>,
    pub description: String,
    pub price: Decimal,
    pub cost: Decimal,
    pub quantity: i64,
    pub minimum_stock: i64,
    pub maximum_stock: i64,
    pub location: String,
    pub supplier: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|category| category.name.as_str())
    }

    /// Margin over unit cost, `(price - cost) / cost * 100`. Zero when the
    /// product has no recorded cost.
    pub fn profit_margin(&self) -> Decimal {
        if self.cost.is_zero() {
            return Decimal::ZERO;
        }
        (self.price - self.cost) / self.cost * Decimal::ONE_HUNDRED
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.quantity, self.minimum_stock, self.maximum_stock)
    }

    pub fn total_value(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    pub fn total_cost(&self) -> Decimal {
        self.cost * Decimal::from(self.quantity)
    }

    pub fn potential_profit(&self) -> Decimal {
        self.total_value() - self.total_cost()
    }

    /// Case-insensitive match against name, description, category name, and SKU.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.sku.to_lowercase().contains(&needle)
            || self.category_name().is_some_and(|name| name.to_lowercase().contains(&needle))
    }
}
