use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::warn;

use stocktalk_core::currency::format_percent;
use stocktalk_core::domain::product::{Category, Product, StockStatus};
use stocktalk_db::InventoryRepository;

use super::{date, degrade, SectionBuilder, SectionKind, SectionRequest, NO_PRODUCTS};
use crate::fallback::FallbackProvider;

pub const CATEGORY_NOTE: &str = "Note: Unable to retrieve category information.";

const SAMPLE_PRODUCTS: usize = 5;
const TOP_CATEGORIES: usize = 5;

/// Baseline counts, stock buckets, and financial totals. Anchors every context.
pub struct InventorySummaryBuilder {
    inventory: Arc<dyn InventoryRepository>,
    fallback: Arc<dyn FallbackProvider>,
}

impl InventorySummaryBuilder {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        fallback: Arc<dyn FallbackProvider>,
    ) -> Self {
        Self { inventory, fallback }
    }
}

#[async_trait]
impl SectionBuilder for InventorySummaryBuilder {
    fn kind(&self) -> SectionKind {
        SectionKind::Summary
    }

    async fn build(&self, request: &SectionRequest) -> String {
        let products = match self.inventory.list_products(&request.account, None, None).await {
            Ok(products) => products,
            Err(error) => return degrade(self.fallback.as_ref(), self.kind(), request, &error),
        };
        if products.is_empty() {
            return NO_PRODUCTS.to_string();
        }

        let categories = self.inventory.list_categories(&request.account).await;
        if let Err(error) = &categories {
            warn!(
                event_name = "context.summary.categories_unavailable",
                account_id = %request.account,
                error = %error,
                "category read failed, summary continues without rankings"
            );
        }

        render(&products, categories.ok().as_deref(), request)
    }
}

fn render(
    products: &[Product],
    categories: Option<&[Category]>,
    request: &SectionRequest,
) -> String {
    let total_categories = products
        .iter()
        .filter_map(|product| product.category.as_ref().map(|category| &category.id.0))
        .collect::<BTreeSet<_>>()
        .len();
    let total_stock: i64 = products.iter().map(|product| product.quantity).sum();
    let total_value: Decimal = products.iter().map(Product::total_value).sum();
    let total_cost: Decimal = products.iter().map(Product::total_cost).sum();
    let average_margin = products.iter().map(Product::profit_margin).sum::<Decimal>()
        / Decimal::from(products.len() as u64);

    let mut lines = vec![
        "Inventory Summary:".to_string(),
        format!("Total Products: {}", products.len()),
        format!("Total Categories: {total_categories}"),
        format!("Total Items in Stock: {total_stock}"),
        String::new(),
        "Stock Status:".to_string(),
    ];
    for status in StockStatus::ALL {
        let count = products.iter().filter(|product| product.stock_status() == status).count();
        let label = match status {
            StockStatus::Normal => "Normal Stock Items",
            StockStatus::LowStock => "Low Stock Items",
            StockStatus::OutOfStock => "Out of Stock Items",
            StockStatus::Overstocked => "Overstocked Items",
        };
        lines.push(format!("{label}: {count}"));
    }

    lines.push(String::new());
    lines.push("Financial Metrics:".to_string());
    lines.push(format!("Total Inventory Value: {}", request.money(total_value)));
    lines.push(format!("Total Inventory Cost: {}", request.money(total_cost)));
    lines.push(format!("Total Potential Profit: {}", request.money(total_value - total_cost)));
    lines.push(format!("Average Profit Margin: {}", format_percent(average_margin)));

    // Products arrive oldest first.
    if let (Some(oldest), Some(newest)) = (products.first(), products.last()) {
        lines.push(String::new());
        lines.push("Inventory Timeline:".to_string());
        lines.push(format!("Oldest Product: {} (Added: {})", oldest.name, date(oldest.created_at)));
        lines.push(format!("Newest Product: {} (Added: {})", newest.name, date(newest.created_at)));
    }

    lines.push(String::new());
    lines.push("Sample Products:".to_string());
    for product in products.iter().take(SAMPLE_PRODUCTS) {
        lines.push(format!(
            "- {}: {} in stock, {} each, total value: {}",
            product.name,
            product.quantity,
            request.money(product.price),
            request.money(product.total_value())
        ));
    }

    match categories {
        Some(categories) => {
            let ranked = rank_categories(products, categories);
            if !ranked.is_empty() {
                lines.push(String::new());
                lines.push("Categories:".to_string());
                for entry in ranked.iter().take(TOP_CATEGORIES) {
                    lines.push(format!(
                        "- {}: {} products, {} items, value: {}",
                        entry.name,
                        entry.products,
                        entry.items,
                        request.money(entry.value)
                    ));
                }
            }
        }
        None => {
            lines.push(String::new());
            lines.push(CATEGORY_NOTE.to_string());
        }
    }

    lines.join("\n")
}

struct CategoryTotals<'a> {
    name: &'a str,
    products: usize,
    items: i64,
    value: Decimal,
}

/// Categories that hold at least one product, by product count then name.
fn rank_categories<'a>(
    products: &[Product],
    categories: &'a [Category],
) -> Vec<CategoryTotals<'a>> {
    let mut by_id: HashMap<&str, (usize, i64, Decimal)> = HashMap::new();
    for product in products {
        if let Some(category) = &product.category {
            let entry = by_id.entry(category.id.0.as_str()).or_default();
            entry.0 += 1;
            entry.1 += product.quantity;
            entry.2 += product.total_value();
        }
    }

    let mut ranked: Vec<CategoryTotals<'a>> = categories
        .iter()
        .filter_map(|category| {
            by_id.get(category.id.0.as_str()).map(|(count, items, value)| CategoryTotals {
                name: category.name.as_str(),
                products: *count,
                items: *items,
                value: *value,
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.products.cmp(&a.products).then_with(|| a.name.cmp(b.name)));
    ranked
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stocktalk_db::repositories::{InMemoryInventoryRepository, InventoryDataKind};

    use super::{InventorySummaryBuilder, CATEGORY_NOTE};
    use crate::sections::{SectionBuilder, NO_PRODUCTS};
    use crate::test_support::{fallback, request, two_product_store};

    #[tokio::test]
    async fn empty_inventory_yields_only_the_no_products_message() {
        let repo = Arc::new(InMemoryInventoryRepository::default());
        // A category outage would surface as a note if categories were read.
        repo.set_unavailable(InventoryDataKind::Categories, true).await;
        let builder = InventorySummaryBuilder::new(repo, fallback());

        assert_eq!(builder.build(&request()).await, NO_PRODUCTS);
    }

    #[tokio::test]
    async fn counts_out_of_stock_and_total_products() {
        let builder = InventorySummaryBuilder::new(two_product_store().await, fallback());
        let text = builder.build(&request()).await;

        assert!(text.contains("Total Products: 2"), "{text}");
        assert!(text.contains("Out of Stock Items: 1"), "{text}");
        assert!(text.contains("Total Items in Stock: 45"), "{text}");
        assert!(text.contains("Total Categories: 1"), "empty categories are not counted: {text}");
        assert!(text.contains("Total Inventory Value: $2699.55"), "{text}");
        assert!(text.contains("Oldest Product: Gaming Mouse"), "{text}");
        assert!(text.contains("Newest Product: Keyboard"), "{text}");
        assert!(text.contains("- Gaming Peripherals: 2 products, 45 items"), "{text}");
        assert!(!text.contains("Networking:"), "empty categories are not ranked: {text}");
    }

    #[tokio::test]
    async fn category_failure_keeps_summary_and_appends_note() {
        let repo = two_product_store().await;
        repo.set_unavailable(InventoryDataKind::Categories, true).await;
        let builder = InventorySummaryBuilder::new(repo, fallback());

        let text = builder.build(&request()).await;
        assert!(text.starts_with("Inventory Summary:"));
        assert!(text.contains("Total Categories: 1"), "{text}");
        assert!(text.ends_with(CATEGORY_NOTE), "{text}");
    }

    #[tokio::test]
    async fn category_count_is_the_same_with_or_without_category_read() {
        let repo = two_product_store().await;
        let builder = InventorySummaryBuilder::new(repo.clone(), fallback());
        let live = builder.build(&request()).await;

        repo.set_unavailable(InventoryDataKind::Categories, true).await;
        let degraded = builder.build(&request()).await;

        let count = |text: &str| {
            text.lines().find(|line| line.starts_with("Total Categories:")).map(str::to_string)
        };
        assert_eq!(count(&live), Some("Total Categories: 1".to_string()));
        assert_eq!(count(&live), count(&degraded));
    }

    #[tokio::test]
    async fn product_outage_serves_fallback_summary() {
        let repo = two_product_store().await;
        repo.set_unavailable(InventoryDataKind::Products, true).await;
        let builder = InventorySummaryBuilder::new(repo, fallback());

        let text = builder.build(&request()).await;
        assert!(text.starts_with("Inventory Summary (SAMPLE DATA):"), "{text}");
    }
}
