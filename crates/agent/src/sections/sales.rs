use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::warn;

use stocktalk_core::currency::format_share;
use stocktalk_core::domain::sale::{payment_method_label, DateRange, Sale};
use stocktalk_db::InventoryRepository;

use super::{date, degrade, SectionBuilder, SectionKind, SectionRequest};
use crate::fallback::FallbackProvider;

pub const NO_SALES: &str = "There are no sales records for your account.";
pub const WINDOW_NOTE: &str = "Note: Unable to retrieve time-based sales figures.";

const TOP_PRODUCTS: usize = 5;
const TOP_CATEGORIES: usize = 5;

/// Sales totals, rolling windows, payment mix, and product and category
/// rankings.
pub struct SalesAnalyticsBuilder {
    inventory: Arc<dyn InventoryRepository>,
    fallback: Arc<dyn FallbackProvider>,
}

impl SalesAnalyticsBuilder {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        fallback: Arc<dyn FallbackProvider>,
    ) -> Self {
        Self { inventory, fallback }
    }

    /// Count and revenue for each rolling window, or `None` if any window read
    /// fails.
    async fn windows(&self, request: &SectionRequest) -> Option<Vec<(&'static str, Tally)>> {
        let windows = [
            ("Today", DateRange::today(request.now)),
            ("Last 7 Days", DateRange::trailing_days(request.now, 7)),
            ("Last 30 Days", DateRange::trailing_days(request.now, 30)),
        ];

        let mut tallies = Vec::with_capacity(windows.len());
        for (label, range) in windows {
            match self.inventory.list_sales(&request.account, Some(range)).await {
                Ok(sales) => tallies.push((label, Tally::of(&sales))),
                Err(error) => {
                    warn!(
                        event_name = "context.sales.window_unavailable",
                        account_id = %request.account,
                        window = label,
                        error = %error,
                        "sales window read failed"
                    );
                    return None;
                }
            }
        }
        Some(tallies)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Tally {
    count: usize,
    revenue: Decimal,
}

impl Tally {
    fn of(sales: &[Sale]) -> Self {
        Self { count: sales.len(), revenue: sales.iter().map(|sale| sale.total_amount).sum() }
    }
}

/// Per-product or per-category totals. `sales` counts sale lines, `units`
/// counts items sold.
#[derive(Debug, Default)]
struct Ranked {
    name: String,
    sales: usize,
    units: i64,
    revenue: Decimal,
}

#[async_trait]
impl SectionBuilder for SalesAnalyticsBuilder {
    fn kind(&self) -> SectionKind {
        SectionKind::Sales
    }

    async fn build(&self, request: &SectionRequest) -> String {
        let sales = match self.inventory.list_sales(&request.account, None).await {
            Ok(sales) => sales,
            Err(error) => return degrade(self.fallback.as_ref(), self.kind(), request, &error),
        };
        if sales.is_empty() {
            return NO_SALES.to_string();
        }

        let overall = Tally::of(&sales);
        let average = overall.revenue / Decimal::from(overall.count as u64);
        let mut lines = vec![
            "Sales Analytics:".to_string(),
            format!("Total Sales: {}", overall.count),
            format!("Total Revenue: {}", request.money(overall.revenue)),
            format!("Average Sale Value: {}", request.money(average)),
            String::new(),
            "Time-Based Analytics:".to_string(),
        ];

        let windows = self.windows(request).await;
        if let Some(windows) = &windows {
            for (label, tally) in windows {
                lines.push(format!(
                    "{label}: {} sales, {} revenue",
                    tally.count,
                    request.money(tally.revenue)
                ));
            }
        }
        // Sales arrive oldest first.
        if let (Some(first), Some(latest)) = (sales.first(), sales.last()) {
            lines.push(format!("First Sale: {}", date(first.sale_date)));
            lines.push(format!("Latest Sale: {}", date(latest.sale_date)));
        }

        lines.push(String::new());
        lines.push("Payment Methods:".to_string());
        for (label, count) in payment_mix(&sales) {
            lines.push(format!(
                "- {label}: {count} sales ({})",
                format_share(count, overall.count)
            ));
        }

        let mut products = product_totals(&sales);
        if !products.is_empty() {
            products.sort_by(|a, b| {
                b.sales
                    .cmp(&a.sales)
                    .then_with(|| b.units.cmp(&a.units))
                    .then_with(|| a.name.cmp(&b.name))
            });
            lines.push(String::new());
            lines.push("Top Selling Products:".to_string());
            for entry in products.iter().take(TOP_PRODUCTS) {
                lines.push(format!(
                    "- {}: {} sales, {} units, {} revenue",
                    entry.name,
                    entry.sales,
                    entry.units,
                    request.money(entry.revenue)
                ));
            }

            products.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
            lines.push(String::new());
            lines.push("Top Products by Revenue:".to_string());
            for entry in products.iter().take(TOP_PRODUCTS) {
                lines.push(format!(
                    "- {}: {} revenue, {} sales",
                    entry.name,
                    request.money(entry.revenue),
                    entry.sales
                ));
            }
        }

        let categories = category_totals(&sales);
        if !categories.is_empty() {
            lines.push(String::new());
            lines.push("Top Categories by Revenue:".to_string());
            for entry in categories.iter().take(TOP_CATEGORIES) {
                lines.push(format!(
                    "- {}: {} revenue, {} sales",
                    entry.name,
                    request.money(entry.revenue),
                    entry.sales
                ));
            }
        }

        if windows.is_none() {
            lines.push(String::new());
            lines.push(WINDOW_NOTE.to_string());
        }

        lines.join("\n")
    }
}

fn payment_mix(sales: &[Sale]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for sale in sales {
        *counts.entry(payment_method_label(&sale.payment_method)).or_default() += 1;
    }
    let mut mix: Vec<(String, usize)> = counts.into_iter().collect();
    mix.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    mix
}

/// Only products with at least one sale line appear.
fn product_totals(sales: &[Sale]) -> Vec<Ranked> {
    let mut by_product: HashMap<&str, Ranked> = HashMap::new();
    for item in sales.iter().flat_map(|sale| &sale.items) {
        let entry = by_product.entry(item.product_id.0.as_str()).or_insert_with(|| Ranked {
            name: item.product_name.clone(),
            ..Ranked::default()
        });
        entry.sales += 1;
        entry.units += item.quantity;
        entry.revenue += item.line_total();
    }
    by_product.into_values().collect()
}

/// Categorized revenue, highest first. Categories that earned nothing are
/// left out.
fn category_totals(sales: &[Sale]) -> Vec<Ranked> {
    let mut by_category: HashMap<&str, Ranked> = HashMap::new();
    for item in sales.iter().flat_map(|sale| &sale.items) {
        let Some(category) = item.category_name.as_deref() else {
            continue;
        };
        let entry = by_category
            .entry(category)
            .or_insert_with(|| Ranked { name: category.to_string(), ..Ranked::default() });
        entry.sales += 1;
        entry.units += item.quantity;
        entry.revenue += item.line_total();
    }

    let mut ranked: Vec<Ranked> =
        by_category.into_values().filter(|entry| entry.revenue > Decimal::ZERO).collect();
    ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
    ranked
}
