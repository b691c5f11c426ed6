use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use stocktalk_core::currency::format_percent;
use stocktalk_core::domain::product::Product;
use stocktalk_db::InventoryRepository;

use super::{degrade, SectionBuilder, SectionKind, SectionRequest, NO_PRODUCTS};
use crate::fallback::FallbackProvider;

const TOP_BY_VALUE: usize = 5;

/// Stock value totals, the most valuable holdings, and price and margin
/// extremes.
pub struct ValuationBuilder {
    inventory: Arc<dyn InventoryRepository>,
    fallback: Arc<dyn FallbackProvider>,
}

impl ValuationBuilder {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        fallback: Arc<dyn FallbackProvider>,
    ) -> Self {
        Self { inventory, fallback }
    }
}

#[async_trait]
impl SectionBuilder for ValuationBuilder {
    fn kind(&self) -> SectionKind {
        SectionKind::Value
    }

    async fn build(&self, request: &SectionRequest) -> String {
        let products = match self.inventory.list_products(&request.account, None, None).await {
            Ok(products) => products,
            Err(error) => return degrade(self.fallback.as_ref(), self.kind(), request, &error),
        };
        if products.is_empty() {
            return NO_PRODUCTS.to_string();
        }

        let total_value: Decimal = products.iter().map(Product::total_value).sum();
        let total_cost: Decimal = products.iter().map(Product::total_cost).sum();

        let mut lines = vec![
            "Inventory Value Analysis:".to_string(),
            format!("Total Inventory Value: {}", request.money(total_value)),
            format!("Total Inventory Cost: {}", request.money(total_cost)),
            format!("Total Potential Profit: {}", request.money(total_value - total_cost)),
            String::new(),
            "Top Products by Stock Value:".to_string(),
        ];

        let mut by_value: Vec<&Product> = products.iter().collect();
        by_value.sort_by(|a, b| {
            b.total_value().cmp(&a.total_value()).then_with(|| a.name.cmp(&b.name))
        });
        for product in by_value.iter().take(TOP_BY_VALUE) {
            lines.push(format!(
                "- {}: {} ({} x {})",
                product.name,
                request.money(product.total_value()),
                product.quantity,
                request.money(product.price)
            ));
        }

        lines.push(String::new());
        if let Some(product) = extreme(&products, |product| product.price, Ordering::Greater) {
            lines.push(format!(
                "Most Expensive Product: {} ({})",
                product.name,
                request.money(product.price)
            ));
        }
        if let Some(product) = extreme(&products, |product| product.price, Ordering::Less) {
            lines.push(format!(
                "Least Expensive Product: {} ({})",
                product.name,
                request.money(product.price)
            ));
        }
        if let Some(product) = extreme(&products, Product::profit_margin, Ordering::Greater) {
            lines.push(format!(
                "Highest Profit Margin: {} ({})",
                product.name,
                format_percent(product.profit_margin())
            ));
        }
        if let Some(product) = extreme(&products, Product::profit_margin, Ordering::Less) {
            lines.push(format!(
                "Lowest Profit Margin: {} ({})",
                product.name,
                format_percent(product.profit_margin())
            ));
        }

        lines.join("\n")
    }
}

/// The product whose metric compares as `wanted` against every other; ties go
/// to the alphabetically first name.
fn extreme<F>(products: &[Product], metric: F, wanted: Ordering) -> Option<&Product>
where
    F: Fn(&Product) -> Decimal,
{
    products.iter().reduce(|best, candidate| {
        match metric(candidate).cmp(&metric(best)) {
            ordering if ordering == wanted => candidate,
            Ordering::Equal if candidate.name < best.name => candidate,
            _ => best,
        }
    })
}
