use std::sync::Arc;

use async_trait::async_trait;

use stocktalk_core::currency::format_percent;
use stocktalk_core::domain::product::Product;
use stocktalk_db::InventoryRepository;

use super::{date, degrade, SectionBuilder, SectionKind, SectionRequest, NO_PRODUCTS};
use crate::fallback::FallbackProvider;

pub const DEFAULT_PRODUCT_LIMIT: usize = 10;

/// Full product records, optionally filtered by a free-text query.
pub struct ProductInfoBuilder {
    inventory: Arc<dyn InventoryRepository>,
    fallback: Arc<dyn FallbackProvider>,
    limit: usize,
}

impl ProductInfoBuilder {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        fallback: Arc<dyn FallbackProvider>,
    ) -> Self {
        Self { inventory, fallback, limit: DEFAULT_PRODUCT_LIMIT }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }
}

#[async_trait]
impl SectionBuilder for ProductInfoBuilder {
    fn kind(&self) -> SectionKind {
        SectionKind::Product
    }

    async fn build(&self, request: &SectionRequest) -> String {
        let account = &request.account;
        let all = match self.inventory.list_products(account, None, None).await {
            Ok(products) => products,
            Err(error) => return degrade(self.fallback.as_ref(), self.kind(), request, &error),
        };
        if all.is_empty() {
            return NO_PRODUCTS.to_string();
        }

        let query = request.query();
        let matched = match self.inventory.list_products(account, query, Some(self.limit)).await {
            Ok(products) => products,
            Err(error) => return degrade(self.fallback.as_ref(), self.kind(), request, &error),
        };
        if matched.is_empty() {
            return match query {
                Some(query) => format!("No products found matching '{query}'."),
                None => "No products found in the inventory.".to_string(),
            };
        }

        let mut lines = vec![match query {
            Some(query) => format!("Product Information (matching '{query}'):"),
            None => "Product Information:".to_string(),
        }];
        for product in &matched {
            lines.extend(render_product(product, request));
            lines.push(String::new());
        }

        // Age framing always refers to the whole catalog, not the filtered set.
        if let (Some(oldest), Some(newest)) = (all.first(), all.last()) {
            lines.push("Product Age Information:".to_string());
            lines.push(format!(
                "Oldest Product: {} (Created: {})",
                oldest.name,
                date(oldest.created_at)
            ));
            lines.push(format!(
                "Newest Product: {} (Created: {})",
                newest.name,
                date(newest.created_at)
            ));
        }

        lines.join("\n")
    }
}

fn render_product(product: &Product, request: &SectionRequest) -> Vec<String> {
    vec![
        format!("- {} (SKU: {})", product.name, product.sku),
        format!("  Description: {}", product.description),
        format!("  Category: {}", product.category_name().unwrap_or("Uncategorized")),
        format!("  Price: {}", request.money(product.price)),
        format!("  Cost: {}", request.money(product.cost)),
        format!("  Profit Margin: {}", format_percent(product.profit_margin())),
        format!("  In Stock: {}", product.quantity),
        format!("  Total Value: {}", request.money(product.total_value())),
        format!("  Potential Profit: {}", request.money(product.potential_profit())),
        format!("  Minimum Stock: {}", product.minimum_stock),
        format!("  Maximum Stock: {}", product.maximum_stock),
        format!("  Stock Status: {}", product.stock_status().label()),
        format!("  Location: {}", product.location),
        format!("  Supplier: {}", product.supplier),
        format!("  Created: {}", date(product.created_at)),
        format!("  Last Updated: {}", date(product.updated_at)),
        format!("  Status: {}", product.status),
    ]
}
