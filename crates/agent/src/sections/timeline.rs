use std::sync::Arc;

use async_trait::async_trait;

use stocktalk_db::InventoryRepository;

use super::{date, degrade, SectionBuilder, SectionKind, SectionRequest, NO_PRODUCTS};
use crate::fallback::FallbackProvider;

const LISTED: usize = 5;

/// Oldest, newest, and most recently updated products.
pub struct TimelineBuilder {
    inventory: Arc<dyn InventoryRepository>,
    fallback: Arc<dyn FallbackProvider>,
}

impl TimelineBuilder {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        fallback: Arc<dyn FallbackProvider>,
    ) -> Self {
        Self { inventory, fallback }
    }
}

#[async_trait]
impl SectionBuilder for TimelineBuilder {
    fn kind(&self) -> SectionKind {
        SectionKind::Time
    }

    async fn build(&self, request: &SectionRequest) -> String {
        let mut products = match self.inventory.list_products(&request.account, None, None).await {
            Ok(products) => products,
            Err(error) => return degrade(self.fallback.as_ref(), self.kind(), request, &error),
        };
        if products.is_empty() {
            return NO_PRODUCTS.to_string();
        }

        let mut lines = vec!["Inventory Timeline:".to_string(), "Oldest Products:".to_string()];
        lines.extend(
            products
                .iter()
                .take(LISTED)
                .map(|product| format!("- {} (Added: {})", product.name, date(product.created_at))),
        );

        lines.push(String::new());
        lines.push("Newest Products:".to_string());
        lines.extend(
            products
                .iter()
                .rev()
                .take(LISTED)
                .map(|product| format!("- {} (Added: {})", product.name, date(product.created_at))),
        );

        products.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.name.cmp(&b.name)));
        lines.push(String::new());
        lines.push("Recently Updated:".to_string());
        lines.extend(products.iter().take(LISTED).map(|product| {
            format!("- {} (Updated: {})", product.name, date(product.updated_at))
        }));

        lines.join("\n")
    }
}
