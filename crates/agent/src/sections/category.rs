use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use stocktalk_core::domain::product::{Category, Product};
use stocktalk_db::InventoryRepository;

use super::{degrade, SectionBuilder, SectionKind, SectionRequest};
use crate::fallback::FallbackProvider;

pub const NO_CATEGORIES: &str = "There are no categories in your inventory.";

/// Either one category's products, when the query names a category, or every
/// category with its product count.
pub struct CategoryInfoBuilder {
    inventory: Arc<dyn InventoryRepository>,
    fallback: Arc<dyn FallbackProvider>,
}

impl CategoryInfoBuilder {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        fallback: Arc<dyn FallbackProvider>,
    ) -> Self {
        Self { inventory, fallback }
    }
}

#[async_trait]
impl SectionBuilder for CategoryInfoBuilder {
    fn kind(&self) -> SectionKind {
        SectionKind::Category
    }

    async fn build(&self, request: &SectionRequest) -> String {
        let categories = match self.inventory.list_categories(&request.account).await {
            Ok(categories) => categories,
            Err(error) => return degrade(self.fallback.as_ref(), self.kind(), request, &error),
        };
        if categories.is_empty() {
            return NO_CATEGORIES.to_string();
        }

        let selected = match request.query() {
            Some(query) => match find_category(&categories, query) {
                Some(category) => Some(category),
                None => return format!("No category found matching '{query}'."),
            },
            None => None,
        };

        let products = match self.inventory.list_products(&request.account, None, None).await {
            Ok(products) => products,
            Err(error) => return degrade(self.fallback.as_ref(), self.kind(), request, &error),
        };

        match selected {
            Some(category) => render_category(category, &products, request),
            None => render_all(&categories, &products),
        }
    }
}

/// Exact name match wins over a partial one.
fn find_category<'a>(categories: &'a [Category], query: &str) -> Option<&'a Category> {
    let needle = query.to_lowercase();
    let named = |exact: bool| {
        categories.iter().find(|category| {
            let name = category.name.to_lowercase();
            if exact {
                name == needle
            } else {
                name.contains(&needle)
            }
        })
    };
    named(true).or_else(|| named(false))
}

fn render_category(category: &Category, products: &[Product], request: &SectionRequest) -> String {
    let members: Vec<&Product> = products
        .iter()
        .filter(|product| product.category.as_ref().is_some_and(|c| c.id == category.id))
        .collect();

    let mut lines = vec![format!("Category: {}", category.name)];
    if members.is_empty() {
        lines.push("No products in this category.".to_string());
        return lines.join("\n");
    }

    lines.push(format!("Products ({}):", members.len()));
    for product in members {
        lines.push(format!(
            "- {} (SKU: {}): {}, {} in stock",
            product.name,
            product.sku,
            request.money(product.price),
            product.quantity
        ));
    }
    lines.join("\n")
}

fn render_all(categories: &[Category], products: &[Product]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut uncategorized = 0;
    for product in products {
        match &product.category {
            Some(category) => *counts.entry(category.id.0.as_str()).or_default() += 1,
            None => uncategorized += 1,
        }
    }

    let mut listed: Vec<(&str, usize)> = categories
        .iter()
        .map(|category| {
            (category.name.as_str(), counts.get(category.id.0.as_str()).copied().unwrap_or(0))
        })
        .collect();
    listed.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut lines = vec!["Categories:".to_string()];
    lines.extend(listed.into_iter().map(|(name, count)| format!("- {name}: {count} products")));
    if uncategorized > 0 {
        lines.push(format!("Uncategorized Products: {uncategorized}"));
    }
    lines.join("\n")
}
