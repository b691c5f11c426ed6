//! Keyword routing from a user utterance to the sections of the context
//! document.
//!
//! The inventory summary always leads. Every route whose keyword set hits the
//! lowercased utterance appends its section, in table order, so overlapping
//! keyword sets ("price", "cost", "revenue") deliberately repeat figures
//! across sections.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use stocktalk_core::currency::CurrencyCode;
use stocktalk_core::domain::account::AccountId;
use stocktalk_db::InventoryRepository;

use crate::fallback::FallbackProvider;
use crate::sections::{
    CategoryInfoBuilder, InventorySummaryBuilder, ProductInfoBuilder, SalesAnalyticsBuilder,
    SectionBuilder, SectionRequest, TimelineBuilder, ValuationBuilder,
};

pub const PRODUCT_KEYWORDS: &[&str] = &[
    "product",
    "item",
    "stock",
    "price",
    "sku",
    "quantity",
    "description",
    "profit margin",
    "value",
    "cost",
    "supplier",
    "location",
];

pub const TIME_KEYWORDS: &[&str] = &[
    "oldest", "newest", "recent", "latest", "first", "last", "date", "time", "created", "updated",
    "when", "history", "timeline",
];

pub const VALUE_KEYWORDS: &[&str] = &[
    "value",
    "worth",
    "cost",
    "profit",
    "margin",
    "financial",
    "money",
    "revenue",
    "price",
    "expensive",
    "cheap",
    "total value",
    "inventory value",
];

pub const SALES_KEYWORDS: &[&str] = &[
    "sales",
    "revenue",
    "analytics",
    "selling",
    "performance",
    "sold",
    "purchase",
    "transaction",
    "customer",
    "buyer",
];

pub const CATEGORY_KEYWORDS: &[&str] =
    &["category", "categories", "group", "classification", "type"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Product,
    Time,
    Value,
    Sales,
    Category,
    /// Intent added through [`ContextRouter::with_route`].
    Custom(&'static str),
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Time => "time",
            Self::Value => "value",
            Self::Sales => "sales",
            Self::Category => "category",
            Self::Custom(name) => *name,
        }
    }
}

/// Record names scanned for in the utterance to narrow a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    ProductName,
    CategoryName,
}

pub struct Route {
    pub intent: Intent,
    pub keywords: &'static [&'static str],
    pub entity: Option<EntityKind>,
    pub builder: Box<dyn SectionBuilder>,
}

impl Route {
    pub fn new(
        intent: Intent,
        keywords: &'static [&'static str],
        builder: impl SectionBuilder + 'static,
    ) -> Self {
        Self { intent, keywords, entity: None, builder: Box::new(builder) }
    }

    pub fn with_entity(mut self, entity: EntityKind) -> Self {
        self.entity = Some(entity);
        self
    }

    /// `lowered` must already be lowercased.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouterOptions {
    pub product_limit: usize,
    pub default_currency: CurrencyCode,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self { product_limit: 10, default_currency: CurrencyCode::Usd }
    }
}

pub struct ContextRouter {
    inventory: Arc<dyn InventoryRepository>,
    fallback: Arc<dyn FallbackProvider>,
    summary: InventorySummaryBuilder,
    routes: Vec<Route>,
    default_currency: CurrencyCode,
}

impl ContextRouter {
    /// Router with the standard table: product, time, value, sales, category.
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        fallback: Arc<dyn FallbackProvider>,
        options: RouterOptions,
    ) -> Self {
        let routes = vec![
            Route::new(
                Intent::Product,
                PRODUCT_KEYWORDS,
                ProductInfoBuilder::new(inventory.clone(), fallback.clone())
                    .with_limit(options.product_limit),
            )
            .with_entity(EntityKind::ProductName),
            Route::new(
                Intent::Time,
                TIME_KEYWORDS,
                TimelineBuilder::new(inventory.clone(), fallback.clone()),
            ),
            Route::new(
                Intent::Value,
                VALUE_KEYWORDS,
                ValuationBuilder::new(inventory.clone(), fallback.clone()),
            ),
            Route::new(
                Intent::Sales,
                SALES_KEYWORDS,
                SalesAnalyticsBuilder::new(inventory.clone(), fallback.clone()),
            ),
            Route::new(
                Intent::Category,
                CATEGORY_KEYWORDS,
                CategoryInfoBuilder::new(inventory.clone(), fallback.clone()),
            )
            .with_entity(EntityKind::CategoryName),
        ];

        Self {
            summary: InventorySummaryBuilder::new(inventory.clone(), fallback.clone()),
            inventory,
            fallback,
            routes,
            default_currency: options.default_currency,
        }
    }

    /// Appends a route after the existing ones.
    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn classify(&self, utterance: &str) -> Vec<Intent> {
        let lowered = utterance.to_lowercase();
        self.routes
            .iter()
            .filter(|route| route.matches(&lowered))
            .map(|route| route.intent)
            .collect()
    }

    pub async fn build_context(&self, account: &AccountId, utterance: &str) -> String {
        self.build_context_at(account, utterance, Utc::now()).await
    }

    pub async fn build_context_at(
        &self,
        account: &AccountId,
        utterance: &str,
        now: DateTime<Utc>,
    ) -> String {
        if let Err(error) = self.inventory.ping().await {
            warn!(
                event_name = "context.store.unavailable",
                account_id = %account,
                error = %error,
                "inventory store unreachable, serving canned context"
            );
            return self.fallback.canned_context();
        }

        let lowered = utterance.to_lowercase();
        let currency = self.resolve_currency(account).await;
        let request = SectionRequest::new(account.clone(), currency).at(now);

        let mut sections = vec![self.summary.build(&request).await];
        let mut matched = Vec::new();
        for route in self.routes.iter().filter(|route| route.matches(&lowered)) {
            let query = match route.entity {
                Some(kind) => self.extract_entity(kind, account, &lowered).await,
                None => None,
            };
            sections.push(route.builder.build(&request.with_query(query)).await);
            matched.push(route.intent.as_str());
        }

        info!(
            event_name = "context.built",
            account_id = %account,
            currency = %currency,
            intents = ?matched,
            sections = sections.len(),
            "context document assembled"
        );
        sections.join("\n\n")
    }

    async fn resolve_currency(&self, account: &AccountId) -> CurrencyCode {
        match self.inventory.currency_preference(account).await {
            Ok(Some(code)) => CurrencyCode::from_code(&code),
            Ok(None) => self.default_currency,
            Err(error) => {
                debug!(
                    event_name = "context.currency.unresolved",
                    account_id = %account,
                    error = %error,
                    "currency preference unreadable, using default"
                );
                self.default_currency
            }
        }
    }

    /// First record name, in store order, contained in the utterance.
    async fn extract_entity(
        &self,
        kind: EntityKind,
        account: &AccountId,
        lowered: &str,
    ) -> Option<String> {
        let names: Result<Vec<String>, _> = match kind {
            EntityKind::ProductName => self
                .inventory
                .list_products(account, None, None)
                .await
                .map(|products| products.into_iter().map(|product| product.name).collect()),
            EntityKind::CategoryName => self
                .inventory
                .list_categories(account)
                .await
                .map(|categories| categories.into_iter().map(|category| category.name).collect()),
        };

        let names = match names {
            Ok(names) => names,
            Err(error) => {
                debug!(
                    event_name = "context.entity.unavailable",
                    account_id = %account,
                    entity = ?kind,
                    error = %error,
                    "entity names unreadable, section runs unfiltered"
                );
                return None;
            }
        };

        names
            .into_iter()
            .map(|name| name.to_lowercase())
            .find(|name| !name.trim().is_empty() && lowered.contains(name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use stocktalk_db::repositories::{InMemoryInventoryRepository, InventoryDataKind};

    use super::{ContextRouter, Intent, Route, RouterOptions};
    use crate::fallback::FallbackProvider;
    use crate::sections::{InventorySummaryBuilder, SectionBuilder, SectionKind, SectionRequest};
    use crate::test_support::{
        account, fallback, fixed_now, request, store_with_sales, two_product_store,
    };

    fn router(repo: Arc<InMemoryInventoryRepository>) -> ContextRouter {
        ContextRouter::new(repo, fallback(), RouterOptions::default())
    }

    #[test]
    fn classification_keeps_overlapping_intents() {
        let router = ContextRouter::new(
            Arc::new(InMemoryInventoryRepository::default()),
            fallback(),
            RouterOptions::default(),
        );

        assert_eq!(
            router.classify("What is the PRICE of the mouse?"),
            vec![Intent::Product, Intent::Value]
        );
        assert_eq!(router.classify("sales by category"), vec![Intent::Sales, Intent::Category]);
        assert!(router.classify("hello there").is_empty());
    }

    #[tokio::test]
    async fn unmatched_utterance_yields_summary_alone() {
        let repo = two_product_store().await;
        let summary = InventorySummaryBuilder::new(repo.clone(), fallback());
        let expected = summary.build(&request()).await;

        let context = router(repo).build_context_at(&account(), "hello there", fixed_now()).await;
        assert_eq!(context, expected);
    }

    #[tokio::test]
    async fn product_name_in_utterance_filters_product_section() {
        let context = router(two_product_store().await)
            .build_context_at(&account(), "how many gaming mouse in stock", fixed_now())
            .await;

        assert!(context.starts_with("Inventory Summary:"), "{context}");
        assert!(context.contains("Product Information (matching 'gaming mouse'):"), "{context}");
        assert!(!context.contains("- Keyboard (SKU"), "{context}");
    }

    #[tokio::test]
    async fn sections_follow_table_order() {
        let context = router(store_with_sales().await)
            .build_context_at(&account(), "which category drives sales", fixed_now())
            .await;

        let sales = context.find("Sales Analytics:").expect("sales section");
        let categories = context.rfind("\n\nCategories:").expect("category section");
        assert!(sales < categories, "{context}");
    }

    #[tokio::test]
    async fn category_name_in_utterance_narrows_category_section() {
        let context = router(two_product_store().await)
            .build_context_at(&account(), "what type of gaming peripherals do I have", fixed_now())
            .await;

        assert!(context.contains("Category: Gaming Peripherals\nProducts (2):"), "{context}");
    }

    #[tokio::test]
    async fn store_outage_serves_canned_context() {
        let repo = two_product_store().await;
        repo.set_unavailable(InventoryDataKind::Store, true).await;

        let context = router(repo).build_context_at(&account(), "sales", fixed_now()).await;
        assert_eq!(context, fallback().canned_context());
    }

    #[tokio::test]
    async fn sales_outage_only_degrades_sales_section() {
        let repo = store_with_sales().await;
        repo.set_unavailable(InventoryDataKind::Sales, true).await;

        let context = router(repo).build_context_at(&account(), "product sales", fixed_now()).await;
        assert!(context.contains("Product Information:"), "{context}");
        assert!(context.contains("Sales Analytics (SAMPLE DATA):"), "{context}");
        assert!(!context.contains("Product Information (SAMPLE DATA)"), "{context}");
    }

    #[tokio::test]
    async fn account_currency_formats_every_section() {
        let repo = two_product_store().await;
        repo.set_currency(&account(), "inr").await;

        let context = router(repo).build_context_at(&account(), "price", fixed_now()).await;
        assert!(context.contains("Total Inventory Value: ₹2699.55"), "{context}");
        assert!(!context.contains('$'), "{context}");
    }

    #[tokio::test]
    async fn currency_read_failure_uses_configured_default() {
        let repo = two_product_store().await;
        repo.set_unavailable(InventoryDataKind::Currency, true).await;
        let options = RouterOptions {
            default_currency: stocktalk_core::currency::CurrencyCode::Eur,
            ..RouterOptions::default()
        };

        let context = ContextRouter::new(repo, fallback(), options)
            .build_context_at(&account(), "hello", fixed_now())
            .await;
        assert!(context.contains("Total Inventory Value: €2699.55"), "{context}");
    }

    struct ReorderNotes;

    #[async_trait]
    impl SectionBuilder for ReorderNotes {
        fn kind(&self) -> SectionKind {
            SectionKind::Product
        }

        async fn build(&self, _request: &SectionRequest) -> String {
            "Reorder Notes:\nNothing pending.".to_string()
        }
    }

    #[tokio::test]
    async fn extra_routes_append_after_standard_sections() {
        let router = router(two_product_store().await).with_route(Route::new(
            Intent::Custom("reorder"),
            &["reorder"],
            ReorderNotes,
        ));

        assert_eq!(
            router.classify("reorder stock"),
            vec![Intent::Product, Intent::Custom("reorder")]
        );
        let context = router.build_context_at(&account(), "reorder stock", fixed_now()).await;
        assert!(context.ends_with("\n\nReorder Notes:\nNothing pending."), "{context}");
    }
}
