use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use stocktalk_core::domain::account::AccountId;
use stocktalk_core::domain::product::{Category, CategoryId, CategoryRef, Product, ProductId};
use stocktalk_core::domain::sale::{Sale, SaleId, SaleItem};
use stocktalk_db::repositories::InMemoryInventoryRepository;

use crate::fallback::{FallbackProvider, SampleDataFallback};
use crate::llm::{LlmClient, LlmError};
use crate::sections::SectionRequest;
use stocktalk_core::currency::CurrencyCode;

pub const ACCOUNT: &str = "acct-1";

pub fn account() -> AccountId {
    AccountId::new(ACCOUNT)
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).single().expect("valid date")
}

pub fn request() -> SectionRequest {
    SectionRequest::new(account(), CurrencyCode::Usd).at(fixed_now())
}

pub fn fallback() -> Arc<dyn FallbackProvider> {
    Arc::new(SampleDataFallback)
}

pub fn money(raw: &str) -> Decimal {
    raw.parse().expect("valid decimal")
}

pub fn category(id: &str, name: &str) -> Category {
    Category {
        id: CategoryId(id.to_string()),
        account_id: account(),
        name: name.to_string(),
        created_at: fixed_now() - Duration::days(400),
    }
}

pub struct ProductSpec<'a> {
    pub name: &'a str,
    pub sku: &'a str,
    pub category: Option<(&'a str, &'a str)>,
    pub price: &'a str,
    pub cost: &'a str,
    pub quantity: i64,
    pub created_days_ago: i64,
}

pub fn product(fixture: ProductSpec<'_>) -> Product {
    let created_at = fixed_now() - Duration::days(fixture.created_days_ago);
    Product {
        id: ProductId(format!("prod-{}", fixture.sku.to_lowercase())),
        account_id: account(),
        name: fixture.name.to_string(),
        sku: fixture.sku.to_string(),
        category: fixture.category.map(|(id, name)| CategoryRef {
            id: CategoryId(id.to_string()),
            name: name.to_string(),
        }),
        description: format!("{} for testing", fixture.name),
        price: money(fixture.price),
        cost: money(fixture.cost),
        quantity: fixture.quantity,
        minimum_stock: 10,
        maximum_stock: 50,
        location: "Warehouse A".to_string(),
        supplier: "Gaming Gear Inc.".to_string(),
        status: "active".to_string(),
        created_at,
        updated_at: created_at + Duration::days(1),
    }
}

pub fn gaming_mouse() -> Product {
    product(ProductSpec {
        name: "Gaming Mouse",
        sku: "GM001",
        category: Some(("cat-peripherals", "Gaming Peripherals")),
        price: "59.99",
        cost: "35.99",
        quantity: 45,
        created_days_ago: 300,
    })
}

pub fn keyboard() -> Product {
    product(ProductSpec {
        name: "Keyboard",
        sku: "KB001",
        category: Some(("cat-peripherals", "Gaming Peripherals")),
        price: "89.99",
        cost: "52.50",
        quantity: 0,
        created_days_ago: 200,
    })
}

pub fn monitor() -> Product {
    product(ProductSpec {
        name: "Gaming Monitor",
        sku: "MON001",
        category: Some(("cat-components", "Computer Components")),
        price: "299.99",
        cost: "210.00",
        quantity: 15,
        created_days_ago: 100,
    })
}

pub fn sale(id: &str, days_ago: i64, method: &str, lines: &[(&Product, i64)]) -> Sale {
    let items: Vec<SaleItem> = lines
        .iter()
        .map(|(product, quantity)| SaleItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            category_name: product.category_name().map(str::to_string),
            quantity: *quantity,
            unit_price: product.price,
        })
        .collect();
    Sale {
        id: SaleId(id.to_string()),
        account_id: account(),
        total_amount: items.iter().map(SaleItem::line_total).sum(),
        sale_date: fixed_now() - Duration::days(days_ago),
        payment_method: method.to_string(),
        items,
    }
}

/// Mouse and keyboard under "Gaming Peripherals", plus an empty "Networking"
/// category.
pub async fn two_product_store() -> Arc<InMemoryInventoryRepository> {
    let repo = Arc::new(InMemoryInventoryRepository::default());
    repo.insert_category(category("cat-peripherals", "Gaming Peripherals")).await;
    repo.insert_category(category("cat-networking", "Networking")).await;
    repo.insert_product(gaming_mouse()).await;
    repo.insert_product(keyboard()).await;
    repo
}

/// Three products with sales spread over the last two months.
pub async fn store_with_sales() -> Arc<InMemoryInventoryRepository> {
    let repo = two_product_store().await;
    repo.insert_category(category("cat-components", "Computer Components")).await;
    let mouse = gaming_mouse();
    let keyboard = keyboard();
    let monitor = monitor();
    repo.insert_product(monitor.clone()).await;

    repo.insert_sale(sale("s-1", 45, "credit_card", &[(&mouse, 2)])).await;
    repo.insert_sale(sale("s-2", 20, "cash", &[(&keyboard, 1), (&mouse, 1)])).await;
    repo.insert_sale(sale("s-3", 3, "credit_card", &[(&monitor, 1)])).await;
    repo.insert_sale(sale("s-4", 0, "bank_transfer", &[(&mouse, 1)])).await;
    repo
}

/// Replays a fixed sequence of outcomes and records every prompt it sees.
pub struct ScriptedLlm {
    outcomes: Mutex<Vec<Result<String, LlmError>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(outcomes: Vec<Result<String, LlmError>>) -> Self {
        Self { outcomes: Mutex::new(outcomes), prompts: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().expect("prompt log").len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().expect("prompt log").last().cloned()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().expect("prompt log").push(prompt.to_string());
        let mut outcomes = self.outcomes.lock().expect("outcomes");
        if outcomes.is_empty() {
            return Err(LlmError::Transport("script exhausted".to_string()));
        }
        outcomes.remove(0)
    }
}
