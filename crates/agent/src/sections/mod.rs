//! Section builders turn account-scoped inventory reads into self-contained
//! text blocks for the model's context document.
//!
//! Every builder returns non-empty text: an explicit "no records" message when
//! the store answered with nothing, or the injected fallback's canned text when
//! the store could not answer at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use stocktalk_core::currency::{format_currency, CurrencyCode};
use stocktalk_core::domain::account::AccountId;
use stocktalk_db::RepositoryError;

use crate::fallback::FallbackProvider;

pub mod category;
pub mod product;
pub mod sales;
pub mod summary;
pub mod timeline;
pub mod valuation;

pub use category::CategoryInfoBuilder;
pub use product::ProductInfoBuilder;
pub use sales::SalesAnalyticsBuilder;
pub use summary::InventorySummaryBuilder;
pub use timeline::TimelineBuilder;
pub use valuation::ValuationBuilder;

pub const NO_PRODUCTS: &str = "There are no products in your inventory.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Summary,
    Product,
    Time,
    Value,
    Sales,
    Category,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Summary,
        SectionKind::Product,
        SectionKind::Time,
        SectionKind::Value,
        SectionKind::Sales,
        SectionKind::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Product => "product",
            Self::Time => "time",
            Self::Value => "value",
            Self::Sales => "sales",
            Self::Category => "category",
        }
    }
}

/// Inputs shared by every builder for one context-building call.
#[derive(Clone, Debug)]
pub struct SectionRequest {
    pub account: AccountId,
    pub query: Option<String>,
    pub currency: CurrencyCode,
    pub now: DateTime<Utc>,
}

impl SectionRequest {
    pub fn new(account: AccountId, currency: CurrencyCode) -> Self {
        Self { account, query: None, currency, now: Utc::now() }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_query(&self, query: Option<String>) -> Self {
        Self { query, ..self.clone() }
    }

    pub(crate) fn money(&self, amount: Decimal) -> String {
        format_currency(amount, self.currency)
    }

    pub(crate) fn query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|query| !query.is_empty())
    }
}

#[async_trait]
pub trait SectionBuilder: Send + Sync {
    fn kind(&self) -> SectionKind;

    async fn build(&self, request: &SectionRequest) -> String;
}

/// Logs a failed primary read and returns the fallback's text for `kind`.
pub(crate) fn degrade(
    fallback: &dyn FallbackProvider,
    kind: SectionKind,
    request: &SectionRequest,
    error: &RepositoryError,
) -> String {
    warn!(
        event_name = "context.section.degraded",
        section = kind.as_str(),
        account_id = %request.account,
        error = %error,
        "inventory read failed, serving fallback section"
    );
    fallback.canned_section(kind)
}

pub(crate) fn date(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d").to_string()
}
