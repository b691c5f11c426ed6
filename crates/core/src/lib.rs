pub mod config;
pub mod currency;
pub mod domain;
pub mod errors;

pub use currency::{format_currency, format_money_symbol, CurrencyCode};
pub use domain::account::AccountId;
pub use domain::chat::{ChatSession, ChatSessionId, ConversationTurn, TurnRole};
pub use domain::product::{Category, CategoryId, CategoryRef, Product, ProductId, StockStatus};
pub use domain::sale::{DateRange, Sale, SaleId, SaleItem};
pub use errors::{ApplicationError, DomainError, InterfaceError};
