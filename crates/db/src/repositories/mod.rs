use async_trait::async_trait;
use thiserror::Error;

use stocktalk_core::domain::account::AccountId;
use stocktalk_core::domain::chat::{ChatSession, ChatSessionId, ConversationTurn};
use stocktalk_core::domain::product::{Category, Product};
use stocktalk_core::domain::sale::{DateRange, Sale};

pub mod chat;
pub mod inventory;
pub mod memory;

pub use chat::SqlChatRepository;
pub use inventory::SqlInventoryRepository;
pub use memory::{InMemoryChatRepository, InMemoryInventoryRepository, InventoryDataKind};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("data unavailable: {0}")]
    Unavailable(String),
}

/// Read-only, account-scoped access to inventory records.
///
/// An `Err` means the store could not answer; `Ok(vec![])` means it answered
/// and the account has no such records. Callers rely on that distinction to
/// choose between substitute text and a "no records" message.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Products ordered by creation time, oldest first. `query` matches name,
    /// description, SKU, or category name case-insensitively.
    async fn list_products(
        &self,
        account: &AccountId,
        query: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn list_categories(&self, account: &AccountId) -> Result<Vec<Category>, RepositoryError>;

    /// Sales ordered by date, oldest first, with items resolved to product and
    /// category names.
    async fn list_sales(
        &self,
        account: &AccountId,
        range: Option<DateRange>,
    ) -> Result<Vec<Sale>, RepositoryError>;

    async fn currency_preference(
        &self,
        account: &AccountId,
    ) -> Result<Option<String>, RepositoryError>;
}

/// Chat sessions and their append-only turns, scoped to the owning account.
/// Lookups for another account's session behave as if it did not exist.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn create_session(&self, session: ChatSession) -> Result<(), RepositoryError>;

    /// Most recently active first.
    async fn list_sessions(&self, account: &AccountId)
        -> Result<Vec<ChatSession>, RepositoryError>;

    /// Sets the title and touches `updated_at`. `None` when the account owns
    /// no such session.
    async fn rename_session(
        &self,
        account: &AccountId,
        id: &ChatSessionId,
        title: &str,
    ) -> Result<Option<ChatSession>, RepositoryError>;

    /// Removes the session with its turns. `false` when nothing was removed.
    async fn delete_session(
        &self,
        account: &AccountId,
        id: &ChatSessionId,
    ) -> Result<bool, RepositoryError>;

    /// Returns how many sessions were removed.
    async fn delete_all_sessions(&self, account: &AccountId) -> Result<u64, RepositoryError>;

    async fn find_session(
        &self,
        account: &AccountId,
        id: &ChatSessionId,
    ) -> Result<Option<ChatSession>, RepositoryError>;

    async fn list_turns(&self, id: &ChatSessionId)
        -> Result<Vec<ConversationTurn>, RepositoryError>;

    async fn append_turn(
        &self,
        id: &ChatSessionId,
        turn: ConversationTurn,
    ) -> Result<(), RepositoryError>;
}

pub(crate) fn format_timestamp(value: chrono::DateTime<chrono::Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

pub(crate) fn parse_timestamp(
    raw: &str,
) -> Result<chrono::DateTime<chrono::Utc>, RepositoryError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&chrono::Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {error}")))
}
