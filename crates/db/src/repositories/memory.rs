use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;

use stocktalk_core::domain::account::AccountId;
use stocktalk_core::domain::chat::{ChatSession, ChatSessionId, ConversationTurn};
use stocktalk_core::domain::product::{Category, Product};
use stocktalk_core::domain::sale::{DateRange, Sale};

use super::{ChatRepository, InventoryRepository, RepositoryError};

/// Slices of the in-memory store that can be switched off to simulate an
/// outage. `Store` takes everything down, including `ping`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InventoryDataKind {
    Store,
    Products,
    Categories,
    Sales,
    /// Only date-ranged sale reads fail.
    SalesWindows,
    Currency,
}

#[derive(Default)]
struct AccountInventory {
    currency: Option<String>,
    products: Vec<Product>,
    categories: Vec<Category>,
    sales: Vec<Sale>,
}

#[derive(Default)]
pub struct InMemoryInventoryRepository {
    accounts: RwLock<HashMap<String, AccountInventory>>,
    outages: RwLock<HashSet<InventoryDataKind>>,
}

impl InMemoryInventoryRepository {
    pub async fn insert_product(&self, product: Product) {
        let mut accounts = self.accounts.write().await;
        accounts.entry(product.account_id.0.clone()).or_default().products.push(product);
    }

    pub async fn insert_category(&self, category: Category) {
        let mut accounts = self.accounts.write().await;
        accounts.entry(category.account_id.0.clone()).or_default().categories.push(category);
    }

    pub async fn insert_sale(&self, sale: Sale) {
        let mut accounts = self.accounts.write().await;
        accounts.entry(sale.account_id.0.clone()).or_default().sales.push(sale);
    }

    pub async fn set_currency(&self, account: &AccountId, code: impl Into<String>) {
        let mut accounts = self.accounts.write().await;
        accounts.entry(account.0.clone()).or_default().currency = Some(code.into());
    }

    pub async fn set_unavailable(&self, kind: InventoryDataKind, unavailable: bool) {
        let mut outages = self.outages.write().await;
        if unavailable {
            outages.insert(kind);
        } else {
            outages.remove(&kind);
        }
    }

    async fn ensure_available(&self, kind: InventoryDataKind) -> Result<(), RepositoryError> {
        let outages = self.outages.read().await;
        if outages.contains(&InventoryDataKind::Store) || outages.contains(&kind) {
            return Err(RepositoryError::Unavailable(format!("{kind:?} data is offline")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.ensure_available(InventoryDataKind::Store).await
    }

    async fn list_products(
        &self,
        account: &AccountId,
        query: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, RepositoryError> {
        self.ensure_available(InventoryDataKind::Products).await?;

        let accounts = self.accounts.read().await;
        let mut products: Vec<Product> = accounts
            .get(account.as_str())
            .map(|inventory| inventory.products.clone())
            .unwrap_or_default();
        products.sort_by_key(|product| product.created_at);

        if let Some(query) = query {
            products.retain(|product| product.matches_query(query));
        }
        if let Some(limit) = limit {
            products.truncate(limit);
        }
        Ok(products)
    }

    async fn list_categories(&self, account: &AccountId) -> Result<Vec<Category>, RepositoryError> {
        self.ensure_available(InventoryDataKind::Categories).await?;

        let accounts = self.accounts.read().await;
        Ok(accounts
            .get(account.as_str())
            .map(|inventory| inventory.categories.clone())
            .unwrap_or_default())
    }

    async fn list_sales(
        &self,
        account: &AccountId,
        range: Option<DateRange>,
    ) -> Result<Vec<Sale>, RepositoryError> {
        self.ensure_available(InventoryDataKind::Sales).await?;
        if range.is_some() {
            self.ensure_available(InventoryDataKind::SalesWindows).await?;
        }

        let accounts = self.accounts.read().await;
        let mut sales: Vec<Sale> = accounts
            .get(account.as_str())
            .map(|inventory| inventory.sales.clone())
            .unwrap_or_default();
        if let Some(range) = range {
            sales.retain(|sale| range.contains(sale.sale_date));
        }
        sales.sort_by_key(|sale| sale.sale_date);
        Ok(sales)
    }

    async fn currency_preference(
        &self,
        account: &AccountId,
    ) -> Result<Option<String>, RepositoryError> {
        self.ensure_available(InventoryDataKind::Currency).await?;

        let accounts = self.accounts.read().await;
        Ok(accounts.get(account.as_str()).and_then(|inventory| inventory.currency.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryChatRepository {
    sessions: RwLock<HashMap<String, ChatSession>>,
    turns: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

#[async_trait::async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn create_session(&self, session: ChatSession) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.0.clone(), session);
        Ok(())
    }

    async fn list_sessions(
        &self,
        account: &AccountId,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let sessions = self.sessions.read().await;
        let mut owned: Vec<ChatSession> =
            sessions.values().filter(|session| &session.account_id == account).cloned().collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(owned)
    }

    async fn rename_session(
        &self,
        account: &AccountId,
        id: &ChatSessionId,
        title: &str,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let Some(session) =
            sessions.get_mut(&id.0).filter(|session| &session.account_id == account)
        else {
            return Ok(None);
        };
        session.title = title.to_string();
        session.updated_at = Utc::now();
        Ok(Some(session.clone()))
    }

    async fn delete_session(
        &self,
        account: &AccountId,
        id: &ChatSessionId,
    ) -> Result<bool, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        if !sessions.get(&id.0).is_some_and(|session| &session.account_id == account) {
            return Ok(false);
        }
        sessions.remove(&id.0);
        self.turns.write().await.remove(&id.0);
        Ok(true)
    }

    async fn delete_all_sessions(&self, account: &AccountId) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let doomed: Vec<String> = sessions
            .values()
            .filter(|session| &session.account_id == account)
            .map(|session| session.id.0.clone())
            .collect();

        let mut turns = self.turns.write().await;
        for id in &doomed {
            sessions.remove(id);
            turns.remove(id);
        }
        Ok(doomed.len() as u64)
    }

    async fn find_session(
        &self,
        account: &AccountId,
        id: &ChatSessionId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&id.0).filter(|session| &session.account_id == account).cloned())
    }

    async fn list_turns(
        &self,
        id: &ChatSessionId,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let turns = self.turns.read().await;
        Ok(turns.get(&id.0).cloned().unwrap_or_default())
    }

    async fn append_turn(
        &self,
        id: &ChatSessionId,
        turn: ConversationTurn,
    ) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(&id.0) else {
            return Err(RepositoryError::Unavailable(format!(
                "chat session `{}` does not exist",
                id.0
            )));
        };
        session.updated_at = turn.timestamp;

        let mut turns = self.turns.write().await;
        turns.entry(id.0.clone()).or_default().push(turn);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use stocktalk_core::domain::account::AccountId;
    use stocktalk_core::domain::chat::{ChatSession, ConversationTurn};
    use stocktalk_core::domain::product::{Product, ProductId};
    use stocktalk_core::domain::sale::{DateRange, Sale, SaleId};

    use crate::repositories::{
        ChatRepository, InMemoryChatRepository, InMemoryInventoryRepository, InventoryDataKind,
        InventoryRepository, RepositoryError,
    };

    fn product(name: &str, days_ago: i64) -> Product {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).single().expect("valid date")
            - Duration::days(days_ago);
        Product {
            id: ProductId(name.to_lowercase()),
            account_id: AccountId::new("acct-1"),
            name: name.to_string(),
            sku: name.to_uppercase(),
            category: None,
            description: String::new(),
            price: Decimal::ONE,
            cost: Decimal::ONE,
            quantity: 1,
            minimum_stock: 0,
            maximum_stock: 0,
            location: String::new(),
            supplier: String::new(),
            status: "active".to_string(),
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn products_are_listed_oldest_first_with_limit() {
        let repo = InMemoryInventoryRepository::default();
        repo.insert_product(product("Newer", 1)).await;
        repo.insert_product(product("Older", 10)).await;
        repo.insert_product(product("Middle", 5)).await;

        let account = AccountId::new("acct-1");
        let all = repo.list_products(&account, None, None).await.expect("list");
        let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Older", "Middle", "Newer"]);

        let limited = repo.list_products(&account, Some("e"), Some(2)).await.expect("limited");
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn outage_is_distinct_from_empty() {
        let repo = InMemoryInventoryRepository::default();
        let account = AccountId::new("acct-1");

        let empty = repo.list_sales(&account, None).await.expect("empty store answers");
        assert!(empty.is_empty());

        repo.set_unavailable(InventoryDataKind::Sales, true).await;
        let offline = repo.list_sales(&account, None).await;
        assert!(matches!(offline, Err(RepositoryError::Unavailable(_))));
        assert!(repo.list_products(&account, None, None).await.is_ok());

        repo.set_unavailable(InventoryDataKind::Sales, false).await;
        repo.set_unavailable(InventoryDataKind::Store, true).await;
        assert!(repo.ping().await.is_err());
        assert!(repo.list_products(&account, None, None).await.is_err());
    }

    #[tokio::test]
    async fn windowed_sales_outage_leaves_full_history_readable() {
        let repo = InMemoryInventoryRepository::default();
        let account = AccountId::new("acct-1");
        let now = Utc::now();
        repo.insert_sale(Sale {
            id: SaleId("s-1".to_string()),
            account_id: account.clone(),
            total_amount: Decimal::TEN,
            sale_date: now,
            payment_method: "cash".to_string(),
            items: Vec::new(),
        })
        .await;
        repo.set_unavailable(InventoryDataKind::SalesWindows, true).await;

        assert_eq!(repo.list_sales(&account, None).await.expect("history").len(), 1);
        assert!(repo.list_sales(&account, Some(DateRange::today(now))).await.is_err());
    }

    #[tokio::test]
    async fn chat_turns_require_an_existing_session() {
        let repo = InMemoryChatRepository::default();
        let session = ChatSession::new(AccountId::new("acct-1"), "New Chat");

        let orphan = repo.append_turn(&session.id, ConversationTurn::user("hello")).await;
        assert!(orphan.is_err());

        repo.create_session(session.clone()).await.expect("create");
        repo.append_turn(&session.id, ConversationTurn::user("hello")).await.expect("append");

        assert_eq!(repo.list_turns(&session.id).await.expect("turns").len(), 1);
        assert!(repo
            .find_session(&AccountId::new("acct-2"), &session.id)
            .await
            .expect("find")
            .is_none());
    }

    #[tokio::test]
    async fn session_management_matches_the_sql_store() {
        let repo = InMemoryChatRepository::default();
        let account = AccountId::new("acct-1");
        let first = ChatSession::new(account.clone(), "First");
        let second = ChatSession::new(account.clone(), "Second");
        repo.create_session(first.clone()).await.expect("first");
        repo.create_session(second.clone()).await.expect("second");
        repo.create_session(ChatSession::new(AccountId::new("acct-2"), "Other"))
            .await
            .expect("other");

        let touched = ConversationTurn {
            timestamp: Utc::now() + Duration::minutes(1),
            ..ConversationTurn::user("bump")
        };
        repo.append_turn(&first.id, touched).await.expect("append");
        let listed = repo.list_sessions(&account).await.expect("list");
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed.len(), 2);

        let renamed = repo.rename_session(&account, &second.id, "Renamed").await.expect("rename");
        assert_eq!(renamed.map(|session| session.title), Some("Renamed".to_string()));

        assert!(repo.delete_session(&account, &first.id).await.expect("delete"));
        assert!(repo.list_turns(&first.id).await.expect("turns").is_empty());
        assert_eq!(repo.delete_all_sessions(&account).await.expect("delete all"), 1);
        assert_eq!(repo.list_sessions(&AccountId::new("acct-2")).await.expect("other").len(), 1);
    }
}
