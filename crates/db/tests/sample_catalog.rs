use std::sync::Arc;

use stocktalk_core::domain::account::AccountId;
use stocktalk_core::domain::chat::{ChatSession, ConversationTurn, TurnRole};
use stocktalk_db::repositories::{SqlChatRepository, SqlInventoryRepository};
use stocktalk_db::{
    connect_with_settings, migrations, ChatRepository, InventoryRepository, SampleInventoryDataset,
    DEMO_ACCOUNT_ID,
};

type TestResult = Result<(), String>;

async fn seeded_pool() -> Result<sqlx::SqlitePool, String> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.map_err(|e| e.to_string())?;
    migrations::run_pending(&pool).await.map_err(|e| e.to_string())?;
    SampleInventoryDataset::load(&pool).await.map_err(|e| e.to_string())?;
    Ok(pool)
}

#[tokio::test]
async fn demo_catalog_matches_the_published_sample_figures() -> TestResult {
    let pool = seeded_pool().await?;
    let repo: Arc<dyn InventoryRepository> = Arc::new(SqlInventoryRepository::new(pool));
    let account = AccountId::new(DEMO_ACCOUNT_ID);

    let products = repo.list_products(&account, None, None).await.map_err(|e| e.to_string())?;
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    if names.first() != Some(&"Gaming Mouse") || names.last() != Some(&"Gaming Chair") {
        return Err(format!("unexpected creation order: {names:?}"));
    }

    let chair = products.iter().find(|p| p.sku == "CH001").ok_or("chair missing")?;
    if chair.stock_status().label() != "Low Stock" {
        return Err(format!("chair should be low stock, got {}", chair.stock_status().label()));
    }

    let sales = repo.list_sales(&account, None).await.map_err(|e| e.to_string())?;
    let item_count: usize = sales.iter().map(|sale| sale.items.len()).sum();
    if sales.len() != 8 || item_count != 9 {
        return Err(format!("expected 8 sales with 9 items, got {} / {item_count}", sales.len()));
    }

    let currency = repo.currency_preference(&account).await.map_err(|e| e.to_string())?;
    if currency.as_deref() != Some("USD") {
        return Err(format!("demo currency should be USD, got {currency:?}"));
    }
    Ok(())
}

#[tokio::test]
async fn chat_history_survives_alongside_the_catalog() -> TestResult {
    let pool = seeded_pool().await?;
    let chat = SqlChatRepository::new(pool);
    let session = ChatSession::new(AccountId::new(DEMO_ACCOUNT_ID), "Demo chat");

    chat.create_session(session.clone()).await.map_err(|e| e.to_string())?;
    chat.append_turn(&session.id, ConversationTurn::user("What sells best?"))
        .await
        .map_err(|e| e.to_string())?;

    let turns = chat.list_turns(&session.id).await.map_err(|e| e.to_string())?;
    match turns.as_slice() {
        [turn] if turn.role == TurnRole::User => Ok(()),
        other => Err(format!("unexpected turns: {other:?}")),
    }
}
