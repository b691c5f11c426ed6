use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Account that owns the sample catalog.
pub const DEMO_ACCOUNT_ID: &str = "demo";

const EXPECTED_COUNTS: &[(&str, &str, i64)] = &[
    ("demo-categories", "SELECT COUNT(1) FROM category WHERE account_id = ?1", 4),
    ("demo-products", "SELECT COUNT(1) FROM product WHERE account_id = ?1", 5),
    ("demo-sales", "SELECT COUNT(1) FROM sale WHERE account_id = ?1", 8),
    (
        "demo-sale-items",
        "SELECT COUNT(1) FROM sale_item si JOIN sale s ON s.id = si.sale_id
         WHERE s.account_id = ?1",
        9,
    ),
    ("demo-profile", "SELECT COUNT(1) FROM account_profile WHERE account_id = ?1", 1),
];

/// Demo inventory: five gaming products across four categories with a year
/// of sales, owned by [`DEMO_ACCOUNT_ID`].
pub struct SampleInventoryDataset;

impl SampleInventoryDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/sample_inventory.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            account_id: DEMO_ACCOUNT_ID,
            categories: count_for(pool, EXPECTED_COUNTS[0].1).await?,
            products: count_for(pool, EXPECTED_COUNTS[1].1).await?,
            sales: count_for(pool, EXPECTED_COUNTS[2].1).await?,
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(EXPECTED_COUNTS.len());

        for (label, sql, expected) in EXPECTED_COUNTS {
            let actual = count_for(pool, sql).await?;
            checks.push((*label, actual == *expected));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the demo account's records. Items and chat history cascade.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        for table in ["sale", "product", "category", "chat_session", "account_profile"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE account_id = ?1"))
                .bind(DEMO_ACCOUNT_ID)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn count_for(pool: &DbPool, sql: &str) -> Result<i64, RepositoryError> {
    let count: i64 = sqlx::query_scalar(sql).bind(DEMO_ACCOUNT_ID).fetch_one(pool).await?;
    Ok(count)
}

#[derive(Debug)]
pub struct SeedResult {
    pub account_id: &'static str,
    pub categories: i64,
    pub products: i64,
    pub sales: i64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
