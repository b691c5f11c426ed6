use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite};

use stocktalk_core::currency::parse_amount;
use stocktalk_core::domain::account::AccountId;
use stocktalk_core::domain::product::{Category, CategoryId, CategoryRef, Product, ProductId};
use stocktalk_core::domain::sale::{DateRange, Sale, SaleId, SaleItem};

use super::{format_timestamp, parse_timestamp, InventoryRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInventoryRepository {
    pool: DbPool,
}

impl SqlInventoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_product(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let category_id: Option<String> = column(row, "category_id")?;
    let category_name: Option<String> = column(row, "category_name")?;
    let category = match (category_id, category_name) {
        (Some(id), Some(name)) => Some(CategoryRef { id: CategoryId(id), name }),
        _ => None,
    };
    let price: String = column(row, "price")?;
    let cost: String = column(row, "cost")?;
    let created_at: String = column(row, "created_at")?;
    let updated_at: String = column(row, "updated_at")?;

    Ok(Product {
        id: ProductId(column(row, "id")?),
        account_id: AccountId(column(row, "account_id")?),
        name: column(row, "name")?,
        sku: column(row, "sku")?,
        category,
        description: column(row, "description")?,
        price: parse_amount(&price),
        cost: parse_amount(&cost),
        quantity: column(row, "quantity")?,
        minimum_stock: column(row, "minimum_stock")?,
        maximum_stock: column(row, "maximum_stock")?,
        location: column(row, "location")?,
        supplier: column(row, "supplier")?,
        status: column(row, "status")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_category(row: &SqliteRow) -> Result<Category, RepositoryError> {
    let created_at: String = column(row, "created_at")?;
    Ok(Category {
        id: CategoryId(column(row, "id")?),
        account_id: AccountId(column(row, "account_id")?),
        name: column(row, "name")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn row_to_item(row: &SqliteRow) -> Result<Option<SaleItem>, RepositoryError> {
    let product_id: Option<String> = column(row, "product_id")?;
    let Some(product_id) = product_id else {
        return Ok(None);
    };
    let product_name: Option<String> = column(row, "product_name")?;
    let unit_price: Option<String> = column(row, "unit_price")?;
    let quantity: Option<i64> = column(row, "item_quantity")?;

    Ok(Some(SaleItem {
        product_id: ProductId(product_id),
        product_name: product_name.unwrap_or_default(),
        category_name: column(row, "category_name")?,
        quantity: quantity.unwrap_or_default(),
        unit_price: unit_price.as_deref().map(parse_amount).unwrap_or_default(),
    }))
}

/// Folds the sale/item join back into one `Sale` per sale id. Rows arrive
/// grouped by sale.
fn rows_to_sales(rows: &[SqliteRow]) -> Result<Vec<Sale>, RepositoryError> {
    let mut sales: Vec<Sale> = Vec::new();

    for row in rows {
        let id: String = column(row, "id")?;
        let item = row_to_item(row)?;

        if let Some(current) = sales.last_mut().filter(|sale| sale.id.0 == id) {
            current.items.extend(item);
            continue;
        }

        let total_amount: String = column(row, "total_amount")?;
        let sale_date: String = column(row, "sale_date")?;
        sales.push(Sale {
            id: SaleId(id),
            account_id: AccountId(column(row, "account_id")?),
            total_amount: parse_amount(&total_amount),
            sale_date: parse_timestamp(&sale_date)?,
            payment_method: column(row, "payment_method")?,
            items: item.into_iter().collect(),
        });
    }

    Ok(sales)
}

#[async_trait::async_trait]
impl InventoryRepository for SqlInventoryRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        crate::connection::ping(&self.pool).await?;
        Ok(())
    }

    async fn list_products(
        &self,
        account: &AccountId,
        query: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT p.id, p.account_id, p.name, p.sku, p.description, p.price, p.cost,
                    p.quantity, p.minimum_stock, p.maximum_stock, p.location, p.supplier,
                    p.status, p.created_at, p.updated_at, p.category_id,
                    c.name AS category_name
             FROM product p
             LEFT JOIN category c ON c.id = p.category_id
             WHERE p.account_id = ?
             ORDER BY p.created_at ASC, p.rowid ASC",
        )
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await?;

        // SQLite's lower() only folds ASCII, so matching happens on decoded rows.
        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            if limit.is_some_and(|limit| products.len() >= limit) {
                break;
            }
            let product = row_to_product(row)?;
            if query.map_or(true, |query| product.matches_query(query)) {
                products.push(product);
            }
        }

        Ok(products)
    }

    async fn list_categories(&self, account: &AccountId) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, account_id, name, created_at
             FROM category
             WHERE account_id = ?
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_category).collect()
    }

    async fn list_sales(
        &self,
        account: &AccountId,
        range: Option<DateRange>,
    ) -> Result<Vec<Sale>, RepositoryError> {
        let start = range.map(|range| format_timestamp(range.start));
        let end = range.map(|range| format_timestamp(range.end));

        let rows = sqlx::query(
            "SELECT s.id, s.account_id, s.total_amount, s.sale_date, s.payment_method,
                    si.product_id, si.quantity AS item_quantity, si.unit_price,
                    p.name AS product_name, c.name AS category_name
             FROM sale s
             LEFT JOIN sale_item si ON si.sale_id = s.id
             LEFT JOIN product p ON p.id = si.product_id
             LEFT JOIN category c ON c.id = p.category_id
             WHERE s.account_id = ?1
               AND (?2 IS NULL OR s.sale_date >= ?2)
               AND (?3 IS NULL OR s.sale_date < ?3)
             ORDER BY s.sale_date ASC, s.id ASC, si.rowid ASC",
        )
        .bind(account.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows_to_sales(&rows)
    }

    async fn currency_preference(
        &self,
        account: &AccountId,
    ) -> Result<Option<String>, RepositoryError> {
        let currency = sqlx::query_scalar::<_, String>(
            "SELECT currency FROM account_profile WHERE account_id = ?",
        )
        .bind(account.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(currency)
    }
}
