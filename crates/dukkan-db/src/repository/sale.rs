//! # Sale Repository
//!
//! Read access for committed sales and connection-level writers used by the
//! sale processor. Sales are written once with status `completed`; there is
//! no update path here.

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use dukkan_core::{Sale, SaleItem};

const SALE_COLUMNS: &str = "id, business_id, customer_id, total_amount_minor, \
     final_amount_minor, payment_method, status, created_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, business_id, product_id, product_name, \
     quantity, price_minor, discount_minor, total_minor, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID, scoped to a business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ? AND business_id = ?"
        ))
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items of a sale.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ? ORDER BY created_at"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists recent sales of a business, newest first.
    pub async fn list_recent(&self, business_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE business_id = ? ORDER BY created_at DESC LIMIT ?"
        ))
        .bind(business_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists all sales attached to a customer, newest first.
    pub async fn list_for_customer(
        &self,
        business_id: &str,
        customer_id: &str,
    ) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE customer_id = ? AND business_id = ? ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Sum of completed on-account sale amounts for one customer.
    ///
    /// Used by reconciliation to re-derive the customer balance.
    pub async fn on_account_total(&self, business_id: &str, customer_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(final_amount_minor) FROM sales \
             WHERE customer_id = ? AND business_id = ? \
               AND payment_method = 'on_account' AND status = 'completed'",
        )
        .bind(customer_id)
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Counts sales of a business (for diagnostics).
    pub async fn count(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE business_id = ?")
            .bind(business_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level writers (composed into processor transactions)
// =============================================================================

/// Inserts the sale header.
pub(crate) async fn insert_sale_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO sales ( \
            id, business_id, customer_id, total_amount_minor, final_amount_minor, \
            payment_method, status, created_at \
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&sale.id)
    .bind(&sale.business_id)
    .bind(&sale.customer_id)
    .bind(sale.total_amount_minor)
    .bind(sale.final_amount_minor)
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts one sale line.
///
/// ## Snapshot Pattern
/// The product name and unit price are copied onto the item, so the sale
/// history survives later product edits.
pub(crate) async fn insert_item_in(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO sale_items ( \
            id, sale_id, business_id, product_id, product_name, \
            quantity, price_minor, discount_minor, total_minor, created_at \
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.business_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.price_minor)
    .bind(item.discount_minor)
    .bind(item.total_minor)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Helper to generate a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}
