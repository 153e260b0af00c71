//! # Purchase Repository
//!
//! Read access for supplier invoices and connection-level writers used by
//! the purchase processor.

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use dukkan_core::{Purchase, PurchaseItem};

const PURCHASE_COLUMNS: &str =
    "id, business_id, supplier_id, invoice_no, date, total_amount_minor, created_at";

const PURCHASE_ITEM_COLUMNS: &str =
    "id, purchase_id, business_id, product_id, quantity, cost_price_minor, total_minor";

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Gets a purchase by ID, scoped to a business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Purchase>> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ? AND business_id = ?"
        ))
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase)
    }

    /// Gets all items of a purchase.
    pub async fn items(&self, purchase_id: &str) -> DbResult<Vec<PurchaseItem>> {
        let items = sqlx::query_as::<_, PurchaseItem>(&format!(
            "SELECT {PURCHASE_ITEM_COLUMNS} FROM purchase_items WHERE purchase_id = ?"
        ))
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists purchases of a business, newest invoice date first.
    pub async fn list(&self, business_id: &str, limit: u32) -> DbResult<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases \
             WHERE business_id = ? ORDER BY date DESC, created_at DESC LIMIT ?"
        ))
        .bind(business_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    /// Sum of invoice totals for one supplier.
    ///
    /// Used by reconciliation to re-derive the supplier balance.
    pub async fn total_for_supplier(&self, business_id: &str, supplier_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_amount_minor) FROM purchases \
             WHERE supplier_id = ? AND business_id = ?",
        )
        .bind(supplier_id)
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }
}

// =============================================================================
// Connection-level writers (composed into processor transactions)
// =============================================================================

/// Inserts the purchase header.
pub(crate) async fn insert_purchase_in(
    conn: &mut SqliteConnection,
    purchase: &Purchase,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO purchases ( \
            id, business_id, supplier_id, invoice_no, date, total_amount_minor, created_at \
         ) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&purchase.id)
    .bind(&purchase.business_id)
    .bind(&purchase.supplier_id)
    .bind(&purchase.invoice_no)
    .bind(purchase.date)
    .bind(purchase.total_amount_minor)
    .bind(purchase.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts one purchase line.
pub(crate) async fn insert_item_in(
    conn: &mut SqliteConnection,
    item: &PurchaseItem,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO purchase_items ( \
            id, purchase_id, business_id, product_id, quantity, cost_price_minor, total_minor \
         ) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&item.id)
    .bind(&item.purchase_id)
    .bind(&item.business_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.cost_price_minor)
    .bind(item.total_minor)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Helper to generate a new purchase ID.
pub fn generate_purchase_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new purchase item ID.
pub fn generate_purchase_item_id() -> String {
    Uuid::new_v4().to_string()
}
