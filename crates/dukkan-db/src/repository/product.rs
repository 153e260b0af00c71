//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: Absolute update (read-modify-write race)                     │
//! │     UPDATE products SET stock_quantity = 7 WHERE id = ?                │
//! │                                                                         │
//! │  ✅ CORRECT: Relative update (storage-level atomic increment)           │
//! │     UPDATE products SET stock_quantity = stock_quantity - 3            │
//! │                                                                         │
//! │  Session A: sells 3 → stock - 3                                        │
//! │  Session B: sells 2 → stock - 2                                        │
//! │  Any interleaving ends at -5 total; no decrement is ever lost.         │
//! │                                                                         │
//! │  Both writers run inside the transaction that appends the matching     │
//! │  stock_movements row, so the cache can never drift from the ledger.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dukkan_core::Product;

const PRODUCT_COLUMNS: &str = "id, business_id, name, product_code, barcode, supplier_id, \
     category, buying_price_minor, selling_price_minor, stock_quantity, \
     critical_stock_level, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID, scoped to a business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ? AND business_id = ?"
        ))
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its business code.
    pub async fn get_by_code(&self, business_id: &str, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_code = ? AND business_id = ?"
        ))
        .bind(code)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products of a business, ordered by name.
    pub async fn list(&self, business_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE business_id = ? ORDER BY name"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists products whose cached stock is at or below their critical level.
    ///
    /// Oversell is permitted, so low/negative stock is surfaced as a warning
    /// list rather than being rejected at sale time.
    pub async fn below_critical(&self, business_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE business_id = ? AND stock_quantity <= critical_stock_level \
             ORDER BY stock_quantity ASC"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - product code already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(code = %product.product_code, "inserting product");

        let mut conn = self.pool.acquire().await?;
        insert_in(&mut conn, product).await
    }

    /// Updates product master data (name, codes, prices, critical level).
    ///
    /// Deliberately does NOT touch `stock_quantity` - that column belongs to
    /// the movement ledger.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET \
                name = ?, product_code = ?, barcode = ?, supplier_id = ?, \
                category = ?, buying_price_minor = ?, selling_price_minor = ?, \
                critical_stock_level = ?, updated_at = ? \
             WHERE id = ? AND business_id = ?",
        )
        .bind(&product.name)
        .bind(&product.product_code)
        .bind(&product.barcode)
        .bind(&product.supplier_id)
        .bind(&product.category)
        .bind(product.buying_price_minor)
        .bind(product.selling_price_minor)
        .bind(product.critical_stock_level)
        .bind(now)
        .bind(&product.id)
        .bind(&product.business_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Counts products of a business (for diagnostics).
    pub async fn count(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE business_id = ?")
                .bind(business_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level writers (composed into processor transactions)
// =============================================================================

/// Inserts a product on an explicit connection (used by bulk import chunks).
pub(crate) async fn insert_in(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO products ( \
            id, business_id, name, product_code, barcode, supplier_id, \
            category, buying_price_minor, selling_price_minor, stock_quantity, \
            critical_stock_level, created_at, updated_at \
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&product.id)
    .bind(&product.business_id)
    .bind(&product.name)
    .bind(&product.product_code)
    .bind(&product.barcode)
    .bind(&product.supplier_id)
    .bind(&product.category)
    .bind(product.buying_price_minor)
    .bind(product.selling_price_minor)
    .bind(product.stock_quantity)
    .bind(product.critical_stock_level)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Fetches a product on an explicit connection (for in-transaction
/// snapshots: the sale processor freezes the name and checks existence
/// inside its own unit of work).
pub(crate) async fn get_in(
    conn: &mut SqliteConnection,
    business_id: &str,
    id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ? AND business_id = ?"
    ))
    .bind(id)
    .bind(business_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Applies a signed stock delta as a relative update.
///
/// ## Errors
/// * `DbError::NotFound` - no such product in this business
pub(crate) async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    business_id: &str,
    product_id: &str,
    delta: i64,
) -> DbResult<()> {
    debug!(id = %product_id, delta = %delta, "applying stock delta");

    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE products \
         SET stock_quantity = stock_quantity + ?, updated_at = ? \
         WHERE id = ? AND business_id = ?",
    )
    .bind(delta)
    .bind(now)
    .bind(product_id)
    .bind(business_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }

    Ok(())
}

/// Guarded decrement for blocking oversell: only applies when enough stock
/// remains. The check and the write are one statement, so two concurrent
/// sales against the last unit cannot both succeed.
///
/// ## Returns
/// * `Ok(true)` - stock was decremented
/// * `Ok(false)` - product exists but stock was insufficient
/// * `Err(DbError::NotFound)` - no such product in this business
pub(crate) async fn try_decrement_stock(
    conn: &mut SqliteConnection,
    business_id: &str,
    product_id: &str,
    quantity: i64,
) -> DbResult<bool> {
    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE products \
         SET stock_quantity = stock_quantity - ?, updated_at = ? \
         WHERE id = ? AND business_id = ? AND stock_quantity >= ?",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .bind(business_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(true);
    }

    // Distinguish "not enough stock" from "no such product"
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM products WHERE id = ? AND business_id = ?")
            .bind(product_id)
            .bind(business_id)
            .fetch_optional(&mut *conn)
            .await?;

    if exists.is_none() {
        return Err(DbError::not_found("Product", product_id));
    }

    Ok(false)
}

/// Reads the cached stock level inside a transaction (for error reporting).
pub(crate) async fn current_stock(
    conn: &mut SqliteConnection,
    business_id: &str,
    product_id: &str,
) -> DbResult<i64> {
    let stock: Option<i64> =
        sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ? AND business_id = ?")
            .bind(product_id)
            .bind(business_id)
            .fetch_optional(&mut *conn)
            .await?;

    stock.ok_or_else(|| DbError::not_found("Product", product_id))
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
