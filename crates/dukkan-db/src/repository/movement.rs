//! # Stock Movement Ledger Repository
//!
//! Read access and append for the stock movement ledger - the source of
//! truth for `products.stock_quantity`.
//!
//! Rows are append-only: there is no update or delete here by design.
//! Corrections are opposite-signed `adjustment` movements.

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use dukkan_core::StockMovement;

const MOVEMENT_COLUMNS: &str =
    "id, business_id, product_id, amount, kind, document_id, description, created_at";

/// Repository for the stock movement ledger.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Lists a product's movement history, newest first.
    pub async fn list_for_product(
        &self,
        business_id: &str,
        product_id: &str,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE product_id = ? AND business_id = ? \
             ORDER BY created_at DESC"
        ))
        .bind(product_id)
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists all movements caused by one document (a sale or purchase).
    pub async fn list_for_document(
        &self,
        business_id: &str,
        document_id: &str,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE document_id = ? AND business_id = ? \
             ORDER BY created_at"
        ))
        .bind(document_id)
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Folds the ledger: the signed sum of all movements for a product.
    ///
    /// This is the value `products.stock_quantity` must always equal.
    pub async fn ledger_total(&self, business_id: &str, product_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM stock_movements \
             WHERE product_id = ? AND business_id = ?",
        )
        .bind(product_id)
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Counts ledger rows for a business (for diagnostics).
    pub async fn count(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE business_id = ?")
                .bind(business_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level writers (composed into processor transactions)
// =============================================================================

/// Appends one ledger row. Only the processors call this, always in the same
/// transaction as the matching stock delta.
pub(crate) async fn append_in(
    conn: &mut SqliteConnection,
    movement: &StockMovement,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO stock_movements ( \
            id, business_id, product_id, amount, kind, document_id, description, created_at \
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&movement.id)
    .bind(&movement.business_id)
    .bind(&movement.product_id)
    .bind(movement.amount)
    .bind(movement.kind)
    .bind(&movement.document_id)
    .bind(&movement.description)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Helper to generate a new movement ID.
pub fn generate_movement_id() -> String {
    Uuid::new_v4().to_string()
}
