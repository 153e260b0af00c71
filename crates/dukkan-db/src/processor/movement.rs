//! # Stock Movement Processor
//!
//! The standalone `process_stock_movement` procedure: append one ledger row
//! and adjust the cached stock, atomically. Sales and purchases emit their
//! movements inside their own transactions; this processor is for everything
//! else - manual adjustments, returns, initial stock corrections.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbError;
use crate::processor::EngineResult;
use crate::repository::movement as movement_repo;
use crate::repository::product as product_repo;
use dukkan_core::validation::validate_movement_amount;
use dukkan_core::{BusinessContext, Capability, MovementKind, StockMovement};

/// Input for a standalone stock movement.
#[derive(Debug, Clone)]
pub struct MovementInput {
    pub product_id: String,
    /// Signed quantity: positive = stock in, negative = stock out.
    pub amount: i64,
    pub kind: MovementKind,
    /// The causing document, if any.
    pub document_id: Option<String>,
    pub description: Option<String>,
}

/// Processor for standalone stock movements.
#[derive(Debug, Clone)]
pub struct MovementProcessor {
    pool: SqlitePool,
}

impl MovementProcessor {
    /// Creates a new MovementProcessor.
    pub fn new(pool: SqlitePool) -> Self {
        MovementProcessor { pool }
    }

    /// Appends one movement and adjusts `stock_quantity` atomically.
    ///
    /// No floor check: adjustments may drive stock negative on purpose
    /// (e.g. recording shrinkage discovered at inventory count).
    ///
    /// ## Errors
    /// - `Validation` - zero amount
    /// - `Access` - role may not adjust stock
    /// - `Db(NotFound)` - unknown product
    pub async fn process_stock_movement(
        &self,
        ctx: &BusinessContext,
        input: MovementInput,
    ) -> EngineResult<StockMovement> {
        ctx.authorize(Capability::AdjustStock)?;
        validate_movement_amount(input.amount)?;

        let movement = StockMovement {
            id: movement_repo::generate_movement_id(),
            business_id: ctx.business_id.clone(),
            product_id: input.product_id.clone(),
            amount: input.amount,
            kind: input.kind,
            document_id: input.document_id,
            description: input.description,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // The relative update doubles as the existence check.
        product_repo::apply_stock_delta(&mut tx, &ctx.business_id, &input.product_id, input.amount)
            .await?;
        movement_repo::append_in(&mut tx, &movement).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            product_id = %movement.product_id,
            amount = %movement.amount,
            kind = ?movement.kind,
            "stock movement recorded"
        );

        Ok(movement)
    }
}
