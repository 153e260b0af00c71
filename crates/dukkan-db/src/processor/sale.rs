//! # Sale Transaction Processor
//!
//! Commits a sale draft as one unit of work.
//!
//! ## What One Commit Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit_sale(ctx, draft)                                               │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    INSERT sales            (header, status = completed)                │
//! │    for each line:                                                      │
//! │      INSERT sale_items     (name/price snapshot, clamped discount)     │
//! │      UPDATE products       (stock_quantity -= quantity)                │
//! │      INSERT stock_movements(amount = -quantity, kind = sale)           │
//! │    if on_account:                                                      │
//! │      UPDATE customers      (balance += final_amount)                   │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  N lines → exactly N movements (+ 1 balance delta if on_account),      │
//! │  or zero rows on any failure. Never N−1 of N.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbError;
use crate::processor::{EngineError, EngineResult, OversellPolicy};
use crate::repository::customer as customer_repo;
use crate::repository::movement as movement_repo;
use crate::repository::product as product_repo;
use crate::repository::sale as sale_repo;
use dukkan_core::validation::validate_sale_draft;
use dukkan_core::{
    BusinessContext, Capability, MovementKind, PaymentMethod, Sale, SaleDraft, SaleItem,
    SaleStatus, StockMovement,
};

/// Processor for committing sales.
#[derive(Debug, Clone)]
pub struct SaleProcessor {
    pool: SqlitePool,
    oversell: OversellPolicy,
}

impl SaleProcessor {
    /// Creates a new SaleProcessor with the default (permissive) policy.
    pub fn new(pool: SqlitePool) -> Self {
        SaleProcessor {
            pool,
            oversell: OversellPolicy::default(),
        }
    }

    /// Overrides the oversell policy (builder style).
    pub fn with_oversell_policy(mut self, policy: OversellPolicy) -> Self {
        self.oversell = policy;
        self
    }

    /// Commits a sale draft.
    ///
    /// ## Guarantees
    /// - Validation and capability checks fail before any write.
    /// - All writes land in one transaction: the header, every line, every
    ///   stock movement and the on-account balance delta become visible
    ///   together or not at all.
    /// - On failure the caller's draft is untouched and may be resubmitted.
    ///
    /// ## Errors
    /// - `Validation` - empty draft, bad quantities, missing customer
    /// - `Access` - role may not record sales
    /// - `InsufficientStock` - blocking policy and not enough stock
    /// - `Db(NotFound)` - unknown product or customer
    pub async fn commit_sale(&self, ctx: &BusinessContext, draft: SaleDraft) -> EngineResult<Sale> {
        ctx.authorize(Capability::RecordSale)?;
        validate_sale_draft(&draft)?;

        debug!(
            business = %ctx.business_id,
            lines = draft.lines.len(),
            method = ?draft.payment_method,
            "committing sale"
        );

        let now = Utc::now();
        let sale_id = sale_repo::generate_sale_id();

        let sale = Sale {
            id: sale_id.clone(),
            business_id: ctx.business_id.clone(),
            customer_id: draft.customer_id.clone(),
            total_amount_minor: draft.total_amount().minor(),
            final_amount_minor: draft.final_amount().minor(),
            payment_method: draft.payment_method,
            status: SaleStatus::Completed,
            created_at: now,
        };

        // Everything below is one unit of work. An early return drops the
        // transaction, which rolls it back.
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        sale_repo::insert_sale_in(&mut tx, &sale).await?;

        for line in &draft.lines {
            let product = product_repo::get_in(&mut tx, &ctx.business_id, &line.product_id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", &line.product_id))?;

            let item = SaleItem {
                id: sale_repo::generate_sale_item_id(),
                sale_id: sale_id.clone(),
                business_id: ctx.business_id.clone(),
                product_id: line.product_id.clone(),
                product_name: product.name.clone(),
                quantity: line.quantity,
                price_minor: line.price.minor(),
                discount_minor: line.effective_discount().minor(),
                total_minor: line.total().minor(),
                created_at: now,
            };
            sale_repo::insert_item_in(&mut tx, &item).await?;

            self.decrement_stock(&mut tx, ctx, &line.product_id, line.quantity)
                .await?;

            let movement = StockMovement {
                id: movement_repo::generate_movement_id(),
                business_id: ctx.business_id.clone(),
                product_id: line.product_id.clone(),
                amount: -line.quantity,
                kind: MovementKind::Sale,
                document_id: Some(sale_id.clone()),
                description: Some(format!("Sale #{}", &sale_id[..8])),
                created_at: now,
            };
            movement_repo::append_in(&mut tx, &movement).await?;
        }

        if draft.payment_method == PaymentMethod::OnAccount {
            // Validation guarantees customer_id is present for on-account.
            let customer_id = draft
                .customer_id
                .as_deref()
                .ok_or(dukkan_core::ValidationError::CustomerRequired {
                    method: draft.payment_method,
                })?;

            customer_repo::apply_balance_delta(
                &mut tx,
                &ctx.business_id,
                customer_id,
                sale.final_amount_minor,
            )
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            final_amount = %sale.final_amount(),
            lines = draft.lines.len(),
            method = ?sale.payment_method,
            "sale committed"
        );

        Ok(sale)
    }

    /// Applies one line's stock decrement according to the oversell policy.
    async fn decrement_stock(
        &self,
        tx: &mut sqlx::SqliteConnection,
        ctx: &BusinessContext,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<()> {
        match self.oversell {
            OversellPolicy::Allow => {
                product_repo::apply_stock_delta(tx, &ctx.business_id, product_id, -quantity)
                    .await?;
                Ok(())
            }
            OversellPolicy::Block => {
                let applied =
                    product_repo::try_decrement_stock(tx, &ctx.business_id, product_id, quantity)
                        .await?;
                if applied {
                    Ok(())
                } else {
                    let available =
                        product_repo::current_stock(tx, &ctx.business_id, product_id).await?;
                    Err(EngineError::InsufficientStock {
                        product_id: product_id.to_string(),
                        available,
                        requested: quantity,
                    })
                }
            }
        }
    }
}
