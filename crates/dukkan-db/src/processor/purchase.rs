//! # Purchase Transaction Processor
//!
//! Commits a supplier invoice as one unit of work: header, lines, one
//! positive stock movement per line, and the supplier balance delta.
//!
//! Deliberately does NOT write `products.buying_price_minor` - the cost
//! actually paid lives on the purchase item, and the profit summary accepts
//! the product's current buying price as its cost approximation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbError;
use crate::processor::EngineResult;
use crate::repository::movement as movement_repo;
use crate::repository::product as product_repo;
use crate::repository::purchase as purchase_repo;
use crate::repository::supplier as supplier_repo;
use dukkan_core::validation::validate_purchase_draft;
use dukkan_core::{
    BusinessContext, Capability, MovementKind, Purchase, PurchaseDraft, PurchaseItem,
    StockMovement,
};

/// Processor for committing purchases.
#[derive(Debug, Clone)]
pub struct PurchaseProcessor {
    pool: SqlitePool,
}

impl PurchaseProcessor {
    /// Creates a new PurchaseProcessor.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseProcessor { pool }
    }

    /// Commits a purchase draft.
    ///
    /// ## Guarantees
    /// - Validation, capability and supplier existence checks fail before
    ///   any write.
    /// - Header, lines, N stock movements and the supplier balance delta
    ///   become visible together or not at all.
    ///
    /// ## Errors
    /// - `Validation` - empty draft, bad quantities or costs
    /// - `Access` - role may not record purchases
    /// - `Db(NotFound)` - unknown supplier or product
    pub async fn commit_purchase(
        &self,
        ctx: &BusinessContext,
        draft: PurchaseDraft,
    ) -> EngineResult<Purchase> {
        ctx.authorize(Capability::RecordPurchase)?;
        validate_purchase_draft(&draft)?;

        // Pre-read: reject an unknown supplier before opening the unit of work.
        let supplier = supplier_repo::SupplierRepository::new(self.pool.clone())
            .get_by_id(&ctx.business_id, &draft.supplier_id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", &draft.supplier_id))?;

        debug!(
            business = %ctx.business_id,
            supplier = %supplier.name,
            lines = draft.lines.len(),
            "committing purchase"
        );

        let now = Utc::now();
        let purchase_id = purchase_repo::generate_purchase_id();

        let purchase = Purchase {
            id: purchase_id.clone(),
            business_id: ctx.business_id.clone(),
            supplier_id: draft.supplier_id.clone(),
            invoice_no: draft.invoice_no.clone(),
            date: draft.date,
            total_amount_minor: draft.total_amount().minor(),
            created_at: now,
        };

        let movement_description = match &draft.invoice_no {
            Some(no) => format!("Purchase invoice {no}"),
            None => format!("Purchase #{}", &purchase_id[..8]),
        };

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        purchase_repo::insert_purchase_in(&mut tx, &purchase).await?;

        for line in &draft.lines {
            let item = PurchaseItem {
                id: purchase_repo::generate_purchase_item_id(),
                purchase_id: purchase_id.clone(),
                business_id: ctx.business_id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                cost_price_minor: line.cost_price.minor(),
                total_minor: line.total().minor(),
            };
            purchase_repo::insert_item_in(&mut tx, &item).await?;

            // Stock in: always a plain relative update, purchases cannot
            // "oversell".
            product_repo::apply_stock_delta(
                &mut tx,
                &ctx.business_id,
                &line.product_id,
                line.quantity,
            )
            .await?;

            let movement = StockMovement {
                id: movement_repo::generate_movement_id(),
                business_id: ctx.business_id.clone(),
                product_id: line.product_id.clone(),
                amount: line.quantity,
                kind: MovementKind::Purchase,
                document_id: Some(purchase_id.clone()),
                description: Some(movement_description.clone()),
                created_at: now,
            };
            movement_repo::append_in(&mut tx, &movement).await?;
        }

        supplier_repo::apply_balance_delta(
            &mut tx,
            &ctx.business_id,
            &draft.supplier_id,
            purchase.total_amount_minor,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            purchase_id = %purchase.id,
            total = %purchase.total_amount(),
            lines = draft.lines.len(),
            "purchase committed"
        );

        Ok(purchase)
    }
}
