//! # Bulk Import
//!
//! Ingests backup payloads (products plus a supplier name mapping) in chunks
//! of [`IMPORT_CHUNK_SIZE`] rows.
//!
//! ## The Invariant Stays Intact
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A naive import would write stock_quantity directly on the product     │
//! │  row - and break `stock == Σ movements` for every imported product.    │
//! │                                                                         │
//! │  This import inserts products with stock 0, then routes the opening    │
//! │  quantity through the movement ledger:                                 │
//! │                                                                         │
//! │    INSERT products            (stock_quantity = 0)                     │
//! │    UPDATE products            (stock_quantity += initial)              │
//! │    INSERT stock_movements     (kind = adjustment, "Initial stock")     │
//! │                                                                         │
//! │  all inside the chunk's transaction. Reconciliation is clean from      │
//! │  the first row.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::processor::EngineResult;
use crate::repository::movement as movement_repo;
use crate::repository::product as product_repo;
use crate::repository::supplier as supplier_repo;
use crate::repository::supplier::SupplierRepository;
use dukkan_core::{
    BusinessContext, Capability, MovementKind, Product, StockMovement, IMPORT_CHUNK_SIZE,
};

// =============================================================================
// Payload Types
// =============================================================================

/// One product row from a backup payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportProduct {
    pub name: String,
    /// Generated when absent (backups from older versions lack codes).
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Key into the batch's supplier mapping.
    #[serde(default)]
    pub supplier_key: Option<String>,
    #[serde(default)]
    pub buying_price_minor: i64,
    #[serde(default)]
    pub selling_price_minor: i64,
    /// Opening stock, applied through the movement ledger.
    #[serde(default)]
    pub initial_stock: i64,
}

/// How one supplier key from the payload maps into this business.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SupplierTarget {
    /// Use an existing supplier.
    Existing { id: String },
    /// Create a supplier with this name (reused if the name already exists).
    Create { name: String },
}

/// A full import batch: product rows plus the supplier mapping resolved by
/// the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub products: Vec<ImportProduct>,
    #[serde(default)]
    pub supplier_mapping: HashMap<String, SupplierTarget>,
}

/// What an import run did.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub products_imported: usize,
    pub suppliers_created: usize,
    /// One per product with a non-zero opening stock.
    pub movements_emitted: usize,
}

// =============================================================================
// Import Service
// =============================================================================

/// Chunked bulk import service.
#[derive(Debug, Clone)]
pub struct ImportService {
    pool: SqlitePool,
}

impl ImportService {
    /// Creates a new ImportService.
    pub fn new(pool: SqlitePool) -> Self {
        ImportService { pool }
    }

    /// Imports a batch of products.
    ///
    /// Suppliers are resolved first (creating the mapped-to-new ones), then
    /// products are written in chunks of [`IMPORT_CHUNK_SIZE`]; each chunk
    /// is one transaction, and opening stock goes through the movement
    /// ledger so the stock invariant holds by construction.
    ///
    /// ## Errors
    /// - `Access` - role may not import data
    /// - `Db(NotFound)` - mapping references an unknown supplier id
    /// - `Db(UniqueViolation)` - duplicate product code in this business
    pub async fn import_products(
        &self,
        ctx: &BusinessContext,
        batch: ImportBatch,
    ) -> EngineResult<ImportReport> {
        ctx.authorize(Capability::ImportData)?;

        let mut report = ImportReport::default();

        let supplier_ids = self
            .resolve_suppliers(ctx, &batch.supplier_mapping, &mut report)
            .await?;

        for chunk in batch.products.chunks(IMPORT_CHUNK_SIZE) {
            self.import_chunk(ctx, chunk, &supplier_ids, &mut report)
                .await?;
        }

        info!(
            business = %ctx.business_id,
            products = report.products_imported,
            suppliers = report.suppliers_created,
            movements = report.movements_emitted,
            "import finished"
        );

        Ok(report)
    }

    /// Resolves the payload's supplier keys to real supplier ids.
    async fn resolve_suppliers(
        &self,
        ctx: &BusinessContext,
        mapping: &HashMap<String, SupplierTarget>,
        report: &mut ImportReport,
    ) -> EngineResult<HashMap<String, String>> {
        let suppliers = SupplierRepository::new(self.pool.clone());
        let mut resolved = HashMap::new();

        for (key, target) in mapping {
            let supplier_id = match target {
                SupplierTarget::Existing { id } => {
                    suppliers
                        .get_by_id(&ctx.business_id, id)
                        .await?
                        .ok_or_else(|| DbError::not_found("Supplier", id))?;
                    id.clone()
                }
                SupplierTarget::Create { name } => {
                    let name = name.trim().to_uppercase();
                    match suppliers.get_by_name(&ctx.business_id, &name).await? {
                        Some(existing) => existing.id,
                        None => {
                            let supplier = supplier_repo::new_supplier(
                                &ctx.business_id,
                                &name,
                                None,
                                Some("Imported from backup".to_string()),
                            );
                            suppliers.insert(&supplier).await?;
                            report.suppliers_created += 1;
                            supplier.id
                        }
                    }
                }
            };

            resolved.insert(key.clone(), supplier_id);
        }

        Ok(resolved)
    }

    /// Writes one chunk of products in a single transaction.
    async fn import_chunk(
        &self,
        ctx: &BusinessContext,
        chunk: &[ImportProduct],
        supplier_ids: &HashMap<String, String>,
        report: &mut ImportReport,
    ) -> DbResult<()> {
        debug!(size = chunk.len(), "importing product chunk");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for row in chunk {
            let product_code = match &row.product_code {
                Some(code) if !code.trim().is_empty() => code.trim().to_uppercase(),
                _ => row
                    .barcode
                    .clone()
                    .unwrap_or_else(generated_product_code),
            };

            let product = Product {
                id: product_repo::generate_product_id(),
                business_id: ctx.business_id.clone(),
                name: row.name.trim().to_uppercase(),
                product_code,
                barcode: row.barcode.clone(),
                supplier_id: row
                    .supplier_key
                    .as_ref()
                    .and_then(|key| supplier_ids.get(key).cloned()),
                category: row.category.clone(),
                buying_price_minor: row.buying_price_minor,
                selling_price_minor: row.selling_price_minor,
                stock_quantity: 0,
                critical_stock_level: 0,
                created_at: now,
                updated_at: now,
            };

            product_repo::insert_in(&mut tx, &product).await?;
            report.products_imported += 1;

            if row.initial_stock != 0 {
                product_repo::apply_stock_delta(
                    &mut tx,
                    &ctx.business_id,
                    &product.id,
                    row.initial_stock,
                )
                .await?;

                let movement = StockMovement {
                    id: movement_repo::generate_movement_id(),
                    business_id: ctx.business_id.clone(),
                    product_id: product.id.clone(),
                    amount: row.initial_stock,
                    kind: MovementKind::Adjustment,
                    document_id: None,
                    description: Some("Initial stock (import)".to_string()),
                    created_at: now,
                };
                movement_repo::append_in(&mut tx, &movement).await?;
                report.movements_emitted += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }
}

/// Fallback code for rows without a product code or barcode.
fn generated_product_code() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("GEN-{}", &suffix[..8].to_uppercase())
}
