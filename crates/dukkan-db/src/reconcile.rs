//! # Ledger Reconciliation
//!
//! Re-derives every cached balance from its ledger and reports drift.
//!
//! The caches are maintained by the same transactions that append ledger
//! rows, so under normal operation this job finds nothing. It exists to
//! catch the abnormal: manual database edits, restored backups, bugs. It
//! only reports - repairing a balance is a deliberate human action (an
//! `adjustment` movement or a correcting transaction), never automatic.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::processor::EngineResult;
use crate::repository::account::AccountRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::movement::MovementRepository;
use crate::repository::product::ProductRepository;
use crate::repository::purchase::PurchaseRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::supplier::SupplierRepository;
use dukkan_core::{BusinessContext, Capability};

/// Which cached balance drifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftEntity {
    ProductStock,
    CustomerBalance,
    SupplierBalance,
    AccountBalance,
}

/// One cache that no longer matches the fold of its ledger.
#[derive(Debug, Clone)]
pub struct Drift {
    pub entity: DriftEntity,
    pub id: String,
    pub name: String,
    /// What the cache column says.
    pub cached: i64,
    /// What the ledger says it should be.
    pub derived: i64,
}

impl Drift {
    /// `cached − derived`; zero never appears in a report.
    pub fn difference(&self) -> i64 {
        self.cached - self.derived
    }
}

/// Read-only drift detector.
#[derive(Debug, Clone)]
pub struct Reconciler {
    pool: SqlitePool,
}

impl Reconciler {
    /// Creates a new Reconciler.
    pub fn new(pool: SqlitePool) -> Self {
        Reconciler { pool }
    }

    /// Checks every cached balance of the business against its ledger.
    ///
    /// Returns the list of drifting caches; an empty list means every
    /// invariant holds.
    pub async fn run(&self, ctx: &BusinessContext) -> EngineResult<Vec<Drift>> {
        ctx.authorize(Capability::ViewReports)?;

        let mut drifts = Vec::new();

        self.check_stock(ctx, &mut drifts).await?;
        self.check_customers(ctx, &mut drifts).await?;
        self.check_suppliers(ctx, &mut drifts).await?;
        self.check_accounts(ctx, &mut drifts).await?;

        if drifts.is_empty() {
            info!(business = %ctx.business_id, "reconciliation clean");
        } else {
            warn!(
                business = %ctx.business_id,
                count = drifts.len(),
                "reconciliation found drift"
            );
        }

        Ok(drifts)
    }

    /// `products.stock_quantity` vs Σ movements.
    async fn check_stock(&self, ctx: &BusinessContext, out: &mut Vec<Drift>) -> EngineResult<()> {
        let products = ProductRepository::new(self.pool.clone())
            .list(&ctx.business_id)
            .await?;
        let movements = MovementRepository::new(self.pool.clone());

        for product in products {
            let derived = movements
                .ledger_total(&ctx.business_id, &product.id)
                .await?;

            if product.stock_quantity != derived {
                out.push(Drift {
                    entity: DriftEntity::ProductStock,
                    id: product.id,
                    name: product.name,
                    cached: product.stock_quantity,
                    derived,
                });
            }
        }

        Ok(())
    }

    /// `customers.balance_minor` vs Σ on-account sales − Σ payments.
    async fn check_customers(
        &self,
        ctx: &BusinessContext,
        out: &mut Vec<Drift>,
    ) -> EngineResult<()> {
        let customers = CustomerRepository::new(self.pool.clone());
        let sales = SaleRepository::new(self.pool.clone());

        for customer in customers.list(&ctx.business_id).await? {
            let owed = sales
                .on_account_total(&ctx.business_id, &customer.id)
                .await?;
            let paid = customers
                .payments_total(&ctx.business_id, &customer.id)
                .await?;
            let derived = owed - paid;

            if customer.balance_minor != derived {
                out.push(Drift {
                    entity: DriftEntity::CustomerBalance,
                    id: customer.id,
                    name: customer.name,
                    cached: customer.balance_minor,
                    derived,
                });
            }
        }

        Ok(())
    }

    /// `suppliers.balance_minor` vs Σ purchase totals.
    async fn check_suppliers(
        &self,
        ctx: &BusinessContext,
        out: &mut Vec<Drift>,
    ) -> EngineResult<()> {
        let suppliers = SupplierRepository::new(self.pool.clone());
        let purchases = PurchaseRepository::new(self.pool.clone());

        for supplier in suppliers.list(&ctx.business_id).await? {
            let derived = purchases
                .total_for_supplier(&ctx.business_id, &supplier.id)
                .await?;

            if supplier.balance_minor != derived {
                out.push(Drift {
                    entity: DriftEntity::SupplierBalance,
                    id: supplier.id,
                    name: supplier.name,
                    cached: supplier.balance_minor,
                    derived,
                });
            }
        }

        Ok(())
    }

    /// `accounts.balance_minor` vs opening + Σ in − Σ out.
    async fn check_accounts(
        &self,
        ctx: &BusinessContext,
        out: &mut Vec<Drift>,
    ) -> EngineResult<()> {
        let accounts = AccountRepository::new(self.pool.clone());

        for account in accounts.list(&ctx.business_id).await? {
            let ledger = accounts.ledger_total(&ctx.business_id, &account.id).await?;
            let derived = account.opening_balance_minor + ledger;

            if account.balance_minor != derived {
                out.push(Drift {
                    entity: DriftEntity::AccountBalance,
                    id: account.id,
                    name: account.name,
                    cached: account.balance_minor,
                    derived,
                });
            }
        }

        Ok(())
    }
}
