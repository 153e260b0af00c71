//! # Finance Projection
//!
//! Read-only unified view over the money-moving events of a business:
//! account transactions, completed sales and expenses, merged by the
//! `finance_transactions` SQL view.
//!
//! ## Never a Ledger of Record
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  account_transactions ─┐                                               │
//! │  sales (completed)    ─┼──► finance_transactions VIEW ──► FinanceEntry │
//! │  expenses             ─┘         (UNION ALL, ordered)                  │
//! │                                                                         │
//! │  Nothing here is written, ever. Deleting the view and re-querying      │
//! │  the three tables reproduces it exactly.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::processor::EngineResult;
use dukkan_core::{BusinessContext, Capability, FinanceEntry, Money};

const FINANCE_COLUMNS: &str =
    "id, business_id, source, direction, amount_minor, description, category, date";

/// One row of the top-products list in the profit summary.
#[derive(Debug, Clone)]
pub struct TopProduct {
    pub name: String,
    pub quantity_sold: i64,
}

/// Period-independent profit figures for a business.
///
/// Cost of goods sold is an approximation: it prices every unit sold at the
/// product's *current* buying price, not the cost at sale time. The exact
/// cost history lives on purchase items.
#[derive(Debug, Clone)]
pub struct ProfitSummary {
    pub revenue: Money,
    pub cost_of_goods_sold: Money,
    pub expenses: Money,
    pub net_profit: Money,
    pub sale_count: i64,
    pub top_products: Vec<TopProduct>,
}

/// Read-only finance projection.
#[derive(Debug, Clone)]
pub struct FinanceProjection {
    pool: SqlitePool,
}

impl FinanceProjection {
    /// Creates a new FinanceProjection.
    pub fn new(pool: SqlitePool) -> Self {
        FinanceProjection { pool }
    }

    /// The most recent finance entries, newest first.
    pub async fn recent(&self, ctx: &BusinessContext, limit: u32) -> EngineResult<Vec<FinanceEntry>> {
        ctx.authorize(Capability::ViewReports)?;

        let entries = sqlx::query_as::<_, FinanceEntry>(&format!(
            "SELECT {FINANCE_COLUMNS} FROM finance_transactions \
             WHERE business_id = ? ORDER BY date DESC LIMIT ?"
        ))
        .bind(&ctx.business_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(crate::error::DbError::from)?;

        Ok(entries)
    }

    /// Finance entries within a date range, newest first.
    ///
    /// Daily and monthly views are this call with the matching bounds.
    pub async fn between(
        &self,
        ctx: &BusinessContext,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<Vec<FinanceEntry>> {
        ctx.authorize(Capability::ViewReports)?;

        let entries = sqlx::query_as::<_, FinanceEntry>(&format!(
            "SELECT {FINANCE_COLUMNS} FROM finance_transactions \
             WHERE business_id = ? AND date >= ? AND date <= ? \
             ORDER BY date DESC"
        ))
        .bind(&ctx.business_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool())
        .await
        .map_err(crate::error::DbError::from)?;

        Ok(entries)
    }

    /// Turnover: the sum of completed sale amounts within a date range.
    ///
    /// Today's/yesterday's/this month's turnover are this call with the
    /// matching bounds.
    pub async fn turnover(
        &self,
        ctx: &BusinessContext,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<Money> {
        ctx.authorize(Capability::ViewReports)?;

        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(final_amount_minor) FROM sales \
             WHERE business_id = ? AND status = 'completed' \
               AND created_at >= ? AND created_at <= ?",
        )
        .bind(&ctx.business_id)
        .bind(from)
        .bind(to)
        .fetch_one(self.pool())
        .await
        .map_err(crate::error::DbError::from)?;

        Ok(Money::from_minor(total.unwrap_or(0)))
    }

    /// Profit summary over the whole history of the business.
    pub async fn profit_summary(&self, ctx: &BusinessContext) -> EngineResult<ProfitSummary> {
        ctx.authorize(Capability::ViewReports)?;

        // Revenue and sale count over completed sales.
        let (revenue, sale_count): (Option<i64>, i64) = sqlx::query_as(
            "SELECT SUM(final_amount_minor), COUNT(*) FROM sales \
             WHERE business_id = ? AND status = 'completed'",
        )
        .bind(&ctx.business_id)
        .fetch_one(self.pool())
        .await
        .map_err(crate::error::DbError::from)?;

        // COGS approximation: units sold × current buying price.
        let cogs: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(si.quantity * p.buying_price_minor) \
             FROM sale_items si \
             JOIN products p ON p.id = si.product_id \
             WHERE si.business_id = ?",
        )
        .bind(&ctx.business_id)
        .fetch_one(self.pool())
        .await
        .map_err(crate::error::DbError::from)?;

        let expenses: Option<i64> =
            sqlx::query_scalar("SELECT SUM(amount_minor) FROM expenses WHERE business_id = ?")
                .bind(&ctx.business_id)
                .fetch_one(self.pool())
                .await
                .map_err(crate::error::DbError::from)?;

        let top: Vec<(String, i64)> = sqlx::query_as(
            "SELECT product_name, SUM(quantity) AS sold FROM sale_items \
             WHERE business_id = ? GROUP BY product_name ORDER BY sold DESC LIMIT 5",
        )
        .bind(&ctx.business_id)
        .fetch_all(self.pool())
        .await
        .map_err(crate::error::DbError::from)?;

        let revenue = Money::from_minor(revenue.unwrap_or(0));
        let cost_of_goods_sold = Money::from_minor(cogs.unwrap_or(0));
        let expenses = Money::from_minor(expenses.unwrap_or(0));

        Ok(ProfitSummary {
            revenue,
            cost_of_goods_sold,
            expenses,
            net_profit: revenue - cost_of_goods_sold - expenses,
            sale_count,
            top_products: top
                .into_iter()
                .map(|(name, quantity_sold)| TopProduct {
                    name,
                    quantity_sold,
                })
                .collect(),
        })
    }

    fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
