//! # Expense Repository
//!
//! Operating expenses. Plain appends - expenses feed the finance projection
//! and the profit summary but do not touch any cached balance.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use dukkan_core::Expense;

const EXPENSE_COLUMNS: &str =
    "id, business_id, title, amount_minor, description, date, created_at";

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Inserts a new expense.
    pub async fn insert(&self, expense: &Expense) -> DbResult<()> {
        debug!(title = %expense.title, amount = %expense.amount_minor, "inserting expense");

        sqlx::query(
            "INSERT INTO expenses ( \
                id, business_id, title, amount_minor, description, date, created_at \
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&expense.id)
        .bind(&expense.business_id)
        .bind(&expense.title)
        .bind(expense.amount_minor)
        .bind(&expense.description)
        .bind(expense.date)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists expenses of a business, newest first.
    pub async fn list(&self, business_id: &str) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE business_id = ? ORDER BY date DESC"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Sum of all expenses of a business.
    pub async fn total(&self, business_id: &str) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(amount_minor) FROM expenses WHERE business_id = ?")
                .bind(business_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(0))
    }
}

/// Helper to generate a new expense ID.
pub fn generate_expense_id() -> String {
    Uuid::new_v4().to_string()
}
