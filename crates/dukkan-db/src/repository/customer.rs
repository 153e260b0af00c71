//! # Customer Repository
//!
//! Customers and their on-account ledger. The balance cache is only written
//! through [`apply_balance_delta`], always inside the transaction that
//! appends the causing document (an on-account sale or a payment).
//!
//! The customer's "ledger" is the union of its documents: on-account sales
//! raise the balance, payments lower it. [`CustomerRepository::statement`]
//! materializes that history merged and newest-first.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::sale::SaleRepository;
use dukkan_core::{Customer, CustomerPayment, StatementEntry};

const CUSTOMER_COLUMNS: &str = "id, business_id, name, phone, balance_minor, created_at";

const PAYMENT_COLUMNS: &str =
    "id, business_id, customer_id, amount_minor, method, description, created_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID, scoped to a business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ? AND business_id = ?"
        ))
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists customers of a business, ordered by name.
    pub async fn list(&self, business_id: &str) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE business_id = ? ORDER BY name"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Inserts a new customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(name = %customer.name, "inserting customer");

        sqlx::query(
            "INSERT INTO customers (id, business_id, name, phone, balance_minor, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&customer.id)
        .bind(&customer.business_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.balance_minor)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists a customer's payments, newest first.
    pub async fn payments(
        &self,
        business_id: &str,
        customer_id: &str,
    ) -> DbResult<Vec<CustomerPayment>> {
        let payments = sqlx::query_as::<_, CustomerPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM customer_payments \
             WHERE customer_id = ? AND business_id = ? ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Sum of a customer's payments.
    ///
    /// Used by reconciliation to re-derive the customer balance.
    pub async fn payments_total(&self, business_id: &str, customer_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_minor) FROM customer_payments \
             WHERE customer_id = ? AND business_id = ?",
        )
        .bind(customer_id)
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// The customer's merged history: sales and payments interleaved,
    /// newest first. Projection only - balances are not derived from this.
    pub async fn statement(
        &self,
        business_id: &str,
        customer_id: &str,
    ) -> DbResult<Vec<StatementEntry>> {
        let sales = SaleRepository::new(self.pool.clone())
            .list_for_customer(business_id, customer_id)
            .await?;
        let payments = self.payments(business_id, customer_id).await?;

        let mut entries: Vec<StatementEntry> = sales
            .into_iter()
            .map(StatementEntry::Sale)
            .chain(payments.into_iter().map(StatementEntry::Payment))
            .collect();

        entries.sort_by(|a, b| b.occurred_at().cmp(&a.occurred_at()));

        Ok(entries)
    }
}

// =============================================================================
// Connection-level writers (composed into processor transactions)
// =============================================================================

/// Applies a signed balance delta as a relative update.
///
/// Positive deltas come from on-account sales, negative deltas from
/// payments. This is the only write path for `customers.balance_minor`.
///
/// ## Errors
/// * `DbError::NotFound` - no such customer in this business
pub(crate) async fn apply_balance_delta(
    conn: &mut SqliteConnection,
    business_id: &str,
    customer_id: &str,
    delta_minor: i64,
) -> DbResult<()> {
    debug!(id = %customer_id, delta = %delta_minor, "applying customer balance delta");

    let result = sqlx::query(
        "UPDATE customers SET balance_minor = balance_minor + ? \
         WHERE id = ? AND business_id = ?",
    )
    .bind(delta_minor)
    .bind(customer_id)
    .bind(business_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", customer_id));
    }

    Ok(())
}

/// Appends one payment row.
pub(crate) async fn insert_payment_in(
    conn: &mut SqliteConnection,
    payment: &CustomerPayment,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO customer_payments ( \
            id, business_id, customer_id, amount_minor, method, description, created_at \
         ) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payment.id)
    .bind(&payment.business_id)
    .bind(&payment.customer_id)
    .bind(payment.amount_minor)
    .bind(payment.method)
    .bind(&payment.description)
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Helper to build a new customer with a zero balance.
pub fn new_customer(business_id: &str, name: &str, phone: Option<String>) -> Customer {
    Customer {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        name: name.to_string(),
        phone,
        balance_minor: 0,
        created_at: Utc::now(),
    }
}
