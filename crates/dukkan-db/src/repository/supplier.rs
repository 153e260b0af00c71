//! # Supplier Repository
//!
//! Suppliers and their owed-balance cache. The balance only moves through
//! [`apply_balance_delta`], inside the transaction that commits a purchase.
//! No supplier payments are modeled in v1, so the balance is monotonically
//! non-decreasing unless corrected externally.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dukkan_core::Supplier;

const SUPPLIER_COLUMNS: &str =
    "id, business_id, name, phone, contact_person, balance_minor, created_at";

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Gets a supplier by ID, scoped to a business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ? AND business_id = ?"
        ))
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Finds a supplier by exact name (used by bulk import mapping).
    pub async fn get_by_name(&self, business_id: &str, name: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE name = ? AND business_id = ?"
        ))
        .bind(name)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Lists suppliers of a business, ordered by name.
    pub async fn list(&self, business_id: &str) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE business_id = ? ORDER BY name"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Inserts a new supplier.
    pub async fn insert(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(name = %supplier.name, "inserting supplier");

        let mut conn = self.pool.acquire().await?;
        insert_in(&mut conn, supplier).await
    }
}

// =============================================================================
// Connection-level writers (composed into processor transactions)
// =============================================================================

/// Inserts a supplier on an explicit connection (used by bulk import).
pub(crate) async fn insert_in(conn: &mut SqliteConnection, supplier: &Supplier) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO suppliers ( \
            id, business_id, name, phone, contact_person, balance_minor, created_at \
         ) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&supplier.id)
    .bind(&supplier.business_id)
    .bind(&supplier.name)
    .bind(&supplier.phone)
    .bind(&supplier.contact_person)
    .bind(supplier.balance_minor)
    .bind(supplier.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Applies a signed balance delta as a relative update.
///
/// ## Errors
/// * `DbError::NotFound` - no such supplier in this business
pub(crate) async fn apply_balance_delta(
    conn: &mut SqliteConnection,
    business_id: &str,
    supplier_id: &str,
    delta_minor: i64,
) -> DbResult<()> {
    debug!(id = %supplier_id, delta = %delta_minor, "applying supplier balance delta");

    let result = sqlx::query(
        "UPDATE suppliers SET balance_minor = balance_minor + ? \
         WHERE id = ? AND business_id = ?",
    )
    .bind(delta_minor)
    .bind(supplier_id)
    .bind(business_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Supplier", supplier_id));
    }

    Ok(())
}

/// Helper to build a new supplier with a zero balance.
pub fn new_supplier(
    business_id: &str,
    name: &str,
    phone: Option<String>,
    contact_person: Option<String>,
) -> Supplier {
    Supplier {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        name: name.to_string(),
        phone,
        contact_person,
        balance_minor: 0,
        created_at: Utc::now(),
    }
}
