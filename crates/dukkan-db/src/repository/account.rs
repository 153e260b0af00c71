//! # Account Repository
//!
//! Cash/bank/POS accounts and their transaction ledger. The balance cache
//! only moves through [`apply_balance_delta`], inside the transaction that
//! appends the account_transactions row.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dukkan_core::{Account, AccountKind, AccountTransaction};

const ACCOUNT_COLUMNS: &str =
    "id, business_id, name, kind, opening_balance_minor, balance_minor, created_at";

const ACCOUNT_TX_COLUMNS: &str = "id, business_id, account_id, direction, amount_minor, \
     category, description, date, created_at";

/// Repository for account database operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Gets an account by ID, scoped to a business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ? AND business_id = ?"
        ))
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Lists accounts of a business, ordered by name.
    pub async fn list(&self, business_id: &str) -> DbResult<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE business_id = ? ORDER BY name"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    /// Inserts a new account. The opening balance is recorded as-is; it is
    /// the `initial` term of the account balance invariant.
    pub async fn insert(&self, account: &Account) -> DbResult<()> {
        debug!(name = %account.name, kind = ?account.kind, "inserting account");

        sqlx::query(
            "INSERT INTO accounts ( \
                id, business_id, name, kind, opening_balance_minor, balance_minor, created_at \
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.business_id)
        .bind(&account.name)
        .bind(account.kind)
        .bind(account.opening_balance_minor)
        .bind(account.balance_minor)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists an account's transactions, newest first.
    pub async fn transactions(
        &self,
        business_id: &str,
        account_id: &str,
    ) -> DbResult<Vec<AccountTransaction>> {
        let transactions = sqlx::query_as::<_, AccountTransaction>(&format!(
            "SELECT {ACCOUNT_TX_COLUMNS} FROM account_transactions \
             WHERE account_id = ? AND business_id = ? ORDER BY date DESC"
        ))
        .bind(account_id)
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Folds the account ledger: Σ in − Σ out.
    ///
    /// Used by reconciliation; the cached balance must equal the account's
    /// opening balance plus this value.
    pub async fn ledger_total(&self, business_id: &str, account_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(CASE direction WHEN 'in' THEN amount_minor ELSE -amount_minor END) \
             FROM account_transactions WHERE account_id = ? AND business_id = ?",
        )
        .bind(account_id)
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Sum of all account balances of a business (total assets figure).
    pub async fn total_assets(&self, business_id: &str) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(balance_minor) FROM accounts WHERE business_id = ?")
                .bind(business_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(0))
    }
}

// =============================================================================
// Connection-level writers (composed into processor transactions)
// =============================================================================

/// Applies a signed balance delta as a relative update. The caller derives
/// the sign from the transaction direction. No floor check: accounts may go
/// negative (e.g. a cash drawer advancing float).
///
/// ## Errors
/// * `DbError::NotFound` - no such account in this business
pub(crate) async fn apply_balance_delta(
    conn: &mut SqliteConnection,
    business_id: &str,
    account_id: &str,
    delta_minor: i64,
) -> DbResult<()> {
    debug!(id = %account_id, delta = %delta_minor, "applying account balance delta");

    let result = sqlx::query(
        "UPDATE accounts SET balance_minor = balance_minor + ? \
         WHERE id = ? AND business_id = ?",
    )
    .bind(delta_minor)
    .bind(account_id)
    .bind(business_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Account", account_id));
    }

    Ok(())
}

/// Appends one account transaction row.
pub(crate) async fn insert_transaction_in(
    conn: &mut SqliteConnection,
    transaction: &AccountTransaction,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO account_transactions ( \
            id, business_id, account_id, direction, amount_minor, \
            category, description, date, created_at \
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&transaction.id)
    .bind(&transaction.business_id)
    .bind(&transaction.account_id)
    .bind(transaction.direction)
    .bind(transaction.amount_minor)
    .bind(&transaction.category)
    .bind(&transaction.description)
    .bind(transaction.date)
    .bind(transaction.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Helper to build a new account with an opening balance.
pub fn new_account(
    business_id: &str,
    name: &str,
    kind: AccountKind,
    opening_balance_minor: i64,
) -> Account {
    Account {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        name: name.to_string(),
        kind,
        opening_balance_minor,
        balance_minor: opening_balance_minor,
        created_at: Utc::now(),
    }
}
