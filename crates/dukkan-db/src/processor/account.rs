//! # Account Transaction Processor
//!
//! Records a manual cash-flow entry against an account: one ledger row
//! appended and the balance adjusted by direction, in one transaction.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::processor::EngineResult;
use crate::repository::account as account_repo;
use dukkan_core::validation::validate_amount_minor;
use dukkan_core::{AccountTransaction, BusinessContext, Capability, Direction, Money};

/// Input for recording an account transaction.
#[derive(Debug, Clone)]
pub struct AccountTxInput {
    pub account_id: String,
    pub direction: Direction,
    /// Must be positive; the direction carries the sign.
    pub amount: Money,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Effective date chosen by the operator.
    pub date: DateTime<Utc>,
}

/// Processor for account transactions.
#[derive(Debug, Clone)]
pub struct AccountProcessor {
    pool: SqlitePool,
}

impl AccountProcessor {
    /// Creates a new AccountProcessor.
    pub fn new(pool: SqlitePool) -> Self {
        AccountProcessor { pool }
    }

    /// Records a transaction and adjusts the account balance.
    ///
    /// No available-balance check: accounts are allowed to go negative
    /// (e.g. a cash drawer advancing float before the day's takings).
    ///
    /// ## Errors
    /// - `Validation` - amount ≤ 0
    /// - `Access` - role may not manage accounts
    /// - `Db(NotFound)` - unknown account
    pub async fn record_account_transaction(
        &self,
        ctx: &BusinessContext,
        input: AccountTxInput,
    ) -> EngineResult<AccountTransaction> {
        ctx.authorize(Capability::ManageAccounts)?;
        validate_amount_minor(input.amount.minor())?;

        let transaction = AccountTransaction {
            id: Uuid::new_v4().to_string(),
            business_id: ctx.business_id.clone(),
            account_id: input.account_id.clone(),
            direction: input.direction,
            amount_minor: input.amount.minor(),
            category: input.category,
            description: input.description,
            date: input.date,
            created_at: Utc::now(),
        };

        let delta = match input.direction {
            Direction::In => transaction.amount_minor,
            Direction::Out => -transaction.amount_minor,
        };

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // The relative update doubles as the existence check.
        account_repo::apply_balance_delta(&mut tx, &ctx.business_id, &input.account_id, delta)
            .await?;
        account_repo::insert_transaction_in(&mut tx, &transaction).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            account_id = %transaction.account_id,
            direction = ?transaction.direction,
            amount = %input.amount,
            "account transaction recorded"
        );

        Ok(transaction)
    }
}
