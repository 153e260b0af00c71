//! # Customer Payment Processor
//!
//! Records a collection against a customer's on-account balance: one payment
//! row appended and `balance -= amount`, in one transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::processor::EngineResult;
use crate::repository::customer as customer_repo;
use dukkan_core::validation::validate_amount_minor;
use dukkan_core::{BusinessContext, Capability, CollectionMethod, CustomerPayment, Money};

/// Input for recording a customer payment.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub customer_id: String,
    /// Must be positive.
    pub amount: Money,
    pub method: CollectionMethod,
    pub description: Option<String>,
}

/// Processor for customer payments.
#[derive(Debug, Clone)]
pub struct PaymentProcessor {
    pool: SqlitePool,
}

impl PaymentProcessor {
    /// Creates a new PaymentProcessor.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentProcessor { pool }
    }

    /// Records a payment and reduces the customer's balance.
    ///
    /// Overpayment is allowed: the balance may go negative, which represents
    /// credit the business owes the customer.
    ///
    /// ## Errors
    /// - `Validation` - amount ≤ 0
    /// - `Access` - role may not record payments
    /// - `Db(NotFound)` - unknown customer
    pub async fn record_customer_payment(
        &self,
        ctx: &BusinessContext,
        input: PaymentInput,
    ) -> EngineResult<CustomerPayment> {
        ctx.authorize(Capability::RecordPayment)?;
        validate_amount_minor(input.amount.minor())?;

        let payment = CustomerPayment {
            id: Uuid::new_v4().to_string(),
            business_id: ctx.business_id.clone(),
            customer_id: input.customer_id.clone(),
            amount_minor: input.amount.minor(),
            method: input.method,
            description: input.description,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // The relative update doubles as the existence check.
        customer_repo::apply_balance_delta(
            &mut tx,
            &ctx.business_id,
            &input.customer_id,
            -payment.amount_minor,
        )
        .await?;
        customer_repo::insert_payment_in(&mut tx, &payment).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            customer_id = %payment.customer_id,
            amount = %input.amount,
            method = ?payment.method,
            "customer payment recorded"
        );

        Ok(payment)
    }
}
