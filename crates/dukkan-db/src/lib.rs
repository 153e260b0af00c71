//! # dukkan-db: SQLite Ledgers & Transaction Processors
//!
//! Storage layer of the Dukkan engine. Owns the connection pool, the schema,
//! the per-entity repositories and - most importantly - the **transaction
//! processors**: every multi-row unit of work (a sale, a purchase, a payment,
//! an account entry) commits through exactly one database transaction here.
//!
//! ## The Ledger Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every cached balance is the fold of an append-only ledger:            │
//! │                                                                         │
//! │    products.stock_quantity   == Σ stock_movements.amount               │
//! │    customers.balance_minor   == Σ on-account sales − Σ payments        │
//! │    suppliers.balance_minor   == Σ purchase totals                      │
//! │    accounts.balance_minor    == initial + Σ in − Σ out                 │
//! │                                                                         │
//! │  The cache is only ever written by the same transaction that appends   │
//! │  the ledger row, as a relative UPDATE (x = x + ?). reconcile::run      │
//! │  re-derives every balance and reports drift.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pool`] - `DbConfig` and the `Database` handle
//! - [`repository`] - per-entity storage operations
//! - [`processor`] - atomic units of work (sale, purchase, payment, account,
//!   stock movement)
//! - [`projection`] - read-only finance view and profit summary
//! - [`reconcile`] - ledger-vs-cache drift detection
//! - [`import`] - chunked bulk import that keeps the stock invariant intact

pub mod error;
pub mod import;
pub mod migrations;
pub mod pool;
pub mod processor;
pub mod projection;
pub mod reconcile;
pub mod repository;

// Re-exports for convenience
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use processor::{EngineError, EngineResult, OversellPolicy};
