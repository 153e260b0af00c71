//! # Repositories
//!
//! Per-entity database operations. Repositories expose two kinds of methods:
//!
//! - Pool-level reads and simple inserts, for callers holding a `Database`.
//! - `pub(crate)` connection-level writers taking `&mut SqliteConnection`,
//!   composed by the [`crate::processor`] module inside one transaction.
//!
//! Balance caches are only touched through the `apply_*_delta` writers, which
//! are relative updates (`SET x = x + ?`) - the storage layer's atomic
//! increment is what serializes concurrent commits on the same row.

pub mod account;
pub mod customer;
pub mod expense;
pub mod movement;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod supplier;
