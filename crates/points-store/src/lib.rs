//! Storage layer for the points ledger.
//!
//! This crate defines the two storage collaborators the ledger composes, and
//! ships implementations of both:
//!
//! - [`InMemoryUserPointTable`] / [`InMemoryPointHistoryTable`]: process-local
//!   tables, the default backend.
//! - `RocksStore` (feature `rocksdb-backend`): one `RocksDB` database serving
//!   both tables through column families.
//!
//! Each call is atomic on its own. Nothing here composes a balance write with
//! a history append; that is the ledger's job.
//!
//! # Example
//!
//! ```
//! use points_core::{TransactionType, UserId};
//! use points_store::{InMemoryPointHistoryTable, InMemoryUserPointTable};
//! use points_store::{PointHistoryTable, UserPointTable};
//!
//! let points = InMemoryUserPointTable::new();
//! let histories = InMemoryPointHistoryTable::new();
//!
//! let user_id = UserId::new(1);
//! assert_eq!(points.select_by_id(user_id).unwrap().point, 0);
//!
//! let row = points.insert_or_update(user_id, 100).unwrap();
//! histories
//!     .insert(user_id, row.point, TransactionType::Charge, row.updated_at_millis)
//!     .unwrap();
//! assert_eq!(histories.select_all_by_user_id(user_id).unwrap().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

use std::sync::Arc;

pub use error::{Result, StoreError};
pub use memory::{InMemoryPointHistoryTable, InMemoryUserPointTable};
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use points_core::{PointHistory, TransactionType, UserId, UserPoint};

/// Balance rows, one per user.
pub trait UserPointTable: Send + Sync {
    /// Get the balance row of a user.
    ///
    /// Returns [`UserPoint::empty`] if the user has no row yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn select_by_id(&self, user_id: UserId) -> Result<UserPoint>;

    /// Insert or overwrite the balance of a user.
    ///
    /// Returns the stored row, stamped with the write time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn insert_or_update(&self, user_id: UserId, point: i64) -> Result<UserPoint>;
}

/// Append-only history records.
pub trait PointHistoryTable: Send + Sync {
    /// Append a history record and assign it the next id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn insert(
        &self,
        user_id: UserId,
        amount: i64,
        transaction_type: TransactionType,
        updated_at_millis: i64,
    ) -> Result<PointHistory>;

    /// List the history of a user in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn select_all_by_user_id(&self, user_id: UserId) -> Result<Vec<PointHistory>>;
}

impl<T: UserPointTable + ?Sized> UserPointTable for Arc<T> {
    fn select_by_id(&self, user_id: UserId) -> Result<UserPoint> {
        (**self).select_by_id(user_id)
    }

    fn insert_or_update(&self, user_id: UserId, point: i64) -> Result<UserPoint> {
        (**self).insert_or_update(user_id, point)
    }
}

impl<T: PointHistoryTable + ?Sized> PointHistoryTable for Arc<T> {
    fn insert(
        &self,
        user_id: UserId,
        amount: i64,
        transaction_type: TransactionType,
        updated_at_millis: i64,
    ) -> Result<PointHistory> {
        (**self).insert(user_id, amount, transaction_type, updated_at_millis)
    }

    fn select_all_by_user_id(&self, user_id: UserId) -> Result<Vec<PointHistory>> {
        (**self).select_all_by_user_id(user_id)
    }
}
