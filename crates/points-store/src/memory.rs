//! In-memory storage implementation.
//!
//! Both tables keep their rows behind a `RwLock`. An optional fixed latency is
//! slept on every call, which widens the window between a read and a write
//! when exercising the ledger under contention.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;

use points_core::{HistoryId, PointHistory, TransactionType, UserId, UserPoint};

use crate::error::{Result, StoreError};
use crate::{PointHistoryTable, UserPointTable};

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Database("table lock poisoned".into())
}

fn simulate_latency(latency: Option<Duration>) {
    if let Some(latency) = latency {
        std::thread::sleep(latency);
    }
}

/// In-memory balance table.
#[derive(Debug, Default)]
pub struct InMemoryUserPointTable {
    rows: RwLock<HashMap<UserId, UserPoint>>,
    latency: Option<Duration>,
}

impl InMemoryUserPointTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table that sleeps for `latency` on every call.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            rows: RwLock::default(),
            latency: Some(latency),
        }
    }

    /// Number of users with a stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.rows.read().map_err(poisoned)?.len())
    }

    /// Returns `true` if no user has a stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl UserPointTable for InMemoryUserPointTable {
    fn select_by_id(&self, user_id: UserId) -> Result<UserPoint> {
        simulate_latency(self.latency);
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserPoint::empty(user_id)))
    }

    fn insert_or_update(&self, user_id: UserId, point: i64) -> Result<UserPoint> {
        simulate_latency(self.latency);
        let row = UserPoint {
            id: user_id,
            point,
            updated_at_millis: Utc::now().timestamp_millis(),
        };
        self.rows
            .write()
            .map_err(poisoned)?
            .insert(user_id, row.clone());
        Ok(row)
    }
}

#[derive(Debug)]
struct HistoryLog {
    records: Vec<PointHistory>,
    last_id: HistoryId,
}

/// In-memory history table.
#[derive(Debug)]
pub struct InMemoryPointHistoryTable {
    log: RwLock<HistoryLog>,
    latency: Option<Duration>,
}

impl Default for InMemoryPointHistoryTable {
    fn default() -> Self {
        Self {
            log: RwLock::new(HistoryLog {
                records: Vec::new(),
                last_id: HistoryId::ZERO,
            }),
            latency: None,
        }
    }
}

impl InMemoryPointHistoryTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table that sleeps for `latency` on every call.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Total number of records across all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.log.read().map_err(poisoned)?.records.len())
    }

    /// Returns `true` if no record has been appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the table lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl PointHistoryTable for InMemoryPointHistoryTable {
    fn insert(
        &self,
        user_id: UserId,
        amount: i64,
        transaction_type: TransactionType,
        updated_at_millis: i64,
    ) -> Result<PointHistory> {
        simulate_latency(self.latency);
        let mut log = self.log.write().map_err(poisoned)?;
        log.last_id = log.last_id.next();
        let record = PointHistory {
            id: log.last_id,
            user_id,
            amount,
            transaction_type,
            updated_at_millis,
        };
        log.records.push(record.clone());
        tracing::trace!(history_id = %record.id, user_id = %user_id, "History record appended");
        Ok(record)
    }

    fn select_all_by_user_id(&self, user_id: UserId) -> Result<Vec<PointHistory>> {
        simulate_latency(self.latency);
        let log = self.log.read().map_err(poisoned)?;
        Ok(log
            .records
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }
}
