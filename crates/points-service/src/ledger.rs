//! The point ledger.
//!
//! [`LedgerService`] composes a balance table and a history table into four
//! operations. Charge and use run their whole read-compute-write-append
//! sequence inside the user's exclusive section (see [`UserLocks`]), so two
//! mutations of the same user can never interleave. Reads take no ledger
//! lock and return whatever the balance table holds at call time.
//!
//! Validation always completes before the first write. A call that fails
//! validation leaves both tables untouched.

use std::sync::Arc;

use points_core::{MonotonicClock, PointHistory, TransactionType, UserId, UserPoint};
use points_store::{PointHistoryTable, UserPointTable};

use crate::error::{LedgerError, Result};
use crate::locks::{LockMode, UserLocks};

/// Ledger over trait-object tables, as selected at startup.
pub type SharedLedger = LedgerService<Arc<dyn UserPointTable>, Arc<dyn PointHistoryTable>>;

/// Point balance service.
pub struct LedgerService<P, H> {
    points: P,
    histories: H,
    locks: UserLocks,
    clock: MonotonicClock,
}

impl<P, H> LedgerService<P, H>
where
    P: UserPointTable,
    H: PointHistoryTable,
{
    /// Create a ledger with per-user locking.
    #[must_use]
    pub fn new(points: P, histories: H) -> Self {
        Self::with_lock_mode(points, histories, LockMode::default())
    }

    /// Create a ledger with the given lock granularity.
    #[must_use]
    pub fn with_lock_mode(points: P, histories: H, mode: LockMode) -> Self {
        Self {
            points,
            histories,
            locks: UserLocks::new(mode),
            clock: MonotonicClock::new(),
        }
    }

    /// The lock granularity in use.
    #[must_use]
    pub const fn lock_mode(&self) -> LockMode {
        self.locks.mode()
    }

    /// Get the current balance of a user.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidUser` if the user id is missing.
    /// - `LedgerError::Storage` if the balance table fails.
    pub fn get_balance(&self, user_id: impl Into<Option<UserId>>) -> Result<UserPoint> {
        let user_id = validate_user(user_id.into())?;
        Ok(self.points.select_by_id(user_id)?)
    }

    /// Get the history of a user in insertion order.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidUser` if the user id is missing.
    /// - `LedgerError::Storage` if the history table fails.
    pub fn get_history(&self, user_id: impl Into<Option<UserId>>) -> Result<Vec<PointHistory>> {
        let user_id = validate_user(user_id.into())?;
        Ok(self.histories.select_all_by_user_id(user_id)?)
    }

    /// Add `amount` points to a user's balance.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidUser` if the user id is missing.
    /// - `LedgerError::InvalidAmount` if `amount` is negative or the new
    ///   balance would overflow.
    /// - `LedgerError::Storage` if either table fails.
    pub fn charge(&self, user_id: impl Into<Option<UserId>>, amount: i64) -> Result<UserPoint> {
        let user_id = validate_user(user_id.into())?;
        validate_amount(amount)?;

        self.locks.run_exclusive(user_id, || -> Result<UserPoint> {
            tracing::debug!(user_id = %user_id, amount, "Entering charge section");
            let current = self.points.select_by_id(user_id)?;
            let balance = current
                .point
                .checked_add(amount)
                .ok_or(LedgerError::InvalidAmount { amount })?;

            let updated = self.commit(user_id, balance, TransactionType::Charge)?;
            tracing::info!(user_id = %user_id, amount, balance, "Points charged");
            Ok(updated)
        })
    }

    /// Spend `amount` points from a user's balance.
    ///
    /// The balance check runs against the value read inside the exclusive
    /// section, never against an earlier read.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidUser` if the user id is missing.
    /// - `LedgerError::InvalidAmount` if `amount` is negative.
    /// - `LedgerError::InsufficientBalance` if the balance is below `amount`.
    /// - `LedgerError::Storage` if either table fails.
    pub fn use_points(&self, user_id: impl Into<Option<UserId>>, amount: i64) -> Result<UserPoint> {
        let user_id = validate_user(user_id.into())?;
        validate_amount(amount)?;

        self.locks.run_exclusive(user_id, || -> Result<UserPoint> {
            tracing::debug!(user_id = %user_id, amount, "Entering use section");
            let current = self.points.select_by_id(user_id)?;
            if !current.has_sufficient_points(amount) {
                tracing::warn!(
                    user_id = %user_id,
                    balance = current.point,
                    required = amount,
                    "Use rejected: insufficient balance"
                );
                return Err(LedgerError::InsufficientBalance {
                    balance: current.point,
                    required: amount,
                });
            }

            let balance = current.point - amount;
            let updated = self.commit(user_id, balance, TransactionType::Use)?;
            tracing::info!(user_id = %user_id, amount, balance, "Points used");
            Ok(updated)
        })
    }

    /// Write the new balance, then append its history record.
    ///
    /// Must be called from inside the user's exclusive section.
    fn commit(
        &self,
        user_id: UserId,
        balance: i64,
        transaction_type: TransactionType,
    ) -> Result<UserPoint> {
        let updated = self.points.insert_or_update(user_id, balance)?;
        self.histories
            .insert(user_id, balance, transaction_type, self.clock.now_millis())?;
        Ok(updated)
    }
}

fn validate_user(user_id: Option<UserId>) -> Result<UserId> {
    user_id.ok_or(LedgerError::InvalidUser)
}

fn validate_amount(amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(LedgerError::InvalidAmount { amount });
    }
    Ok(())
}
