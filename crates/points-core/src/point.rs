//! Point balance and history records.
//!
//! `UserPoint` is the current balance row of a user; `PointHistory` is the
//! append-only audit entry written for every committed charge or use.

use serde::{Deserialize, Serialize};

use crate::{HistoryId, UserId};

/// The current point balance of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPoint {
    /// The user owning the balance.
    pub id: UserId,

    /// Current balance. Never negative.
    pub point: i64,

    /// When the balance was last written, in Unix milliseconds.
    pub updated_at_millis: i64,
}

impl UserPoint {
    /// The row read for a user that has never been charged.
    #[must_use]
    pub const fn empty(id: UserId) -> Self {
        Self {
            id,
            point: 0,
            updated_at_millis: 0,
        }
    }

    /// Check if the balance covers a deduction.
    #[must_use]
    pub const fn has_sufficient_points(&self, amount: i64) -> bool {
        self.point >= amount
    }
}

/// An immutable audit record of a committed balance change.
///
/// `amount` is the balance *after* the transaction, not the delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointHistory {
    /// Sequence number assigned by the history table.
    pub id: HistoryId,

    /// The user whose balance changed.
    pub user_id: UserId,

    /// Balance after this transaction.
    pub amount: i64,

    /// Kind of transaction.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// When the transaction was committed, in Unix milliseconds.
    pub updated_at_millis: i64,
}

/// Type of point transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Points were added.
    Charge,

    /// Points were spent.
    Use,
}

impl TransactionType {
    /// Check if this transaction type adds points.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(self, Self::Charge)
    }

    /// Check if this transaction type removes points.
    #[must_use]
    pub const fn is_debit(self) -> bool {
        matches!(self, Self::Use)
    }
}

/// Rebuild a balance from its history log.
///
/// Each record's amount replaces the running balance, so the result is the
/// amount of the last record, or 0 for an empty log.
#[must_use]
pub fn replay_balance(history: &[PointHistory]) -> i64 {
    history.last().map_or(0, |record| record.amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, amount: i64, transaction_type: TransactionType) -> PointHistory {
        PointHistory {
            id: HistoryId::new(id),
            user_id: UserId::new(1),
            amount,
            transaction_type,
            updated_at_millis: id,
        }
    }

    #[test]
    fn empty_point_has_zero_balance() {
        let point = UserPoint::empty(UserId::new(5));
        assert_eq!(point.point, 0);
        assert_eq!(point.updated_at_millis, 0);
        assert_eq!(point.id, UserId::new(5));
    }

    #[test]
    fn sufficient_points() {
        let point = UserPoint {
            id: UserId::new(1),
            point: 300,
            updated_at_millis: 0,
        };
        assert!(point.has_sufficient_points(0));
        assert!(point.has_sufficient_points(300));
        assert!(!point.has_sufficient_points(301));
    }

    #[test]
    fn transaction_type_is_credit_debit() {
        assert!(TransactionType::Charge.is_credit());
        assert!(!TransactionType::Charge.is_debit());
        assert!(TransactionType::Use.is_debit());
        assert!(!TransactionType::Use.is_credit());
    }

    #[test]
    fn transaction_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Charge).unwrap(),
            "\"CHARGE\""
        );
        assert_eq!(serde_json::to_string(&TransactionType::Use).unwrap(), "\"USE\"");
    }

    #[test]
    fn history_serializes_type_field() {
        let json = serde_json::to_value(record(1, 100, TransactionType::Charge)).unwrap();
        assert_eq!(json["type"], "CHARGE");
        assert_eq!(json["amount"], 100);
        assert_eq!(json["user_id"], 1);
    }

    #[test]
    fn replay_takes_last_amount() {
        assert_eq!(replay_balance(&[]), 0);

        let log = vec![
            record(1, 500, TransactionType::Charge),
            record(2, 450, TransactionType::Use),
            record(3, 460, TransactionType::Charge),
        ];
        assert_eq!(replay_balance(&log), 460);
    }
}
