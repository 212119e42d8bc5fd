//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Balance rows, keyed by `user_id`.
    pub const USER_POINTS: &str = "user_points";

    /// History records, keyed by `history_id`.
    pub const POINT_HISTORIES: &str = "point_histories";

    /// Index: history by user, keyed by `user_id || history_id`.
    /// Value is empty (index only).
    pub const POINT_HISTORIES_BY_USER: &str = "point_histories_by_user";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USER_POINTS,
        cf::POINT_HISTORIES,
        cf::POINT_HISTORIES_BY_USER,
    ]
}
