//! Key encoding utilities for `RocksDB`.
//!
//! Ids are encoded big-endian so that byte order follows numeric order for
//! the non-negative ids the ledger assigns.

use points_core::{HistoryId, UserId};

/// Create a balance key from a user ID.
#[must_use]
pub fn user_point_key(user_id: UserId) -> Vec<u8> {
    user_id.to_be_bytes().to_vec()
}

/// Create a history key from a history ID.
#[must_use]
pub fn history_key(history_id: HistoryId) -> Vec<u8> {
    history_id.to_be_bytes().to_vec()
}

/// Create a user-history index key.
///
/// Format: `user_id (8 bytes) || history_id (8 bytes)`
///
/// History ids are assigned in increasing order, so a user's records iterate
/// in insertion order.
#[must_use]
pub fn user_history_key(user_id: UserId, history_id: HistoryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&user_id.to_be_bytes());
    key.extend_from_slice(&history_id.to_be_bytes());
    key
}

/// Create a prefix for iterating all history records of a user.
#[must_use]
pub fn user_histories_prefix(user_id: UserId) -> Vec<u8> {
    user_id.to_be_bytes().to_vec()
}

/// Extract the history ID from a user-history index key.
///
/// Returns `None` if the key is not exactly 16 bytes.
#[must_use]
pub fn history_id_from_user_key(key: &[u8]) -> Option<HistoryId> {
    if key.len() != 16 {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&key[8..16]);
    Some(HistoryId::from_be_bytes(bytes))
}

/// Decode a history ID from a primary history key.
///
/// Returns `None` if the key is not exactly 8 bytes.
#[must_use]
pub fn history_id_from_key(key: &[u8]) -> Option<HistoryId> {
    let bytes: [u8; 8] = key.try_into().ok()?;
    Some(HistoryId::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_point_key_length() {
        assert_eq!(user_point_key(UserId::new(1)).len(), 8);
    }

    #[test]
    fn user_history_key_format() {
        let user_id = UserId::new(12);
        let history_id = HistoryId::new(345);
        let key = user_history_key(user_id, history_id);

        assert_eq!(key.len(), 16);
        assert_eq!(&key[..8], user_id.to_be_bytes());
        assert_eq!(&key[8..], history_id.to_be_bytes());
        assert!(key.starts_with(&user_histories_prefix(user_id)));
    }

    #[test]
    fn extract_history_id() {
        let key = user_history_key(UserId::new(3), HistoryId::new(99));
        assert_eq!(history_id_from_user_key(&key), Some(HistoryId::new(99)));
        assert_eq!(history_id_from_user_key(&key[..10]), None);

        let primary = history_key(HistoryId::new(7));
        assert_eq!(history_id_from_key(&primary), Some(HistoryId::new(7)));
        assert_eq!(history_id_from_key(&key), None);
    }

    #[test]
    fn user_history_keys_sort_by_history_id() {
        let user_id = UserId::new(1);
        let early = user_history_key(user_id, HistoryId::new(2));
        let late = user_history_key(user_id, HistoryId::new(256));
        assert!(early < late);
    }
}
