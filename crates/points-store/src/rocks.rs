//! `RocksDB` storage implementation.
//!
//! This module provides `RocksStore`, which implements both storage traits
//! over a single database.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use points_core::{HistoryId, PointHistory, TransactionType, UserId, UserPoint};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{PointHistoryTable, UserPointTable};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Last assigned history id. Held while a record is written so ids are
    /// persisted in the order they are handed out.
    last_history_id: Mutex<HistoryId>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// History ids continue from the highest id already stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut store = Self {
            db: Arc::new(db),
            last_history_id: Mutex::new(HistoryId::ZERO),
        };
        let last = store.load_last_history_id()?;
        tracing::debug!(last_history_id = %last, "Opened RocksDB points store");
        store.last_history_id = Mutex::new(last);

        Ok(store)
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Find the highest history id on disk.
    fn load_last_history_id(&self) -> Result<HistoryId> {
        let cf = self.cf(cf::POINT_HISTORIES)?;
        let last = self.db.iterator_cf(&cf, IteratorMode::End).next();

        match last {
            Some(item) => {
                let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                keys::history_id_from_key(&key).ok_or_else(|| {
                    StoreError::Serialization(format!("malformed history key: {key:?}"))
                })
            }
            None => Ok(HistoryId::ZERO),
        }
    }

    fn get_history(&self, history_id: HistoryId) -> Result<Option<PointHistory>> {
        let cf = self.cf(cf::POINT_HISTORIES)?;
        let key = keys::history_key(history_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }
}

impl UserPointTable for RocksStore {
    fn select_by_id(&self, user_id: UserId) -> Result<UserPoint> {
        let cf = self.cf(cf::USER_POINTS)?;
        let key = keys::user_point_key(user_id);

        Ok(self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()?
            .unwrap_or_else(|| UserPoint::empty(user_id)))
    }

    fn insert_or_update(&self, user_id: UserId, point: i64) -> Result<UserPoint> {
        let cf = self.cf(cf::USER_POINTS)?;
        let key = keys::user_point_key(user_id);
        let row = UserPoint {
            id: user_id,
            point,
            updated_at_millis: Utc::now().timestamp_millis(),
        };
        let value = Self::serialize(&row)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(row)
    }
}

impl PointHistoryTable for RocksStore {
    fn insert(
        &self,
        user_id: UserId,
        amount: i64,
        transaction_type: TransactionType,
        updated_at_millis: i64,
    ) -> Result<PointHistory> {
        let cf_history = self.cf(cf::POINT_HISTORIES)?;
        let cf_by_user = self.cf(cf::POINT_HISTORIES_BY_USER)?;

        let mut last_id = self
            .last_history_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let record = PointHistory {
            id: last_id.next(),
            user_id,
            amount,
            transaction_type,
            updated_at_millis,
        };

        let history_key = keys::history_key(record.id);
        let user_history_key = keys::user_history_key(user_id, record.id);
        let value = Self::serialize(&record)?;

        // Record and index land together
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_history, &history_key, &value);
        batch.put_cf(&cf_by_user, &user_history_key, []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        *last_id = record.id;
        Ok(record)
    }

    fn select_all_by_user_id(&self, user_id: UserId) -> Result<Vec<PointHistory>> {
        let cf_by_user = self.cf(cf::POINT_HISTORIES_BY_USER)?;
        let prefix = keys::user_histories_prefix(user_id);

        let iter = self
            .db
            .iterator_cf(&cf_by_user, IteratorMode::From(&prefix, Direction::Forward));

        let mut records = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            let history_id = keys::history_id_from_user_key(&key).ok_or_else(|| {
                StoreError::Serialization(format!("malformed history index key: {key:?}"))
            })?;
            if let Some(record) = self.get_history(history_id)? {
                records.push(record);
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn user_point_upsert() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::new(1);

        assert_eq!(store.select_by_id(user_id).unwrap().point, 0);

        store.insert_or_update(user_id, 500).unwrap();
        store.insert_or_update(user_id, 450).unwrap();

        assert_eq!(store.select_by_id(user_id).unwrap().point, 450);
    }

    #[test]
    fn history_by_user_in_insertion_order() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::new(1);
        let other = UserId::new(2);

        store
            .insert(user_id, 100, TransactionType::Charge, 10)
            .unwrap();
        store.insert(other, 7, TransactionType::Charge, 11).unwrap();
        store.insert(user_id, 60, TransactionType::Use, 12).unwrap();

        let history = store.select_all_by_user_id(user_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, 100);
        assert_eq!(history[1].amount, 60);
        assert_eq!(history[1].transaction_type, TransactionType::Use);
        assert_eq!(history[1].id, HistoryId::new(3));
    }

    #[test]
    fn history_ids_continue_after_reopen() {
        let dir = TempDir::new().unwrap();
        let user_id = UserId::new(4);

        {
            let store = RocksStore::open(dir.path()).unwrap();
            store
                .insert(user_id, 10, TransactionType::Charge, 1)
                .unwrap();
            store
                .insert(user_id, 20, TransactionType::Charge, 2)
                .unwrap();
        }

        let store = RocksStore::open(dir.path()).unwrap();
        let record = store.insert(user_id, 5, TransactionType::Use, 3).unwrap();
        assert_eq!(record.id, HistoryId::new(3));
        assert_eq!(store.select_all_by_user_id(user_id).unwrap().len(), 3);
    }
}
