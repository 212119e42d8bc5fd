//! Application state.

use std::sync::Arc;

use points_store::{
    InMemoryPointHistoryTable, InMemoryUserPointTable, PointHistoryTable, StoreError,
    UserPointTable,
};

use crate::config::{ServiceConfig, StoreBackend};
use crate::ledger::{LedgerService, SharedLedger};

/// Errors raised while assembling the application state.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The configured backend was not compiled into this binary.
    #[error("store backend {0} is not available in this build")]
    BackendUnavailable(StoreBackend),

    /// The store could not be opened.
    #[error("failed to open store: {0}")]
    Store(#[from] StoreError),
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The point ledger.
    pub ledger: Arc<SharedLedger>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create application state around an existing ledger.
    #[must_use]
    pub fn new(ledger: Arc<SharedLedger>, config: ServiceConfig) -> Self {
        Self { ledger, config }
    }

    /// Open the configured store and build the ledger on top of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable or cannot be opened.
    pub fn open(config: ServiceConfig) -> Result<Self, StartupError> {
        let (points, histories) = open_tables(&config)?;
        let ledger = LedgerService::with_lock_mode(points, histories, config.lock_mode);

        tracing::info!(
            store_backend = %config.store_backend,
            lock_mode = %config.lock_mode,
            "Ledger initialized"
        );

        Ok(Self::new(Arc::new(ledger), config))
    }
}

type Tables = (Arc<dyn UserPointTable>, Arc<dyn PointHistoryTable>);

fn open_tables(config: &ServiceConfig) -> Result<Tables, StartupError> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store - balances are lost on restart");
            let points: Arc<dyn UserPointTable> = Arc::new(InMemoryUserPointTable::new());
            let histories: Arc<dyn PointHistoryTable> = Arc::new(InMemoryPointHistoryTable::new());
            Ok((points, histories))
        }
        #[cfg(feature = "rocksdb-backend")]
        StoreBackend::RocksDb => {
            tracing::info!(path = %config.data_dir, "Opening RocksDB store");
            let store = Arc::new(points_store::RocksStore::open(&config.data_dir)?);
            let points: Arc<dyn UserPointTable> = store.clone();
            let histories: Arc<dyn PointHistoryTable> = store;
            Ok((points, histories))
        }
        #[cfg(not(feature = "rocksdb-backend"))]
        StoreBackend::RocksDb => Err(StartupError::BackendUnavailable(StoreBackend::RocksDb)),
    }
}
