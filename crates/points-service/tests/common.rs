//! Common test utilities for points integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::TestServer;

use points_core::UserId;
use points_service::{
    create_router, AppState, LedgerService, LockMode, ServiceConfig, SharedLedger,
};
use points_store::{
    InMemoryPointHistoryTable, InMemoryUserPointTable, PointHistoryTable, UserPointTable,
};

/// Ledger over concrete in-memory tables.
pub type MemoryLedger = LedgerService<InMemoryUserPointTable, InMemoryPointHistoryTable>;

/// Test harness containing everything needed for HTTP integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// A test user ID.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory store.
    pub fn new() -> Self {
        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            ..ServiceConfig::default()
        };

        let state = AppState::open(config).expect("Failed to open state");
        Self::with_state(state)
    }

    /// Create a harness over in-memory tables that sleep for `latency` on
    /// every call, with the given request timeout.
    pub fn slow(latency: Duration, request_timeout_seconds: u64) -> Self {
        let points: Arc<dyn UserPointTable> =
            Arc::new(InMemoryUserPointTable::with_latency(latency));
        let histories: Arc<dyn PointHistoryTable> =
            Arc::new(InMemoryPointHistoryTable::with_latency(latency));
        let ledger: SharedLedger = LedgerService::new(points, histories);

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            request_timeout_seconds,
            ..ServiceConfig::default()
        };

        Self::with_state(AppState::new(Arc::new(ledger), config))
    }

    fn with_state(state: AppState) -> Self {
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            test_user_id: UserId::new(1),
        }
    }

    /// Path of the test user's balance.
    pub fn point_path(&self) -> String {
        format!("/point/{}", self.test_user_id)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Ledger over fresh in-memory tables.
pub fn memory_ledger(mode: LockMode) -> Arc<MemoryLedger> {
    Arc::new(LedgerService::with_lock_mode(
        InMemoryUserPointTable::new(),
        InMemoryPointHistoryTable::new(),
        mode,
    ))
}

/// Ledger over in-memory tables that sleep on every call, so that an
/// unserialized read-modify-write would lose updates.
pub fn slow_ledger(mode: LockMode, latency: Duration) -> Arc<MemoryLedger> {
    Arc::new(LedgerService::with_lock_mode(
        InMemoryUserPointTable::with_latency(latency),
        InMemoryPointHistoryTable::with_latency(latency),
        mode,
    ))
}
