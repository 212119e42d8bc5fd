//! Points ledger service.
//!
//! This crate provides the point ledger and its HTTP front end:
//!
//! - [`LedgerService`]: balance lookup, history lookup, charge and use, with
//!   every mutation of a user serialized through [`UserLocks`]
//! - [`create_router`]: the HTTP API over a shared ledger
//!
//! The ledger is usable without the HTTP layer; any pair of
//! [`points_store::UserPointTable`] and [`points_store::PointHistoryTable`]
//! implementations can back it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Axum handlers all return Result
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod locks;
pub mod routes;
pub mod state;

pub use config::{ServiceConfig, StoreBackend};
pub use error::{ApiError, LedgerError};
pub use ledger::{LedgerService, SharedLedger};
pub use locks::{LockMode, UserLocks};
pub use routes::create_router;
pub use state::{AppState, StartupError};
