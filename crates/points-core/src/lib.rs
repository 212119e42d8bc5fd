//! Core types for the points ledger.
//!
//! This crate provides the value types shared by the store and the service:
//!
//! - **Identifiers**: `UserId`, `HistoryId`
//! - **Balances**: `UserPoint`
//! - **History**: `PointHistory`, `TransactionType`
//! - **Time**: `MonotonicClock`
//!
//! # Balance Invariant
//!
//! A history record stores the balance *after* its transaction. Replaying a
//! user's history in insertion order (see [`replay_balance`]) therefore
//! reproduces the user's current `UserPoint::point`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod ids;
pub mod point;

pub use clock::MonotonicClock;
pub use ids::{HistoryId, IdError, UserId};
pub use point::{replay_balance, PointHistory, TransactionType, UserPoint};
