//! Point balance and history handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

use points_core::{PointHistory, TransactionType, UserId, UserPoint};

use crate::error::{ApiError, LedgerError};
use crate::ledger::SharedLedger;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct UserPointResponse {
    /// User ID.
    pub id: i64,
    /// Current balance.
    pub point: i64,
    /// Last update in Unix milliseconds.
    pub updated_at_millis: i64,
    /// Last update as RFC 3339, absent for users that were never written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<&UserPoint> for UserPointResponse {
    fn from(point: &UserPoint) -> Self {
        Self {
            id: point.id.get(),
            point: point.point,
            updated_at_millis: point.updated_at_millis,
            updated_at: format_millis(point.updated_at_millis),
        }
    }
}

/// History record response.
#[derive(Debug, Serialize)]
pub struct PointHistoryResponse {
    /// History ID.
    pub id: i64,
    /// User ID.
    pub user_id: i64,
    /// Balance after the transaction.
    pub amount: i64,
    /// Transaction type.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Commit time in Unix milliseconds.
    pub updated_at_millis: i64,
}

impl From<&PointHistory> for PointHistoryResponse {
    fn from(record: &PointHistory) -> Self {
        Self {
            id: record.id.get(),
            user_id: record.user_id.get(),
            amount: record.amount,
            transaction_type: record.transaction_type,
            updated_at_millis: record.updated_at_millis,
        }
    }
}

/// Charge or use request.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    /// Points to charge or use.
    pub amount: i64,
}

/// Get a user's balance.
pub async fn get_point(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<UserPointResponse>, ApiError> {
    let user_id = parse_user_id(&raw_id);
    let point = run_ledger(&state, move |ledger| ledger.get_balance(user_id)).await?;
    Ok(Json(UserPointResponse::from(&point)))
}

/// List a user's history, oldest first.
pub async fn list_histories(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<PointHistoryResponse>>, ApiError> {
    let user_id = parse_user_id(&raw_id);
    let history = run_ledger(&state, move |ledger| ledger.get_history(user_id)).await?;
    Ok(Json(history.iter().map(PointHistoryResponse::from).collect()))
}

/// Charge points.
pub async fn charge(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    Json(body): Json<AmountRequest>,
) -> Result<Json<UserPointResponse>, ApiError> {
    let user_id = parse_user_id(&raw_id);
    let point = run_ledger(&state, move |ledger| ledger.charge(user_id, body.amount)).await?;
    Ok(Json(UserPointResponse::from(&point)))
}

/// Use points.
pub async fn use_points(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    Json(body): Json<AmountRequest>,
) -> Result<Json<UserPointResponse>, ApiError> {
    let user_id = parse_user_id(&raw_id);
    let point = run_ledger(&state, move |ledger| ledger.use_points(user_id, body.amount)).await?;
    Ok(Json(UserPointResponse::from(&point)))
}

/// An unparsable id is handed to the ledger as a missing one.
fn parse_user_id(raw: &str) -> Option<UserId> {
    raw.parse().ok()
}

/// Run a ledger call on the blocking pool; the exclusive section may wait on
/// other callers.
async fn run_ledger<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&SharedLedger) -> Result<T, LedgerError> + Send + 'static,
{
    let ledger = Arc::clone(&state.ledger);
    tokio::task::spawn_blocking(move || f(&ledger))
        .await
        .map_err(|e| ApiError::Internal(format!("ledger task failed: {e}")))?
        .map_err(ApiError::from)
}

fn format_millis(millis: i64) -> Option<String> {
    if millis == 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis).map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
}
