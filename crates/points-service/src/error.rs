//! Ledger and API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use points_store::StoreError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors returned by the ledger.
///
/// Every variant except `Storage` is a caller-input error raised before any
/// write, so a failed call leaves balance and history untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The user id is missing.
    #[error("invalid user: user id is missing")]
    InvalidUser,

    /// The amount is negative, or the resulting balance would overflow.
    ///
    /// Raised by both charge and use: a negative use is rejected the same way
    /// as a negative charge.
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: i64,
    },

    /// The balance does not cover the requested use.
    #[error("insufficient balance: balance={balance}, required={required}")]
    InsufficientBalance {
        /// Balance observed inside the exclusive section.
        balance: i64,
        /// Amount requested.
        required: i64,
    },

    /// A storage collaborator failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The user id is missing or unparsable.
    #[error("user not found")]
    InvalidUser,

    /// The amount was rejected.
    #[error("{0}")]
    InvalidAmount(String),

    /// Insufficient balance.
    #[error("insufficient balance: balance={balance}, required={required}")]
    InsufficientBalance {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::InvalidUser => (
                StatusCode::NOT_FOUND,
                "invalid_user",
                self.to_string(),
                None,
            ),
            Self::InvalidAmount(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_amount",
                msg.clone(),
                None,
            ),
            Self::InsufficientBalance { balance, required } => (
                StatusCode::CONFLICT,
                "insufficient_balance",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidUser => Self::InvalidUser,
            LedgerError::InvalidAmount { .. } => Self::InvalidAmount(err.to_string()),
            LedgerError::InsufficientBalance { balance, required } => {
                Self::InsufficientBalance { balance, required }
            }
            LedgerError::Storage(e) => Self::Internal(e.to_string()),
        }
    }
}
