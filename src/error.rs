use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    order_status::{OrderStatus, describe},
    response::{ApiResponse, Meta},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error(
        "Insufficient stock for {product_name} ({product_id}): available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: Uuid,
        product_name: String,
        available: i32,
        requested: i32,
    },

    #[error("Order is already {0}")]
    AlreadyInState(OrderStatus),

    #[error("Cannot move order from {from} to {to}; allowed: {}", describe(.allowed))]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        allowed: Vec<OrderStatus>,
    },

    #[error("Order is {0} and can no longer change status")]
    TerminalState(OrderStatus),

    #[error("Orders that are {0} can only be cancelled by staff")]
    SelfCancelNotAllowed(OrderStatus),

    #[error("Concurrent update conflict, please retry")]
    ConcurrencyConflict,

    #[error("ORM error")]
    OrmError(DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if is_conflict(&err) {
            tracing::debug!(error = %err, "storage reported a write conflict");
            return AppError::ConcurrencyConflict;
        }
        AppError::OrmError(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Serialization failures and deadlocks (Postgres) and busy/locked databases
/// (SQLite) mean another transaction won; the whole unit may be re-run.
fn is_conflict(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return false,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx_err) => is_conflict_code(sqlx_err),
        _ => false,
    }
}

fn is_conflict_code(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };
    matches!(
        db_err.code().as_deref(),
        Some("40001") | Some("40P01") | Some("5") | Some("6") | Some("517") | Some("262")
    )
}

/// Unique index violations; during order creation this can only be the order number.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Maps a unique violation on insert to `ConcurrencyConflict` so the
/// surrounding unit is retried; anything else converts as usual.
pub fn conflict_on_unique(err: DbErr) -> AppError {
    if is_unique_violation(&err) {
        AppError::ConcurrencyConflict
    } else {
        AppError::from(err)
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InsufficientStock { .. }
            | AppError::AlreadyInState(_)
            | AppError::InvalidTransition { .. }
            | AppError::TerminalState(_)
            | AppError::SelfCancelNotAllowed(_)
            | AppError::ConcurrencyConflict => StatusCode::CONFLICT,
            AppError::OrmError(err) => {
                tracing::error!(error = %err, "database error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = self.to_string();

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_names_allowed_statuses() {
        let err = AppError::InvalidTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Confirmed,
            allowed: vec![OrderStatus::Delivered, OrderStatus::Cancelled],
        };
        assert_eq!(
            err.to_string(),
            "Cannot move order from shipped to confirmed; allowed: delivered, cancelled"
        );
    }

    #[test]
    fn engine_errors_map_to_conflict() {
        let response = AppError::TerminalState(OrderStatus::Delivered).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let response = AppError::Validation("items: empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn plain_db_errors_are_not_conflicts() {
        let err: AppError = DbErr::RecordNotFound("orders".into()).into();
        assert!(matches!(err, AppError::OrmError(_)));
        let err = conflict_on_unique(DbErr::RecordNotFound("orders".into()));
        assert!(matches!(err, AppError::OrmError(_)));
    }

    #[derive(Debug)]
    struct CodedDbError(&'static str);

    impl std::fmt::Display for CodedDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "database error {}", self.0)
        }
    }

    impl std::error::Error for CodedDbError {}

    impl sqlx::error::DatabaseError for CodedDbError {
        fn message(&self) -> &str {
            self.0
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    #[test]
    fn serialization_and_lock_codes_are_conflicts() {
        for code in ["40001", "40P01", "5", "517"] {
            let err = sqlx::Error::Database(Box::new(CodedDbError(code)));
            assert!(is_conflict_code(&err), "{code}");
        }
        let err = sqlx::Error::Database(Box::new(CodedDbError("23503")));
        assert!(!is_conflict_code(&err));
        assert!(!is_conflict_code(&sqlx::Error::RowNotFound));
    }
}
